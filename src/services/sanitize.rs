/// Trims free text and strips script blocks, `javascript:` URIs and inline
/// event-handler attributes before it is stored or mailed out.
pub fn sanitize_text(input: &str) -> String {
    let without_scripts = strip_script_blocks(input);
    let without_js = strip_javascript_uris(&without_scripts);
    let without_handlers = strip_event_handlers(&without_js);
    without_handlers.trim().to_string()
}

fn strip_script_blocks(input: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let mut out = String::with_capacity(input.len());
    let mut pos = 0;

    while let Some(found) = lower[pos..].find("<script") {
        let start = pos + found;
        out.push_str(&input[pos..start]);
        match lower[start..].find("</script") {
            Some(close) => {
                let close_start = start + close;
                // Skip through the closing tag's '>' if present.
                pos = match lower[close_start..].find('>') {
                    Some(gt) => close_start + gt + 1,
                    None => input.len(),
                };
            }
            None => {
                // Unterminated block: drop everything after it.
                pos = input.len();
            }
        }
    }
    out.push_str(&input[pos..]);
    out
}

fn strip_javascript_uris(input: &str) -> String {
    const NEEDLE: &str = "javascript";
    let lower = input.to_ascii_lowercase();
    let mut out = String::with_capacity(input.len());
    let mut pos = 0;

    while let Some(found) = lower[pos..].find(NEEDLE) {
        let start = pos + found;
        let after = start + NEEDLE.len();
        // `javascript :` and `javascript\t:` are still honoured by browsers.
        let rest = &lower[after..];
        let ws = rest.len() - rest.trim_start().len();
        if lower[after + ws..].starts_with(':') {
            out.push_str(&input[pos..start]);
            pos = after + ws + 1;
        } else {
            out.push_str(&input[pos..after]);
            pos = after;
        }
    }
    out.push_str(&input[pos..]);
    out
}

fn strip_event_handlers(input: &str) -> String {
    let bytes = input.as_bytes();
    let lower = input.to_ascii_lowercase();
    let lower_bytes = lower.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    let mut copied = 0;

    while i + 2 < bytes.len() {
        let at_boundary = i > 0 && (bytes[i - 1].is_ascii_whitespace() || bytes[i - 1] == b'/');
        if at_boundary && lower_bytes[i] == b'o' && lower_bytes[i + 1] == b'n' {
            let mut j = i + 2;
            while j < bytes.len() && bytes[j].is_ascii_alphabetic() {
                j += 1;
            }
            let mut k = j;
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if j > i + 2 && k < bytes.len() && bytes[k] == b'=' {
                let end = attribute_value_end(bytes, k + 1);
                out.push_str(&input[copied..i]);
                copied = end;
                i = end;
                continue;
            }
        }
        i += 1;
    }
    if copied < input.len() {
        out.push_str(&input[copied..]);
    }
    out
}

fn attribute_value_end(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    match bytes.get(i) {
        Some(&quote) if quote == b'"' || quote == b'\'' => {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j] != quote {
                j += 1;
            }
            (j + 1).min(bytes.len())
        }
        _ => {
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                i += 1;
            }
            i
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_trimmed_only() {
        assert_eq!(sanitize_text("  Hello coach!  "), "Hello coach!");
        assert_eq!(
            sanitize_text("I'd like a session on Monday, once I'm free."),
            "I'd like a session on Monday, once I'm free."
        );
    }

    #[test]
    fn test_script_blocks_removed() {
        assert_eq!(
            sanitize_text("Hi <script>alert('x')</script>there"),
            "Hi there"
        );
        assert_eq!(
            sanitize_text("a<SCRIPT type=\"text/javascript\">x()</ScRiPt >b"),
            "ab"
        );
        assert_eq!(sanitize_text("keep <script>never closed"), "keep");
    }

    #[test]
    fn test_javascript_uris_removed() {
        assert_eq!(
            sanitize_text("<a href=\"javascript:alert(1)\">x</a>"),
            "<a href=\"alert(1)\">x</a>"
        );
        assert_eq!(sanitize_text("JavaScript :void(0)"), "void(0)");
        assert_eq!(
            sanitize_text("I love javascript development"),
            "I love javascript development"
        );
    }

    #[test]
    fn test_event_handlers_removed() {
        assert_eq!(
            sanitize_text("<img src=x onerror=\"steal()\">"),
            "<img src=x >"
        );
        assert_eq!(
            sanitize_text("<div onclick='go()' class=a>"),
            "<div  class=a>"
        );
        assert_eq!(
            sanitize_text("Lesson on Monday online=fine"),
            "Lesson on Monday"
        );
    }

    #[test]
    fn test_multibyte_text_preserved() {
        assert_eq!(sanitize_text("  Séance à 10h ✓ "), "Séance à 10h ✓");
    }
}
