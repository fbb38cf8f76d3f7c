use serde::Serialize;

/// Read-only third-party iframe embeds used on the site.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Embed {
    Map { place_id: String, api_key: String },
    Video { video_id: String },
    Playlist { playlist_id: String },
}

impl Embed {
    pub fn src_url(&self) -> String {
        match self {
            Embed::Map { place_id, api_key } => format!(
                "https://www.google.com/maps/embed/v1/place?key={}&q=place_id:{}",
                encode(api_key),
                encode(place_id)
            ),
            Embed::Video { video_id } => format!(
                "https://www.youtube-nocookie.com/embed/{}",
                encode(video_id)
            ),
            Embed::Playlist { playlist_id } => format!(
                "https://www.youtube-nocookie.com/embed/videoseries?list={}",
                encode(playlist_id)
            ),
        }
    }
}

// Ids are opaque but should never be able to break out of the URL.
fn encode(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_url() {
        let embed = Embed::Video {
            video_id: "dQw4w9WgXcQ".to_string(),
        };
        assert_eq!(
            embed.src_url(),
            "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_map_url() {
        let embed = Embed::Map {
            place_id: "ChIJD7fiBh9u5kcRYJSMaMOCCwQ".to_string(),
            api_key: "AIzaTest".to_string(),
        };
        assert_eq!(
            embed.src_url(),
            "https://www.google.com/maps/embed/v1/place?key=AIzaTest&q=place_id:ChIJD7fiBh9u5kcRYJSMaMOCCwQ"
        );
    }

    #[test]
    fn test_ids_are_stripped_of_url_syntax() {
        let embed = Embed::Playlist {
            playlist_id: "PL123\"><script>&x=1".to_string(),
        };
        assert_eq!(
            embed.src_url(),
            "https://www.youtube-nocookie.com/embed/videoseries?list=PL123scriptx1"
        );
    }
}
