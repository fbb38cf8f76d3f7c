use crate::models::{Booking, BookingStatus};

const ICS_TS: &str = "%Y%m%dT%H%M%S";

/// Single-event iCalendar document for a booking. Times are floating local
/// times, the same wall-clock values the booking was made with.
pub fn generate_ics(booking: &Booking, coach_name: &str) -> String {
    let dtstart = booking.date_time.format(ICS_TS);
    let dtend = booking.end_time().format(ICS_TS);
    let dtstamp = booking.updated_at.format(ICS_TS);
    let uid = format!("{}@coachdesk", booking.id);

    let summary = escape(&format!("Coaching session: {}", booking.service));
    let description = escape(&format!(
        "{} with {}. {}",
        booking.service,
        coach_name,
        booking.notes.as_deref().unwrap_or("No additional notes")
    ));
    let status = match booking.status {
        BookingStatus::Pending => "TENTATIVE",
        BookingStatus::Confirmed | BookingStatus::Completed => "CONFIRMED",
        BookingStatus::Cancelled => "CANCELLED",
    };

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Coachdesk//Booking//EN\r\n\
         METHOD:PUBLISH\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         STATUS:{status}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}

// RFC 5545 TEXT escaping.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn booking(status: BookingStatus, notes: Option<&str>) -> Booking {
        Booking {
            id: "test-123".to_string(),
            user_id: "u1".to_string(),
            coach_id: "coach-1".to_string(),
            service: "Personal Training".to_string(),
            date_time: ts("2025-03-15 14:00:00"),
            duration_minutes: 90,
            status,
            notes: notes.map(str::to_string),
            created_at: ts("2025-03-10 10:00:00"),
            updated_at: ts("2025-03-11 08:30:00"),
        }
    }

    #[test]
    fn test_generate_ics() {
        let ics = generate_ics(&booking(BookingStatus::Confirmed, Some("Bring shoes")), "Alex");
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.contains("DTSTART:20250315T140000"));
        assert!(ics.contains("DTEND:20250315T153000"));
        assert!(ics.contains("DTSTAMP:20250311T083000"));
        assert!(ics.contains("SUMMARY:Coaching session: Personal Training"));
        assert!(ics.contains("DESCRIPTION:Personal Training with Alex. Bring shoes"));
        assert!(ics.contains("UID:test-123@coachdesk"));
        assert!(ics.contains("STATUS:CONFIRMED"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn test_status_and_escaping() {
        let ics = generate_ics(&booking(BookingStatus::Pending, Some("Knee; left,\nmild")), "Alex");
        assert!(ics.contains("STATUS:TENTATIVE"));
        assert!(ics.contains("Knee\\; left\\,\\nmild"));

        let ics = generate_ics(&booking(BookingStatus::Cancelled, None), "Alex");
        assert!(ics.contains("STATUS:CANCELLED"));
        assert!(ics.contains("No additional notes"));
    }
}
