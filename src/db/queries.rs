use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    Booking, BookingStatus, ListOptions, Page, Preferences, Testimonial, TestimonialKind,
    ThemePreference, UserProfile,
};
use crate::models::testimonial::BeforeAfter;

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_ts(dt: &NaiveDateTime) -> String {
    dt.format(TS_FORMAT).to_string()
}

fn parse_ts(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT)
        .map_err(|e| anyhow::anyhow!("invalid timestamp {s:?}: {e}"))
}

// ── Bookings ──

const BOOKING_COLUMNS: &str =
    "id, user_id, coach_id, service, date_time, duration_minutes, status, notes, created_at, updated_at";

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, user_id, coach_id, service, date_time, duration_minutes, status, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            booking.id,
            booking.user_id,
            booking.coach_id,
            booking.service,
            format_ts(&booking.date_time),
            booking.duration_minutes,
            booking.status.as_str(),
            booking.notes,
            format_ts(&booking.created_at),
            format_ts(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id], |row| Ok(parse_booking_row(row)))
        .optional()?;

    row.transpose()
}

/// Pending and confirmed bookings of a coach starting on `date`.
pub fn get_active_coach_bookings_on(
    conn: &Connection,
    coach_id: &str,
    date: NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let day_start = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    let day_end = date.and_hms_opt(23, 59, 59).unwrap_or(day_start);

    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE coach_id = ?1 AND date_time >= ?2 AND date_time <= ?3
           AND status IN ('pending', 'confirmed')
         ORDER BY date_time ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![coach_id, format_ts(&day_start), format_ts(&day_end)],
        |row| Ok(parse_booking_row(row)),
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn list_bookings_for_user(
    conn: &Connection,
    user_id: &str,
    opts: &ListOptions,
) -> anyhow::Result<Page<Booking>> {
    let limit = opts.effective_limit();
    // Column and direction come from closed enums, never from raw input.
    let order = format!(
        "ORDER BY {} {}, id ASC",
        opts.order_by.column(),
        opts.direction.keyword()
    );

    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(user_id.to_string())];
    let status_clause = match opts.status {
        Some(status) => {
            params_vec.push(Box::new(status.as_str()));
            "AND status = ?2"
        }
        None => "",
    };
    params_vec.push(Box::new(limit as i64 + 1));
    let limit_param = params_vec.len();

    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = ?1 {status_clause} {order} LIMIT ?{limit_param}"
    );

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut items = vec![];
    for row in rows {
        items.push(row??);
    }

    let has_more = items.len() > limit as usize;
    items.truncate(limit as usize);
    Ok(Page { items, has_more })
}

/// Overwrites every mutable column of an existing booking.
pub fn save_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET service = ?1, date_time = ?2, duration_minutes = ?3, status = ?4,
             notes = ?5, updated_at = ?6
         WHERE id = ?7",
        params![
            booking.service,
            format_ts(&booking.date_time),
            booking.duration_minutes,
            booking.status.as_str(),
            booking.notes,
            format_ts(&booking.updated_at),
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: &BookingStatus,
) -> anyhow::Result<bool> {
    let now = format_ts(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let date_time: String = row.get(4)?;
    let status: String = row.get(6)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;

    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        coach_id: row.get(2)?,
        service: row.get(3)?,
        date_time: parse_ts(&date_time)?,
        duration_minutes: row.get(5)?,
        status: BookingStatus::parse(&status),
        notes: row.get(7)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

// ── Testimonials ──

pub fn insert_testimonial(conn: &Connection, t: &Testimonial) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO testimonials (id, client_name, client_age, client_location, rating, content, kind, tags,
             service, video_id, before_after, results, is_visible, is_featured, created_at, published_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            t.id,
            t.client_name,
            t.client_age,
            t.client_location,
            t.rating,
            t.content,
            t.kind.as_str(),
            serde_json::to_string(&t.tags)?,
            t.service,
            t.video_id,
            t.before_after
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            serde_json::to_string(&t.results)?,
            t.is_visible,
            t.is_featured,
            format_ts(&t.created_at),
            t.published_at.as_ref().map(format_ts),
        ],
    )?;
    Ok(())
}

pub fn list_visible_testimonials(conn: &Connection) -> anyhow::Result<Vec<Testimonial>> {
    let mut stmt = conn.prepare(
        "SELECT id, client_name, client_age, client_location, rating, content, kind, tags, service,
                video_id, before_after, results, is_visible, is_featured, created_at, published_at
         FROM testimonials WHERE is_visible = 1 ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map([], |row| Ok(parse_testimonial_row(row)))?;

    let mut items = vec![];
    for row in rows {
        items.push(row??);
    }
    Ok(items)
}

fn parse_testimonial_row(row: &rusqlite::Row) -> anyhow::Result<Testimonial> {
    let kind: String = row.get(6)?;
    let tags: String = row.get(7)?;
    let before_after: Option<String> = row.get(10)?;
    let results: String = row.get(11)?;
    let created_at: String = row.get(14)?;
    let published_at: Option<String> = row.get(15)?;

    Ok(Testimonial {
        id: row.get(0)?,
        client_name: row.get(1)?,
        client_age: row.get(2)?,
        client_location: row.get(3)?,
        rating: row.get(4)?,
        content: row.get(5)?,
        kind: TestimonialKind::parse(&kind),
        tags: serde_json::from_str(&tags).unwrap_or_default(),
        service: row.get(8)?,
        video_id: row.get(9)?,
        before_after: before_after
            .and_then(|s| serde_json::from_str::<BeforeAfter>(&s).ok()),
        results: serde_json::from_str::<BTreeMap<String, String>>(&results).unwrap_or_default(),
        is_visible: row.get(12)?,
        is_featured: row.get(13)?,
        created_at: parse_ts(&created_at)?,
        published_at: published_at.as_deref().map(parse_ts).transpose()?,
    })
}

// ── Profiles ──

pub fn get_profile(conn: &Connection, uid: &str) -> anyhow::Result<Option<UserProfile>> {
    let row = conn
        .query_row(
            "SELECT uid, first_name, last_name, is_admin, is_coach, created_at, updated_at
             FROM profiles WHERE uid = ?1",
            params![uid],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, bool>(3)?,
                    row.get::<_, bool>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((uid, first_name, last_name, is_admin, is_coach, created_at, updated_at)) => {
            Ok(Some(UserProfile {
                uid,
                first_name,
                last_name,
                is_admin,
                is_coach,
                created_at: parse_ts(&created_at)?,
                updated_at: parse_ts(&updated_at)?,
            }))
        }
        None => Ok(None),
    }
}

pub fn save_profile(conn: &Connection, profile: &UserProfile) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO profiles (uid, first_name, last_name, is_admin, is_coach, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(uid) DO UPDATE SET
           first_name = excluded.first_name,
           last_name = excluded.last_name,
           is_admin = excluded.is_admin,
           is_coach = excluded.is_coach,
           updated_at = excluded.updated_at",
        params![
            profile.uid,
            profile.first_name,
            profile.last_name,
            profile.is_admin,
            profile.is_coach,
            format_ts(&profile.created_at),
            format_ts(&profile.updated_at),
        ],
    )?;
    Ok(())
}

// ── Preferences ──

pub fn get_preferences(conn: &Connection, user_id: &str) -> anyhow::Result<Preferences> {
    let mut stmt = conn.prepare("SELECT key, value FROM preferences WHERE user_id = ?1")?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut prefs = Preferences::default();
    for row in rows {
        let (key, value) = row?;
        match key.as_str() {
            "theme" => prefs.theme = ThemePreference::parse(&value),
            "locale" => prefs.locale = Some(value),
            _ => {}
        }
    }
    Ok(prefs)
}

pub fn set_preference(
    conn: &Connection,
    user_id: &str,
    key: &str,
    value: &str,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO preferences (user_id, key, value) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id, key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
        params![user_id, key, value],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Direction, OrderBy};

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn booking(id: &str, user: &str, start: &str, created: &str, status: BookingStatus) -> Booking {
        Booking {
            id: id.to_string(),
            user_id: user.to_string(),
            coach_id: "coach-1".to_string(),
            service: "Personal Training".to_string(),
            date_time: dt(start),
            duration_minutes: 60,
            status,
            notes: None,
            created_at: dt(created),
            updated_at: dt(created),
        }
    }

    #[test]
    fn test_booking_round_trip() {
        let conn = db::init_db(":memory:").unwrap();
        let mut b = booking("b1", "u1", "2030-01-10 10:00", "2029-12-01 08:00", BookingStatus::Pending);
        b.notes = Some("bring running shoes".to_string());
        create_booking(&conn, &b).unwrap();

        let loaded = get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(loaded, b);
        assert!(get_booking_by_id(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_active_bookings_on_day() {
        let conn = db::init_db(":memory:").unwrap();
        create_booking(&conn, &booking("a", "u1", "2030-01-10 10:00", "2029-12-01 08:00", BookingStatus::Confirmed)).unwrap();
        create_booking(&conn, &booking("b", "u1", "2030-01-10 12:00", "2029-12-01 08:00", BookingStatus::Cancelled)).unwrap();
        create_booking(&conn, &booking("c", "u2", "2030-01-11 10:00", "2029-12-01 08:00", BookingStatus::Pending)).unwrap();

        let day = NaiveDate::from_ymd_opt(2030, 1, 10).unwrap();
        let active = get_active_coach_bookings_on(&conn, "coach-1", day).unwrap();
        let ids: Vec<_> = active.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);

        assert!(get_active_coach_bookings_on(&conn, "coach-2", day).unwrap().is_empty());
    }

    #[test]
    fn test_list_for_user_paginates_and_filters() {
        let conn = db::init_db(":memory:").unwrap();
        create_booking(&conn, &booking("a", "u1", "2030-01-10 10:00", "2029-12-03 08:00", BookingStatus::Pending)).unwrap();
        create_booking(&conn, &booking("b", "u1", "2030-01-12 10:00", "2029-12-01 08:00", BookingStatus::Confirmed)).unwrap();
        create_booking(&conn, &booking("c", "u1", "2030-01-11 10:00", "2029-12-02 08:00", BookingStatus::Pending)).unwrap();
        create_booking(&conn, &booking("d", "u2", "2030-01-09 10:00", "2029-12-01 08:00", BookingStatus::Pending)).unwrap();

        let opts = ListOptions {
            limit: Some(2),
            order_by: OrderBy::DateTime,
            direction: Direction::Asc,
            ..Default::default()
        };
        let page = list_bookings_for_user(&conn, "u1", &opts).unwrap();
        let ids: Vec<_> = page.items.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(page.has_more);

        let opts = ListOptions {
            status: Some(BookingStatus::Pending),
            order_by: OrderBy::CreatedAt,
            direction: Direction::Desc,
            ..Default::default()
        };
        let page = list_bookings_for_user(&conn, "u1", &opts).unwrap();
        let ids: Vec<_> = page.items.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(!page.has_more);
    }

    #[test]
    fn test_preferences_upsert() {
        let conn = db::init_db(":memory:").unwrap();
        set_preference(&conn, "u1", "theme", "dark").unwrap();
        set_preference(&conn, "u1", "theme", "light").unwrap();
        set_preference(&conn, "u1", "locale", "fr").unwrap();

        let prefs = get_preferences(&conn, "u1").unwrap();
        assert_eq!(prefs.theme, Some(ThemePreference::Light));
        assert_eq!(prefs.locale.as_deref(), Some("fr"));

        let empty = get_preferences(&conn, "nobody").unwrap();
        assert_eq!(empty.theme, None);
    }

    #[test]
    fn test_testimonial_round_trip() {
        let conn = db::init_db(":memory:").unwrap();
        let sample = crate::models::testimonial::sample_testimonials();
        for t in &sample {
            insert_testimonial(&conn, t).unwrap();
        }
        let loaded = list_visible_testimonials(&conn).unwrap();
        assert_eq!(loaded.len(), sample.len());
        let strength = loaded.iter().find(|t| t.id == "sample-2").unwrap();
        assert_eq!(strength, &sample[1]);
    }
}
