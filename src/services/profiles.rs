use std::sync::{Arc, Mutex};

use chrono::{NaiveDateTime, Timelike, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{ProfileUpdate, UserProfile};
use crate::services::availability::lock_db;
use crate::services::sanitize::sanitize_text;

const MAX_NAME_LEN: usize = 80;

#[derive(Clone)]
pub struct ProfileService {
    db: Arc<Mutex<Connection>>,
}

impl ProfileService {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    pub fn get(&self, uid: &str) -> Result<UserProfile, AppError> {
        let conn = lock_db(&self.db)?;
        queries::get_profile(&conn, uid)?
            .ok_or_else(|| AppError::NotFound(format!("Profile {uid}")))
    }

    /// Creates the profile on first write. Role flags are never set here.
    pub fn update(&self, uid: &str, update: ProfileUpdate) -> Result<UserProfile, AppError> {
        let first_name = update.first_name.map(|n| clean_name("first_name", &n)).transpose()?;
        let last_name = update.last_name.map(|n| clean_name("last_name", &n)).transpose()?;

        let now = now();
        let conn = lock_db(&self.db)?;
        let mut profile = queries::get_profile(&conn, uid)?.unwrap_or_else(|| UserProfile {
            uid: uid.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            is_admin: false,
            is_coach: false,
            created_at: now,
            updated_at: now,
        });
        if let Some(first) = first_name {
            profile.first_name = first;
        }
        if let Some(last) = last_name {
            profile.last_name = last;
        }
        profile.updated_at = now;

        queries::save_profile(&conn, &profile)?;
        tracing::debug!(uid, "profile saved");
        Ok(profile)
    }
}

fn clean_name(field: &'static str, raw: &str) -> Result<String, AppError> {
    let name = sanitize_text(raw);
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(
            field,
            format!("Must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    Ok(name)
}

fn now() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn service() -> ProfileService {
        ProfileService::new(Arc::new(Mutex::new(db::init_db(":memory:").unwrap())))
    }

    #[test]
    fn test_missing_profile_is_not_found() {
        assert!(matches!(service().get("ghost").unwrap_err(), AppError::NotFound(_)));
    }

    #[test]
    fn test_update_creates_then_merges() {
        let svc = service();
        let created = svc
            .update(
                "u1",
                ProfileUpdate {
                    first_name: Some(" Jane ".to_string()),
                    last_name: Some("Runner".to_string()),
                },
            )
            .unwrap();
        assert_eq!(created.display_name(), "Jane Runner");
        assert!(!created.is_admin);

        let merged = svc
            .update(
                "u1",
                ProfileUpdate {
                    first_name: None,
                    last_name: Some("Sprinter".to_string()),
                },
            )
            .unwrap();
        assert_eq!(merged.first_name, "Jane");
        assert_eq!(merged.created_at, created.created_at);
        assert_eq!(svc.get("u1").unwrap(), merged);
    }

    #[test]
    fn test_overlong_name_rejected() {
        let err = service()
            .update(
                "u1",
                ProfileUpdate {
                    first_name: Some("x".repeat(81)),
                    last_name: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "first_name", .. }));
    }
}
