use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::models::testimonial::{MAX_CONTENT_LEN, MIN_CONTENT_LEN};
use crate::models::{Field, FormFields, ServiceLabel};
use crate::services::sanitize::sanitize_text;

/// How long the success/error banner stays up before the form goes idle.
pub const DISPLAY_DELAY: Duration = Duration::from_secs(3);

pub type FieldErrors = BTreeMap<Field, String>;

/// Checks one field value. Required-ness is checked first, so a blank
/// field only ever reports the "required" message.
pub fn validate_field(field: Field, value: &str, required: bool) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        if !required {
            return None;
        }
        return Some(required_message(field).to_string());
    }

    match field {
        Field::Email if !is_valid_email(trimmed) => {
            Some("Please enter a valid email address".to_string())
        }
        Field::Service if ServiceLabel::parse(trimmed).is_none() => {
            Some("Please select a valid service".to_string())
        }
        _ => None,
    }
}

fn required_message(field: Field) -> &'static str {
    match field {
        Field::Name => "Name is required",
        Field::Email => "Email is required",
        Field::Phone => "Phone is required",
        Field::Service => "Please select a service",
        Field::Message => "Message is required",
    }
}

/// `local@domain.tld`: the address must be well formed and the domain must
/// contain a dot with a non-empty label on each side.
pub fn is_valid_email(email: &str) -> bool {
    if !validator::validate_email(email) {
        return false;
    }
    match email.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain
                    .rsplit_once('.')
                    .map(|(host, tld)| !host.is_empty() && tld.len() >= 2)
                    .unwrap_or(false)
        }
        None => false,
    }
}

/// Length bounds applied to free text on the testimonial path.
pub fn validate_content_length(content: &str) -> Option<String> {
    let len = content.trim().chars().count();
    if len < MIN_CONTENT_LEN {
        Some(format!("Must be at least {MIN_CONTENT_LEN} characters"))
    } else if len > MAX_CONTENT_LEN {
        Some(format!("Must be at most {MAX_CONTENT_LEN} characters"))
    } else {
        None
    }
}

pub fn validate_all<F: FormFields>(form: &F) -> FieldErrors {
    F::FIELDS
        .iter()
        .filter_map(|&field| {
            validate_field(field, form.get(field), F::is_required(field)).map(|msg| (field, msg))
        })
        .collect()
}

/// Copy of the form with every field trimmed and stripped of script content.
pub fn sanitized<F: FormFields>(form: &F) -> F {
    let mut clean = form.clone();
    for &field in F::FIELDS {
        clean.set(field, sanitize_text(form.get(field)));
    }
    clean
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Idle,
    Submitting,
    Success,
    Error,
}

#[derive(Debug, PartialEq)]
pub enum SubmitRejected {
    InFlight,
    Invalid(FieldErrors),
}

#[derive(Debug, Clone)]
pub struct FormState<F: FormFields> {
    values: F,
    errors: FieldErrors,
    touched: BTreeSet<Field>,
    status: SubmissionStatus,
    status_since: Instant,
    last_error: Option<String>,
}

impl<F: FormFields> Default for FormState<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FormFields> FormState<F> {
    pub fn new() -> Self {
        Self {
            values: F::default(),
            errors: FieldErrors::new(),
            touched: BTreeSet::new(),
            status: SubmissionStatus::Idle,
            status_since: Instant::now(),
            last_error: None,
        }
    }

    pub fn values(&self) -> &F {
        &self.values
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_touched(&self, field: Field) -> bool {
        self.touched.contains(&field)
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.values.set(field, value.into());
        self.revalidate(field);
    }

    pub fn blur(&mut self, field: Field) {
        self.touched.insert(field);
        self.revalidate(field);
    }

    /// Errors the user should see: only those on touched fields.
    pub fn visible_errors(&self) -> FieldErrors {
        self.errors
            .iter()
            .filter(|(field, _)| self.touched.contains(*field))
            .map(|(field, msg)| (*field, msg.clone()))
            .collect()
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.status, SubmissionStatus::Idle | SubmissionStatus::Error)
            && validate_all(&sanitized(&self.values)).is_empty()
    }

    /// Moves to `Submitting` and hands back the sanitized payload, or leaves
    /// the state where it was with every field touched so all errors show.
    /// Validation runs on the sanitized copy, so a field that sanitizes down
    /// to nothing counts as empty.
    pub fn begin_submit(&mut self) -> Result<F, SubmitRejected> {
        if !matches!(self.status, SubmissionStatus::Idle | SubmissionStatus::Error) {
            return Err(SubmitRejected::InFlight);
        }

        self.touched.extend(F::FIELDS.iter().copied());
        let payload = sanitized(&self.values);
        self.errors = validate_all(&payload);
        if !self.errors.is_empty() {
            return Err(SubmitRejected::Invalid(self.errors.clone()));
        }

        self.set_status(SubmissionStatus::Submitting, Instant::now());
        self.last_error = None;
        Ok(payload)
    }

    pub fn finish(&mut self, outcome: Result<(), String>) {
        self.finish_at(outcome, Instant::now());
    }

    pub fn finish_at(&mut self, outcome: Result<(), String>, now: Instant) {
        if self.status != SubmissionStatus::Submitting {
            return;
        }
        match outcome {
            Ok(()) => self.set_status(SubmissionStatus::Success, now),
            Err(message) => {
                self.last_error = Some(message);
                self.set_status(SubmissionStatus::Error, now);
            }
        }
    }

    /// Reverts a settled banner once it has been shown for `DISPLAY_DELAY`.
    /// Success clears the form; an error keeps the entered values.
    pub fn tick(&mut self, now: Instant) {
        if now.saturating_duration_since(self.status_since) < DISPLAY_DELAY {
            return;
        }
        match self.status {
            SubmissionStatus::Success => {
                *self = Self::new();
                self.status_since = now;
            }
            SubmissionStatus::Error => {
                self.last_error = None;
                self.set_status(SubmissionStatus::Idle, now);
            }
            SubmissionStatus::Idle | SubmissionStatus::Submitting => {}
        }
    }

    fn revalidate(&mut self, field: Field) {
        match validate_field(field, self.values.get(field), F::is_required(field)) {
            Some(msg) => {
                self.errors.insert(field, msg);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }

    fn set_status(&mut self, status: SubmissionStatus, now: Instant) {
        self.status = status;
        self.status_since = now;
    }
}
