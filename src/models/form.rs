use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Phone,
    Service,
    Message,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Service => "service",
            Field::Message => "message",
        }
    }
}

/// Services the coach offers; the form's service selector is limited to these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceLabel {
    #[serde(rename = "Personal Training")]
    PersonalTraining,
    #[serde(rename = "Group Training")]
    GroupTraining,
    #[serde(rename = "Online Coaching")]
    OnlineCoaching,
    #[serde(rename = "Nutrition Coaching")]
    NutritionCoaching,
    #[serde(rename = "Sports Performance")]
    SportsPerformance,
}

impl ServiceLabel {
    pub const ALL: [ServiceLabel; 5] = [
        ServiceLabel::PersonalTraining,
        ServiceLabel::GroupTraining,
        ServiceLabel::OnlineCoaching,
        ServiceLabel::NutritionCoaching,
        ServiceLabel::SportsPerformance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceLabel::PersonalTraining => "Personal Training",
            ServiceLabel::GroupTraining => "Group Training",
            ServiceLabel::OnlineCoaching => "Online Coaching",
            ServiceLabel::NutritionCoaching => "Nutrition Coaching",
            ServiceLabel::SportsPerformance => "Sports Performance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(s))
    }
}

/// A form with a fixed set of text fields.
pub trait FormFields: Clone + Default {
    const FIELDS: &'static [Field];

    /// Fields that may be left blank.
    const OPTIONAL: &'static [Field] = &[];

    fn get(&self, field: Field) -> &str;
    fn set(&mut self, field: Field, value: String);

    fn is_required(field: Field) -> bool {
        Self::FIELDS.contains(&field) && !Self::OPTIONAL.contains(&field)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub message: String,
}

impl FormFields for ContactForm {
    const FIELDS: &'static [Field] = &[
        Field::Name,
        Field::Email,
        Field::Phone,
        Field::Service,
        Field::Message,
    ];

    fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::Service => &self.service,
            Field::Message => &self.message,
        }
    }

    fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Name => self.name = value,
            Field::Email => self.email = value,
            Field::Phone => self.phone = value,
            Field::Service => self.service = value,
            Field::Message => self.message = value,
        }
    }
}

/// Booking request form. The free-text field carries session notes and may
/// be left empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub notes: String,
}

impl FormFields for BookingForm {
    const FIELDS: &'static [Field] = &[
        Field::Name,
        Field::Email,
        Field::Phone,
        Field::Service,
        Field::Message,
    ];
    const OPTIONAL: &'static [Field] = &[Field::Message];

    fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::Service => &self.service,
            Field::Message => &self.notes,
        }
    }

    fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Name => self.name = value,
            Field::Email => self.email = value,
            Field::Phone => self.phone = value,
            Field::Service => self.service = value,
            Field::Message => self.notes = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_label_parse() {
        assert_eq!(
            ServiceLabel::parse("personal training"),
            Some(ServiceLabel::PersonalTraining)
        );
        assert_eq!(
            ServiceLabel::parse(" Online Coaching "),
            Some(ServiceLabel::OnlineCoaching)
        );
        assert_eq!(ServiceLabel::parse("Underwater Basket Weaving"), None);
    }

    #[test]
    fn test_booking_notes_optional() {
        assert!(BookingForm::is_required(Field::Name));
        assert!(!BookingForm::is_required(Field::Message));
        assert!(ContactForm::is_required(Field::Message));
    }
}
