use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const MIN_CONTENT_LEN: usize = 10;
pub const MAX_CONTENT_LEN: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestimonialKind {
    Text,
    Video,
    BeforeAfter,
    Mixed,
}

impl TestimonialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestimonialKind::Text => "text",
            TestimonialKind::Video => "video",
            TestimonialKind::BeforeAfter => "before_after",
            TestimonialKind::Mixed => "mixed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "video" => TestimonialKind::Video,
            "before_after" => TestimonialKind::BeforeAfter,
            "mixed" => TestimonialKind::Mixed,
            _ => TestimonialKind::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeforeAfter {
    pub before_url: String,
    pub after_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: String,
    pub client_name: String,
    pub client_age: Option<u32>,
    pub client_location: Option<String>,
    pub rating: u8,
    pub content: String,
    pub kind: TestimonialKind,
    pub tags: Vec<String>,
    pub service: String,
    pub video_id: Option<String>,
    pub before_after: Option<BeforeAfter>,
    pub results: BTreeMap<String, String>,
    pub is_visible: bool,
    pub is_featured: bool,
    pub created_at: NaiveDateTime,
    pub published_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTestimonial {
    pub client_name: String,
    #[serde(default)]
    pub client_age: Option<u32>,
    #[serde(default)]
    pub client_location: Option<String>,
    pub rating: u8,
    pub content: String,
    #[serde(default = "default_kind")]
    pub kind: TestimonialKind,
    #[serde(default)]
    pub tags: Vec<String>,
    pub service: String,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub before_after: Option<BeforeAfter>,
    #[serde(default)]
    pub results: BTreeMap<String, String>,
    #[serde(default)]
    pub is_featured: bool,
}

fn default_kind() -> TestimonialKind {
    TestimonialKind::Text
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TestimonialSort {
    #[default]
    Newest,
    Rating,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestimonialFilter {
    pub kind: Option<TestimonialKind>,
    pub min_rating: Option<u8>,
    pub tag: Option<String>,
    pub featured: Option<bool>,
    pub service: Option<String>,
    #[serde(default)]
    pub sort: TestimonialSort,
    pub limit: Option<usize>,
}

impl TestimonialFilter {
    pub fn matches(&self, t: &Testimonial) -> bool {
        if !t.is_visible {
            return false;
        }
        if let Some(kind) = self.kind {
            if t.kind != kind {
                return false;
            }
        }
        if let Some(min) = self.min_rating {
            if t.rating < min {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !t.tags.iter().any(|x| x.eq_ignore_ascii_case(tag)) {
                return false;
            }
        }
        if let Some(featured) = self.featured {
            if t.is_featured != featured {
                return false;
            }
        }
        if let Some(service) = &self.service {
            if !t.service.eq_ignore_ascii_case(service) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, items: Vec<Testimonial>) -> Vec<Testimonial> {
        let mut out: Vec<Testimonial> = items.into_iter().filter(|t| self.matches(t)).collect();
        match self.sort {
            TestimonialSort::Newest => out.sort_by(|a, b| {
                let a_key = a.published_at.unwrap_or(a.created_at);
                let b_key = b.published_at.unwrap_or(b.created_at);
                b_key.cmp(&a_key)
            }),
            TestimonialSort::Rating => out.sort_by(|a, b| {
                b.rating
                    .cmp(&a.rating)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            }),
        }
        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .unwrap_or_default()
}

/// Built-in testimonials shown when the store cannot be reached.
pub fn sample_testimonials() -> Vec<Testimonial> {
    let sample = |id: &str,
                  name: &str,
                  age: u32,
                  location: &str,
                  content: &str,
                  kind: TestimonialKind,
                  service: &str,
                  tags: &[&str],
                  featured: bool,
                  when: NaiveDateTime| Testimonial {
        id: id.to_string(),
        client_name: name.to_string(),
        client_age: Some(age),
        client_location: Some(location.to_string()),
        rating: 5,
        content: content.to_string(),
        kind,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        service: service.to_string(),
        video_id: None,
        before_after: None,
        results: BTreeMap::new(),
        is_visible: true,
        is_featured: featured,
        created_at: when,
        published_at: Some(when),
    };

    let mut marathon = sample(
        "sample-1",
        "Sarah M.",
        34,
        "Lyon",
        "Twelve weeks of structured training took me from barely running 5k to finishing my first half marathon.",
        TestimonialKind::Mixed,
        "Personal Training",
        &["running", "endurance"],
        true,
        at(2024, 3, 12),
    );
    marathon
        .results
        .insert("half_marathon".to_string(), "1:58:40".to_string());

    let mut strength = sample(
        "sample-2",
        "Thomas R.",
        41,
        "Geneva",
        "The programme fit around my work schedule and I finally fixed the knee pain that stopped me lifting.",
        TestimonialKind::BeforeAfter,
        "Sports Performance",
        &["strength", "rehab"],
        true,
        at(2024, 1, 28),
    );
    strength.before_after = Some(BeforeAfter {
        before_url: "/img/testimonials/thomas-before.jpg".to_string(),
        after_url: "/img/testimonials/thomas-after.jpg".to_string(),
    });

    let online = sample(
        "sample-3",
        "Amélie D.",
        29,
        "Montréal",
        "Online coaching felt just as personal as training in person. Weekly check-ins kept me honest.",
        TestimonialKind::Text,
        "Online Coaching",
        &["online", "consistency"],
        false,
        at(2023, 11, 5),
    );

    vec![marathon, strength, online]
}
