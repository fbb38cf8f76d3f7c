pub mod availability;
pub mod booking;
pub mod embed;
pub mod form;
pub mod preferences;
pub mod testimonial;
pub mod user;

pub use availability::{SlotQuery, WorkingHours};
pub use booking::{
    Booking, BookingPatch, BookingStatus, Direction, ListOptions, NewBooking, OrderBy, Page,
};
pub use embed::Embed;
pub use form::{BookingForm, ContactForm, Field, FormFields, ServiceLabel};
pub use preferences::{Locale, Preferences, Theme, ThemePreference};
pub use testimonial::{NewTestimonial, Testimonial, TestimonialFilter, TestimonialKind};
pub use user::{AuthIdentity, ProfileUpdate, UserProfile};
