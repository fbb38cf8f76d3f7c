use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::auth::AuthProvider;
use crate::services::availability::AvailabilityResolver;
use crate::services::bookings::BookingRepository;
use crate::services::contact::ContactService;
use crate::services::email::EmailProvider;
use crate::services::newsletter::NewsletterProvider;
use crate::services::preferences::PreferenceService;
use crate::services::profiles::ProfileService;
use crate::services::testimonials::TestimonialService;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub availability: AvailabilityResolver,
    pub bookings: BookingRepository,
    pub contact: ContactService,
    pub testimonials: TestimonialService,
    pub preferences: PreferenceService,
    pub profiles: ProfileService,
    pub newsletter: Box<dyn NewsletterProvider>,
    /// `None` when AUTH_ENABLED is off; the auth routes then answer 404.
    pub auth: Option<Arc<dyn AuthProvider>>,
}

impl AppState {
    /// Wires every service onto one store connection.
    pub fn new(
        conn: Connection,
        config: AppConfig,
        email: Arc<dyn EmailProvider>,
        newsletter: Box<dyn NewsletterProvider>,
        auth: Option<Arc<dyn AuthProvider>>,
    ) -> Self {
        let db = Arc::new(Mutex::new(conn));
        let availability = AvailabilityResolver::new(
            db.clone(),
            config.working_hours,
            config.slot_granularity_minutes,
        );
        let bookings =
            BookingRepository::new(db.clone(), availability.clone(), config.coach_id.clone());
        let contact = ContactService::new(
            email,
            config.contact_inbox.clone(),
            config.contact_template_id.clone(),
            config.service_timeout,
        );
        let testimonials = TestimonialService::new(db.clone(), config.service_timeout);
        let preferences = PreferenceService::new(db.clone(), config.default_locale);
        let profiles = ProfileService::new(db.clone());

        Self {
            db,
            config,
            availability,
            bookings,
            contact,
            testimonials,
            preferences,
            profiles,
            newsletter,
            auth,
        }
    }
}
