use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use coachdesk::config::{AppConfig, EmailProviderKind};
use coachdesk::db;
use coachdesk::handlers;
use coachdesk::services::auth::firebase::FirebaseAuth;
use coachdesk::services::auth::AuthProvider;
use coachdesk::services::email::brevo::BrevoEmail;
use coachdesk::services::email::emailjs::EmailJs;
use coachdesk::services::email::webhook::WebhookEmail;
use coachdesk::services::email::EmailProvider;
use coachdesk::services::http_client;
use coachdesk::services::newsletter::HostedFormNewsletter;
use coachdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            anyhow::bail!("refusing to start: {e}");
        }
    };

    let conn = db::init_db(&config.database_url)?;
    let client = http_client(config.service_timeout);

    let email: Arc<dyn EmailProvider> = match config.email_provider {
        EmailProviderKind::Brevo => {
            tracing::info!("using Brevo email provider");
            Arc::new(BrevoEmail::new(config.brevo_api_key.clone(), client.clone()))
        }
        EmailProviderKind::EmailJs => {
            tracing::info!("using EmailJS email provider (service: {})", config.emailjs_service_id);
            Arc::new(EmailJs::new(
                config.emailjs_service_id.clone(),
                config.emailjs_user_id.clone(),
                client.clone(),
            ))
        }
        EmailProviderKind::Webhook => {
            tracing::info!("using webhook email provider (url: {})", config.email_webhook_url);
            Arc::new(WebhookEmail::new(config.email_webhook_url.clone(), client.clone()))
        }
    };

    if config.newsletter_form_url.is_empty() {
        tracing::warn!("NEWSLETTER_FORM_URL not set, newsletter signups will fail");
    }
    let newsletter = HostedFormNewsletter::new(config.newsletter_form_url.clone(), client.clone());

    let auth: Option<Arc<dyn AuthProvider>> = if config.auth_enabled {
        tracing::info!("auth enabled (Firebase)");
        Some(Arc::new(FirebaseAuth::new(
            config.firebase_api_key.clone(),
            client.clone(),
        )))
    } else {
        None
    };

    tracing::info!(
        coach_id = %config.coach_id,
        hours = %config.working_hours.to_human_readable(),
        granularity = config.slot_granularity_minutes,
        "booking calendar configured"
    );

    let cors = match &config.cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH])
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    };

    let port = config.port;
    let state = Arc::new(AppState::new(
        conn,
        config,
        email,
        Box::new(newsletter),
        auth,
    ));

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
