use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::models::{Embed, ServiceLabel};
use crate::state::AppState;

#[derive(Serialize)]
pub struct EmbedInfo {
    #[serde(flatten)]
    embed: Embed,
    src: String,
}

#[derive(Serialize)]
pub struct SiteInfo {
    services: Vec<&'static str>,
    working_hours: String,
    coach_id: String,
    booking_widget_url: Option<String>,
    auth_enabled: bool,
    embeds: Vec<EmbedInfo>,
}

// GET /api/site
pub async fn site_info(State(state): State<Arc<AppState>>) -> Json<SiteInfo> {
    let config = &state.config;

    let mut embeds = vec![];
    if !config.maps_place_id.is_empty() && !config.maps_api_key.is_empty() {
        embeds.push(Embed::Map {
            place_id: config.maps_place_id.clone(),
            api_key: config.maps_api_key.clone(),
        });
    }
    if !config.youtube_playlist_id.is_empty() {
        embeds.push(Embed::Playlist {
            playlist_id: config.youtube_playlist_id.clone(),
        });
    }

    Json(SiteInfo {
        services: ServiceLabel::ALL.iter().map(|s| s.as_str()).collect(),
        working_hours: config.working_hours.to_human_readable(),
        coach_id: config.coach_id.clone(),
        booking_widget_url: Some(config.booking_widget_url.clone()).filter(|u| !u.is_empty()),
        auth_enabled: state.auth.is_some(),
        embeds: embeds
            .into_iter()
            .map(|embed| EmbedInfo {
                src: embed.src_url(),
                embed,
            })
            .collect(),
    })
}
