//! HTTP and WebSocket handlers.
//!
//! # Endpoints
//!
//! - `POST /webhook/submission-status-update` – email the submitter on a status change
//! - `POST /webhook/submission-update`        – push row changes to live subscribers
//! - `GET  /ws/admin`                         – WebSocket, every submission update
//! - `GET  /ws/artist/{user_id}`              – WebSocket, one artist's updates

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

mod webhook;
mod ws;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/webhook/submission-status-update",
            post(webhook::submission_status_update),
        )
        .route("/webhook/submission-update", post(webhook::submission_update))
        .route("/ws/admin", get(ws::admin_ws))
        .route("/ws/artist/{user_id}", get(ws::artist_ws))
}
