//! Route handlers for the web inbox.

pub mod health;
pub mod inbox;
pub mod messages;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // HTML pages
        .route("/", get(inbox::inbox_page))
        // Health check
        .route("/health", get(health::health))
        // API endpoints
        .route("/messages", get(messages::messages_api))
}
