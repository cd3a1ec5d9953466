//! Web inbox for temporary mailboxes.
//!
//! Every visit to `/` issues an anonymous mailbox on the served domain and
//! renders a page that polls `/messages` for its mail.

pub mod error;
pub mod routes;
pub mod state;

use axum::Router;

pub use error::{Result, WebError};
pub use state::AppState;

/// Build the application with its state attached.
pub fn app(state: AppState) -> Router {
    routes::router().with_state(state)
}
