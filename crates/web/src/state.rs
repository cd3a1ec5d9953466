//! Application state shared across handlers.

use database::Database;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Domain new addresses are issued on.
    pub domain: String,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, domain: impl Into<String>) -> Self {
        Self {
            db,
            domain: domain.into().to_lowercase(),
        }
    }
}
