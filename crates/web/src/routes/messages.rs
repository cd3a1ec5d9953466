//! Inbox polling API.

use axum::extract::{Query, State};
use axum::Json;
use database::StoredEmail;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WebError};
use crate::state::AppState;

/// Mails returned per poll.
pub const INBOX_LIMIT: i64 = 50;

/// Query string of `/messages`.
#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    /// Local part or full address; only the local part is used.
    pub email: Option<String>,
}

/// A mail as shown in the web inbox.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: i64,
    pub sender: String,
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub received_at: String,
}

impl From<StoredEmail> for MessageView {
    fn from(mail: StoredEmail) -> Self {
        Self {
            id: mail.id,
            sender: mail.sender(),
            sender_name: mail.sender_name,
            sender_email: mail.sender_email,
            subject: mail.subject,
            body: mail.body,
            received_at: mail.received_at,
        }
    }
}

/// Newest mails for an address on the served domain.
pub async fn messages_api(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<MessageView>>> {
    let email = query.email.unwrap_or_default();
    let local = database::address::local_part(&email);
    if local.is_empty() {
        return Err(WebError::BadRequest("missing email parameter".to_string()));
    }

    let address = database::address::full_address(local, &state.domain);
    let mails = database::email::list_by_recipient(state.db.pool(), &address, INBOX_LIMIT).await?;

    Ok(Json(mails.into_iter().map(MessageView::from).collect()))
}
