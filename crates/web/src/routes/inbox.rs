//! The inbox page.

use askama::Template;
use axum::extract::State;
use tracing::info;

use crate::error::Result;
use crate::state::AppState;

/// Inbox page template.
#[derive(Template)]
#[template(path = "index.html")]
pub struct InboxTemplate {
    /// Full address of the visitor's mailbox.
    pub address: String,
    /// Local part, used to poll for mail.
    pub local: String,
}

/// Issue a fresh anonymous mailbox and render its inbox.
pub async fn inbox_page(State(state): State<AppState>) -> Result<InboxTemplate> {
    let mailbox = database::mailbox::create_anonymous_mailbox(state.db.pool(), &state.domain).await?;
    info!(address = %mailbox.address, "Issued web mailbox");

    let local = database::address::local_part(&mailbox.address).to_string();
    Ok(InboxTemplate {
        address: mailbox.address,
        local,
    })
}
