//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A Telegram user known to the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Telegram user ID.
    pub telegram_id: Option<i64>,
    /// Display name (first and last name).
    pub name: Option<String>,
    /// Telegram @username, without the @.
    pub username: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// A temporary mailbox.
///
/// Mailboxes without a `user_id` were handed out to web visitors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Mailbox {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Owning user, if any.
    pub user_id: Option<i64>,
    /// Full lowercased address (e.g., "k3j9x0a1bq@example.com").
    pub address: String,
    /// Generated mailbox password shown to the owner.
    pub password: String,
    /// Creation timestamp.
    pub created_at: String,
}

impl Mailbox {
    /// Whether this mailbox belongs to no user.
    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}

/// A received email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StoredEmail {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Mailbox the email was delivered to.
    pub mailbox_id: i64,
    /// Lowercased envelope recipient.
    pub recipient: String,
    /// Decoded sender display name.
    pub sender_name: Option<String>,
    /// Sender address.
    pub sender_email: Option<String>,
    /// Decoded subject.
    pub subject: Option<String>,
    /// Plain text body.
    pub body: Option<String>,
    /// HTML body, if the message had one.
    pub body_html: Option<String>,
    /// Header block as `Name: value` lines.
    pub raw_headers: Option<String>,
    /// Receive timestamp.
    pub received_at: String,
}

impl StoredEmail {
    /// Sender in display form: `Name <address>`, or whichever part is known.
    pub fn sender(&self) -> String {
        let name = self.sender_name.as_deref().unwrap_or("").trim();
        let email = self.sender_email.as_deref().unwrap_or("").trim();
        match (name.is_empty(), email.is_empty()) {
            (false, false) => format!("{} <{}>", name, email),
            (true, false) => email.to_string(),
            (false, true) => name.to_string(),
            (true, true) => String::new(),
        }
    }
}

/// Insert payload for [`crate::email::save_email`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEmail {
    /// Mailbox to deliver into.
    pub mailbox_id: i64,
    /// Envelope recipient.
    pub recipient: String,
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub body_html: Option<String>,
    pub raw_headers: Option<String>,
}
