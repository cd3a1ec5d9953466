//! Notification channels for newly stored mail.

use async_trait::async_trait;

use crate::error::NotifyError;

/// A stored message, as announced to notification channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailNotice {
    /// Id of the stored mail.
    pub email_id: i64,
    /// Recipient address (lowercase).
    pub recipient: String,
    /// Sender in display form.
    pub sender: String,
    pub subject: String,
    pub body_plain: String,
    pub body_html: String,
}

/// A channel told about every stored message.
///
/// Failures are reported to the caller for logging only; they never fail the
/// delivery that triggered them.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logs.
    fn name(&self) -> &str;

    /// Announce a stored message.
    async fn notify_new_email(&self, notice: &EmailNotice) -> Result<(), NotifyError>;
}
