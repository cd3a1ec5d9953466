//! The seam between the protocol and what happens to accepted mail.

use async_trait::async_trait;

use crate::envelope::Envelope;

/// Error returned by a [`MailHandler`]; the client receives a 451 reply.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Receives mail accepted by an [`crate::SmtpServer`].
///
/// # Example
///
/// ```rust
/// use smtp_server::{async_trait, Envelope, HandlerError, MailHandler};
///
/// struct PrintHandler;
///
/// #[async_trait]
/// impl MailHandler for PrintHandler {
///     async fn handle_mail(&self, envelope: Envelope) -> Result<(), HandlerError> {
///         println!("{} -> {:?}", envelope.mail_from, envelope.rcpt_to);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait MailHandler: Send + Sync {
    /// Decide whether mail for this address is accepted at RCPT time.
    ///
    /// Default implementation accepts every address.
    async fn accept_recipient(&self, _address: &str) -> bool {
        true
    }

    /// Take ownership of a fully received message.
    async fn handle_mail(&self, envelope: Envelope) -> Result<(), HandlerError>;
}
