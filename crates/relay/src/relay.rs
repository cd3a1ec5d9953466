//! The [`MailHandler`] that stores accepted mail and notifies channels.

use std::sync::Arc;

use database::{address, email, mailbox, Database, NewEmail};
use smtp_server::{async_trait, Envelope, HandlerError, MailHandler};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::notifier::{EmailNotice, Notifier};
use crate::parse::ParsedEmail;

/// Outcome of delivering one envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Ids of the stored mails, one per known recipient.
    pub stored: Vec<i64>,
    /// Recipients without a mailbox.
    pub skipped: Vec<String>,
}

/// Stores mail for mailboxes on one domain.
pub struct Relay {
    db: Database,
    domain: String,
    notifier: Option<Arc<dyn Notifier>>,
}

impl Relay {
    /// Create a relay serving `domain`.
    pub fn new(db: Database, domain: impl Into<String>) -> Self {
        Self {
            db,
            domain: domain.into().to_lowercase(),
            notifier: None,
        }
    }

    /// Announce stored mail through `notifier`.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// The served domain.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Check whether an address belongs to the served domain.
    pub fn is_local(&self, recipient: &str) -> bool {
        address::domain_of(recipient.trim())
            .map(|domain| domain.eq_ignore_ascii_case(&self.domain))
            .unwrap_or(false)
    }

    /// Store the message for every known recipient and notify.
    pub async fn deliver(&self, envelope: &Envelope) -> Result<DeliveryReport> {
        let parsed = ParsedEmail::parse(&envelope.data);
        let sender = match parsed.formatted_sender() {
            s if s.is_empty() => envelope.mail_from.clone(),
            s => s,
        };
        let mut report = DeliveryReport::default();

        for rcpt in &envelope.rcpt_to {
            let recipient = address::normalize(rcpt);
            let Some(mailbox) = mailbox::get_mailbox_by_address(self.db.pool(), &recipient).await?
            else {
                debug!(recipient = %recipient, "No mailbox for recipient, skipping");
                report.skipped.push(recipient);
                continue;
            };

            let email_id = email::save_email(
                self.db.pool(),
                &NewEmail {
                    mailbox_id: mailbox.id,
                    recipient: recipient.clone(),
                    sender_name: non_empty(&parsed.sender_name),
                    sender_email: non_empty(&parsed.sender_email)
                        .or_else(|| non_empty(&envelope.mail_from)),
                    subject: non_empty(&parsed.subject),
                    body: non_empty(&parsed.body_plain),
                    body_html: non_empty(&parsed.body_html),
                    raw_headers: non_empty(&parsed.raw_headers),
                },
            )
            .await?;

            info!(
                email_id,
                recipient = %recipient,
                sender = %sender,
                size = envelope.data_size(),
                "Stored mail"
            );
            report.stored.push(email_id);

            if let Some(notifier) = &self.notifier {
                let notice = EmailNotice {
                    email_id,
                    recipient: recipient.clone(),
                    sender: sender.clone(),
                    subject: parsed.subject.clone(),
                    body_plain: parsed.body_plain.clone(),
                    body_html: parsed.body_html.clone(),
                };
                if let Err(e) = notifier.notify_new_email(&notice).await {
                    warn!(
                        channel = notifier.name(),
                        email_id,
                        error = %e,
                        "Failed to send notification"
                    );
                }
            }
        }

        Ok(report)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[async_trait]
impl MailHandler for Relay {
    async fn accept_recipient(&self, address: &str) -> bool {
        self.is_local(address)
    }

    async fn handle_mail(&self, envelope: Envelope) -> std::result::Result<(), HandlerError> {
        let report = self.deliver(&envelope).await?;
        debug!(
            stored = report.stored.len(),
            skipped = report.skipped.len(),
            "Delivery finished"
        );
        Ok(())
    }
}
