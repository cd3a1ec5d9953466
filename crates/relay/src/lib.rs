//! Delivery of received mail into temporary mailboxes.
//!
//! [`Relay`] is the SMTP server's [`smtp_server::MailHandler`]: it parses each
//! accepted message once, stores a copy for every recipient that has a
//! mailbox and announces it through an optional [`Notifier`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use relay::Relay;
//!
//! let relay = Relay::new(db, "tempmail.test").with_notifier(Arc::new(bot));
//! SmtpServer::new("mx.tempmail.test").serve(listener, Arc::new(relay)).await?;
//! ```

pub mod error;
pub mod notifier;
pub mod parse;
pub mod relay;

pub use error::{NotifyError, RelayError, Result};
pub use notifier::{EmailNotice, Notifier};
pub use parse::ParsedEmail;
pub use relay::{DeliveryReport, Relay};
