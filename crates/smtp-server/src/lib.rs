//! Minimal async SMTP receiver.
//!
//! Implements enough of RFC 5321 to accept mail from real MTAs for a
//! disposable-address service: `HELO`, `EHLO`, `MAIL`, `RCPT`, `DATA`,
//! `RSET`, `NOOP`, `VRFY`, `HELP` and `QUIT`. There is no authentication,
//! no TLS and no relaying; accepted messages are handed to a [`MailHandler`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use smtp_server::{async_trait, Envelope, HandlerError, MailHandler, SmtpServer};
//!
//! struct Discard;
//!
//! #[async_trait]
//! impl MailHandler for Discard {
//!     async fn handle_mail(&self, _envelope: Envelope) -> Result<(), HandlerError> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<(), smtp_server::SmtpError> {
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:2525").await?;
//! SmtpServer::new("mx.example.com")
//!     .serve(listener, Arc::new(Discard))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Size limits
//!
//! - User names: 64 characters max
//! - Domain names: 255 characters max
//! - Paths: 256 characters max
//! - Command lines: 512 characters max
//! - Text lines: 1000 characters max
//! - Recipients: 100 max per message
//! - Message size: 10 MiB by default, see [`SmtpServer::with_max_message_size`]

pub mod commands;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod response;
pub mod server;
pub mod session;

pub use commands::Command;
pub use envelope::Envelope;
pub use error::{SmtpError, SmtpLimits};
pub use handler::{HandlerError, MailHandler};
pub use response::SmtpResponse;
pub use server::SmtpServer;
pub use session::{SmtpSession, SmtpState};

// Re-export async_trait for handler implementations
pub use async_trait::async_trait;
