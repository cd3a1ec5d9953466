//! Telegram front end for temporary mailboxes.
//!
//! Each Telegram user gets one mailbox on the served domain. The bot shows a
//! dashboard with the address and the latest mails, opens single mails,
//! swaps the address on request and announces new mail as it arrives (as the
//! relay's [`relay::Notifier`]).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mail_bot::MailBot;
//! use telegram_client::{BotConfig, TelegramClient};
//!
//! # async fn example(db: database::Database) -> Result<(), Box<dyn std::error::Error>> {
//! let client = TelegramClient::connect(BotConfig::new("123:ABC")).await?;
//! let bot = Arc::new(MailBot::new(client, db, "tempmail.test"));
//!
//! bot.run_with_shutdown(futures::future::pending()).await?;
//! # Ok(())
//! # }
//! ```

pub mod bot;
pub mod error;
pub mod formatting;
pub mod views;

pub use bot::MailBot;
pub use error::{BotError, Result};
