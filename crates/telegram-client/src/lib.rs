//! Telegram Bot API client library.
//!
//! This crate provides a small Rust client for the parts of the Bot API the
//! mail bot needs:
//!
//! - Sending and editing HTML messages with inline keyboards
//! - Answering callback queries
//! - Receiving updates through long polling
//!
//! # Example
//!
//! ```no_run
//! use telegram_client::{BotConfig, TelegramClient};
//!
//! # async fn example() -> Result<(), telegram_client::TelegramError> {
//! let client = TelegramClient::connect(BotConfig::new("123:ABC")).await?;
//! client.send_text(42, "<b>Hello!</b>").await?;
//!
//! use futures::StreamExt;
//! let mut updates = telegram_client::subscribe(&client);
//! while let Some(result) = updates.next().await {
//!     match result {
//!         Ok(update) => println!("update {}", update.update_id),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod poll;
pub mod types;

pub use client::TelegramClient;
pub use config::BotConfig;
pub use error::TelegramError;
pub use poll::{subscribe, subscribe_with_config, PollConfig, UpdateStream};
pub use types::*;
