//! SQLite persistence layer for tempmail.
//!
//! This crate provides async database operations for Telegram users, their
//! temporary mailboxes, and the emails received for them, using SQLx with
//! SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{mailbox, user, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:tempmail.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Register a Telegram user and hand out an address
//!     let (user, _is_new) = user::upsert_user(db.pool(), 42, Some("Bob"), None).await?;
//!     let mailbox = mailbox::ensure_mailbox(db.pool(), user.id, "example.com").await?;
//!     println!("{}", mailbox.address);
//!
//!     Ok(())
//! }
//! ```

pub mod address;
pub mod email;
pub mod error;
pub mod mailbox;
pub mod models;
pub mod user;

pub use error::{DatabaseError, Result};
pub use models::{Mailbox, NewEmail, StoredEmail, User};

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/tempmail.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// SQLite `datetime()` modifier selecting the instant `age` ago.
pub(crate) fn age_modifier(age: Duration) -> String {
    format!("-{} seconds", age.as_secs())
}
