//! Temporary mailbox operations.

use std::time::Duration;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::address::{self, LOCAL_PART_LENGTH, PASSWORD_LENGTH};
use crate::error::{DatabaseError, Result};
use crate::models::{Mailbox, User};

/// Number of random addresses tried before giving up.
pub const MAX_ADDRESS_ATTEMPTS: u32 = 16;

/// Return the user's mailbox, creating one if they have none.
pub async fn ensure_mailbox(pool: &SqlitePool, user_id: i64, domain: &str) -> Result<Mailbox> {
    if let Some(mailbox) = get_mailbox_for_user(pool, user_id).await? {
        return Ok(mailbox);
    }

    let mut conn = pool.acquire().await?;
    match insert_mailbox(&mut conn, Some(user_id), domain).await {
        Ok(mailbox) => {
            info!(user_id, address = %mailbox.address, "Created mailbox");
            Ok(mailbox)
        }
        // Another request created the user's mailbox concurrently.
        Err(err) if err.is_unique_violation() => get_mailbox_for_user(pool, user_id)
            .await?
            .ok_or(err),
        Err(err) => Err(err),
    }
}

/// Create a mailbox owned by no user.
pub async fn create_anonymous_mailbox(pool: &SqlitePool, domain: &str) -> Result<Mailbox> {
    let mut conn = pool.acquire().await?;
    let mailbox = insert_mailbox(&mut conn, None, domain).await?;
    debug!(address = %mailbox.address, "Created anonymous mailbox");
    Ok(mailbox)
}

/// Replace the user's mailbox with a fresh address.
///
/// The old mailbox and all of its mail are deleted.
pub async fn change_mailbox(pool: &SqlitePool, user_id: i64, domain: &str) -> Result<Mailbox> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        DELETE FROM mailboxes
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    let mailbox = insert_mailbox(&mut tx, Some(user_id), domain).await?;
    tx.commit().await?;

    info!(user_id, address = %mailbox.address, "Changed mailbox");
    Ok(mailbox)
}

/// Get the mailbox owned by a user.
pub async fn get_mailbox_for_user(pool: &SqlitePool, user_id: i64) -> Result<Option<Mailbox>> {
    let mailbox = sqlx::query_as::<_, Mailbox>(
        r#"
        SELECT id, user_id, address, password, created_at
        FROM mailboxes
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(mailbox)
}

/// Get a mailbox by address (case-insensitive).
pub async fn get_mailbox_by_address(pool: &SqlitePool, address: &str) -> Result<Option<Mailbox>> {
    let mailbox = sqlx::query_as::<_, Mailbox>(
        r#"
        SELECT id, user_id, address, password, created_at
        FROM mailboxes
        WHERE address = ?
        "#,
    )
    .bind(address::normalize(address))
    .fetch_optional(pool)
    .await?;

    Ok(mailbox)
}

/// Get the user owning an address, if the address exists and has an owner.
pub async fn get_owner(pool: &SqlitePool, address: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.telegram_id, u.name, u.username, u.created_at, u.updated_at
        FROM users u
        INNER JOIN mailboxes m ON m.user_id = u.id
        WHERE m.address = ?
        "#,
    )
    .bind(address::normalize(address))
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Delete anonymous mailboxes created more than `max_age` ago.
pub async fn delete_anonymous_older_than(pool: &SqlitePool, max_age: Duration) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM mailboxes
        WHERE user_id IS NULL
          AND created_at < datetime('now', ?)
        "#,
    )
    .bind(crate::age_modifier(max_age))
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Insert a mailbox with a random address, retrying on address collisions.
async fn insert_mailbox(
    conn: &mut SqliteConnection,
    user_id: Option<i64>,
    domain: &str,
) -> Result<Mailbox> {
    for attempt in 1..=MAX_ADDRESS_ATTEMPTS {
        let local = address::generate_local_part(LOCAL_PART_LENGTH);
        let address = address::full_address(&local, domain);
        let password = address::generate_password(PASSWORD_LENGTH);

        let result = sqlx::query_as::<_, Mailbox>(
            r#"
            INSERT INTO mailboxes (user_id, address, password)
            VALUES (?, ?, ?)
            RETURNING id, user_id, address, password, created_at
            "#,
        )
        .bind(user_id)
        .bind(&address)
        .bind(&password)
        .fetch_one(&mut *conn)
        .await;

        match result {
            Ok(mailbox) => return Ok(mailbox),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                // A UNIQUE on user_id is not an address collision; retrying won't help.
                if db_err.message().contains("user_id") {
                    return Err(DatabaseError::Sqlx(sqlx::Error::Database(db_err)));
                }
                debug!(attempt, %address, "Address collision, retrying");
            }
            Err(e) => return Err(DatabaseError::Sqlx(e)),
        }
    }

    Err(DatabaseError::AddressExhausted {
        attempts: MAX_ADDRESS_ATTEMPTS,
    })
}
