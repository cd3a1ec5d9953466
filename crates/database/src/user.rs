//! User registry operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::User;

/// Create a user or refresh the name and username of an existing one.
///
/// Returns the stored user and whether it was newly created.
pub async fn upsert_user(
    pool: &SqlitePool,
    telegram_id: i64,
    name: Option<&str>,
    username: Option<&str>,
) -> Result<(User, bool)> {
    let existing = get_user_by_telegram_id(pool, telegram_id).await?;

    if let Some(user) = existing {
        sqlx::query(
            r#"
            UPDATE users
            SET name = ?, username = ?, updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(username)
        .bind(user.id)
        .execute(pool)
        .await?;

        let user = get_user(pool, user.id).await?;
        return Ok((user, false));
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO users (telegram_id, name, username)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(telegram_id)
    .bind(name)
    .bind(username)
    .execute(pool)
    .await;

    match inserted {
        Ok(result) => {
            let user = get_user(pool, result.last_insert_rowid()).await?;
            Ok((user, true))
        }
        // A concurrent first contact registered the account in between.
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            let user = get_user_by_telegram_id(pool, telegram_id)
                .await?
                .ok_or_else(|| DatabaseError::NotFound {
                    entity: "User",
                    id: telegram_id.to_string(),
                })?;
            Ok((user, false))
        }
        Err(e) => Err(e.into()),
    }
}

/// Get a user by ID.
pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, telegram_id, name, username, created_at, updated_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: id.to_string(),
    })
}

/// Get a user by Telegram ID.
pub async fn get_user_by_telegram_id(pool: &SqlitePool, telegram_id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, telegram_id, name, username, created_at, updated_at
        FROM users
        WHERE telegram_id = ?
        "#,
    )
    .bind(telegram_id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Count total users.
pub async fn count_users(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM users
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
