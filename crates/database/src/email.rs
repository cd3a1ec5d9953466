//! Received email storage.

use std::time::Duration;

use sqlx::SqlitePool;

use crate::address;
use crate::error::Result;
use crate::models::{NewEmail, StoredEmail};

/// Store a received email and return its ID.
pub async fn save_email(pool: &SqlitePool, email: &NewEmail) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO emails (
            mailbox_id, recipient, sender_name, sender_email,
            subject, body, body_html, raw_headers
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(email.mailbox_id)
    .bind(address::normalize(&email.recipient))
    .bind(&email.sender_name)
    .bind(&email.sender_email)
    .bind(&email.subject)
    .bind(&email.body)
    .bind(&email.body_html)
    .bind(&email.raw_headers)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// List the newest emails of a mailbox.
pub async fn list_messages(pool: &SqlitePool, mailbox_id: i64, limit: i64) -> Result<Vec<StoredEmail>> {
    let emails = sqlx::query_as::<_, StoredEmail>(
        r#"
        SELECT id, mailbox_id, recipient, sender_name, sender_email,
               subject, body, body_html, raw_headers, received_at
        FROM emails
        WHERE mailbox_id = ?
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(mailbox_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(emails)
}

/// List the newest emails delivered to an address.
pub async fn list_by_recipient(pool: &SqlitePool, recipient: &str, limit: i64) -> Result<Vec<StoredEmail>> {
    let emails = sqlx::query_as::<_, StoredEmail>(
        r#"
        SELECT id, mailbox_id, recipient, sender_name, sender_email,
               subject, body, body_html, raw_headers, received_at
        FROM emails
        WHERE recipient = ?
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(address::normalize(recipient))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(emails)
}

/// Count emails in a mailbox.
pub async fn count_messages(pool: &SqlitePool, mailbox_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM emails WHERE mailbox_id = ?
        "#,
    )
    .bind(mailbox_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Get an email by ID.
pub async fn get_message(pool: &SqlitePool, id: i64) -> Result<Option<StoredEmail>> {
    let email = sqlx::query_as::<_, StoredEmail>(
        r#"
        SELECT id, mailbox_id, recipient, sender_name, sender_email,
               subject, body, body_html, raw_headers, received_at
        FROM emails
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(email)
}

/// Delete emails received more than `max_age` ago.
pub async fn delete_older_than(pool: &SqlitePool, max_age: Duration) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM emails
        WHERE received_at < datetime('now', ?)
        "#,
    )
    .bind(crate::age_modifier(max_age))
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
