use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, OptionalExtension, Row};

use warbler_types::{Message, MAX_MESSAGE_LENGTH};

use crate::db::{format_timestamp, DbPool};

/// Select list matching [`map_message_row`]
pub(crate) const MESSAGE_SELECT: &str =
    "SELECT m.id, m.text, m.timestamp, m.user_id, u.username, u.image_url
     FROM messages m
     JOIN users u ON m.user_id = u.id";

pub(crate) fn map_message_row(row: &Row) -> rusqlite::Result<Message> {
    let timestamp: String = row.get(2)?;
    Ok(Message {
        id: row.get(0)?,
        text: row.get(1)?,
        timestamp: timestamp
            .parse::<DateTime<Utc>>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
        user_id: row.get(3)?,
        author_username: row.get(4)?,
        author_image_url: row.get(5)?,
    })
}

/// Reject empty or over-long message bodies
pub fn validate_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        anyhow::bail!("Message text is required");
    }
    let length = text.chars().count();
    if length > MAX_MESSAGE_LENGTH {
        anyhow::bail!(
            "Message is {} characters long; the limit is {}",
            length,
            MAX_MESSAGE_LENGTH
        );
    }
    Ok(())
}

pub struct MessageRepository {
    pool: DbPool,
}

impl MessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a message stamped with the current time
    pub fn create(&self, user_id: i64, text: &str) -> Result<Message> {
        self.create_at(user_id, text, Utc::now())
    }

    /// Create a message with an explicit timestamp (seeding and imports)
    pub fn create_at(&self, user_id: i64, text: &str, timestamp: DateTime<Utc>) -> Result<Message> {
        validate_text(text)?;

        let message_id = {
            let conn = self.pool.get()?;
            let user_exists: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE id = ?",
                [user_id],
                |row| row.get(0),
            )?;
            if user_exists == 0 {
                anyhow::bail!("Cannot create message: user {} does not exist", user_id);
            }

            conn.execute(
                "INSERT INTO messages (text, timestamp, user_id) VALUES (?1, ?2, ?3)",
                params![text, format_timestamp(&timestamp), user_id],
            )
            .context("Failed to create message")?;
            conn.last_insert_rowid()
        };

        tracing::debug!("User {} posted message {}", user_id, message_id);

        self.get_by_id(message_id)?
            .context("Message missing right after insert")
    }

    /// Get a single message by ID
    pub fn get_by_id(&self, message_id: i64) -> Result<Option<Message>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!("{} WHERE m.id = ?", MESSAGE_SELECT))?;
        let message = stmt.query_row([message_id], map_message_row).optional()?;
        Ok(message)
    }

    /// Most recent messages written by a user
    pub fn list_by_user(&self, user_id: i64, limit: usize) -> Result<Vec<Message>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE m.user_id = ?1 ORDER BY m.timestamp DESC, m.id DESC LIMIT ?2",
            MESSAGE_SELECT
        ))?;

        let messages = stmt
            .query_map(params![user_id, limit as i64], map_message_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    /// Home timeline: the user's own messages plus those of everyone they follow
    pub fn timeline(&self, user_id: i64, limit: usize) -> Result<Vec<Message>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE m.user_id = ?1
                OR m.user_id IN (
                    SELECT user_being_followed_id FROM follows WHERE user_following_id = ?1
                )
             ORDER BY m.timestamp DESC, m.id DESC
             LIMIT ?2",
            MESSAGE_SELECT
        ))?;

        let messages = stmt
            .query_map(params![user_id, limit as i64], map_message_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    /// Hard-delete a message, returning the number of rows removed
    pub fn delete(&self, message_id: i64) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows_affected = conn
            .execute("DELETE FROM messages WHERE id = ?", [message_id])
            .context("Failed to delete message")?;
        Ok(rows_affected)
    }

    /// Get message count for a user
    pub fn count_by_user(&self, user_id: i64) -> Result<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE user_id = ?",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
