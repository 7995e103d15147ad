use anyhow::{Context, Result};
use rusqlite::params;

use warbler_types::{Like, LikeToggle, Message};

use crate::db::repositories::message_repository::{map_message_row, MESSAGE_SELECT};
use crate::db::DbPool;

pub struct LikeRepository {
    pool: DbPool,
}

impl LikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Like the message, or remove the like if it already exists
    pub fn toggle(&self, user_id: i64, message_id: i64) -> Result<LikeToggle> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let removed = tx
            .execute(
                "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
                params![user_id, message_id],
            )
            .context("Failed to remove like")?;

        let outcome = if removed > 0 {
            LikeToggle::Unliked
        } else {
            tx.execute(
                "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)",
                params![user_id, message_id],
            )
            .context("Failed to like message")?;
            LikeToggle::Liked
        };

        tx.commit().context("Failed to commit like toggle")?;
        Ok(outcome)
    }

    pub fn is_liked(&self, user_id: i64, message_id: i64) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE user_id = ?1 AND message_id = ?2",
            params![user_id, message_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// IDs of every message the user likes
    pub fn liked_message_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT message_id FROM likes WHERE user_id = ?")?;
        let ids = stmt
            .query_map([user_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Messages the user likes, newest first
    pub fn liked_messages(&self, user_id: i64) -> Result<Vec<Message>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} JOIN likes l ON l.message_id = m.id
             WHERE l.user_id = ?
             ORDER BY m.timestamp DESC, m.id DESC",
            MESSAGE_SELECT
        ))?;

        let messages = stmt
            .query_map([user_id], map_message_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    /// Like rows recorded against a message
    pub fn likes_for_message(&self, message_id: i64) -> Result<Vec<Like>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, message_id FROM likes WHERE message_id = ? ORDER BY id",
        )?;

        let likes = stmt
            .query_map([message_id], |row| {
                Ok(Like {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    message_id: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(likes)
    }

    pub fn count_by_user(&self, user_id: i64) -> Result<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE user_id = ?",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
