use crate::db::{format_timestamp, Database};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Session key (cookie name) that carries the authenticated user's session
pub const CURR_USER_KEY: &str = "curr_user";

/// Default lifetime of a login session
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 30;

/// Database-backed session manager for persistent authentication
///
/// Manages user sessions with token-based authentication, including:
/// - Session creation with UUID v4 tokens
/// - Session validation with expiry checking
/// - Session deletion (logout)
/// - Automatic cleanup of expired sessions
#[derive(Clone)]
pub struct SessionManager {
    db: Database,
    ttl: Duration,
}

impl SessionManager {
    /// Create a new session manager with the default lifetime
    pub fn new(db: Database) -> Self {
        Self::with_ttl(db, Duration::days(DEFAULT_SESSION_TTL_DAYS))
    }

    pub fn with_ttl(db: Database, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    /// Create a new session for a user
    ///
    /// Generates a UUID v4 token and stores it in the database with the configured expiry.
    ///
    /// # Arguments
    /// * `user_id` - The id of the user to create a session for
    ///
    /// # Returns
    /// * `Result<String>` - The session token on success
    pub fn create_session(&self, user_id: i64) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at + self.ttl;

        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                token,
                user_id,
                format_timestamp(&created_at),
                format_timestamp(&expires_at),
            ],
        )
        .context("Failed to create session")?;

        tracing::info!("Created session for user {}", user_id);
        Ok(token)
    }

    /// Validate a session token and return the associated user ID
    ///
    /// Checks if the token exists in the database and has not expired.
    ///
    /// # Returns
    /// * `Result<i64>` - The user ID if the session is valid
    /// * `Err` - If the session is invalid or expired
    pub fn validate_session(&self, token: &str) -> Result<i64> {
        let conn = self.db.connection()?;

        let (user_id, expires_at_str): (i64, String) = conn
            .query_row(
                "SELECT user_id, expires_at FROM sessions WHERE token = ?1",
                rusqlite::params![token],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .context("Session not found")?;
        drop(conn);

        let expires_at = DateTime::parse_from_rfc3339(&expires_at_str)
            .context("Failed to parse expiry time")?
            .with_timezone(&Utc);

        if Utc::now() > expires_at {
            // Clean up expired session
            self.delete_session(token)?;
            anyhow::bail!("Session has expired");
        }

        Ok(user_id)
    }

    /// Delete a session (logout)
    pub fn delete_session(&self, token: &str) -> Result<()> {
        let conn = self.db.connection()?;
        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE token = ?1",
                rusqlite::params![token],
            )
            .context("Failed to delete session")?;

        if rows_affected > 0 {
            tracing::info!("Deleted session");
        }

        Ok(())
    }

    /// Delete every session belonging to a user
    pub fn delete_sessions_for_user(&self, user_id: i64) -> Result<usize> {
        let conn = self.db.connection()?;
        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE user_id = ?1",
                rusqlite::params![user_id],
            )
            .context("Failed to delete user sessions")?;
        Ok(rows_affected)
    }

    /// Clean up expired sessions from the database
    ///
    /// Removes all sessions that have passed their expiry time.
    ///
    /// # Returns
    /// * `Result<usize>` - The number of sessions deleted
    pub fn cleanup_expired_sessions(&self) -> Result<usize> {
        let conn = self.db.connection()?;
        let now = format_timestamp(&Utc::now());

        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE expires_at < ?1",
                rusqlite::params![now],
            )
            .context("Failed to cleanup expired sessions")?;

        if rows_affected > 0 {
            tracing::info!("Cleaned up {} expired sessions", rows_affected);
        }

        Ok(rows_affected)
    }
}
