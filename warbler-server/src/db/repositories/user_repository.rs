use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use thiserror::Error;

use warbler_types::{User, DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL};

use crate::db::DbPool;
use crate::password::{hash_password, verify_password};

/// Column list matching [`map_user_row`]
pub(crate) const USER_COLUMNS: &str =
    "u.id, u.username, u.email, u.image_url, u.header_image_url, u.bio, u.location";

pub(crate) fn map_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        image_url: row.get(3)?,
        header_image_url: row.get(4)?,
        bio: row.get(5)?,
        location: row.get(6)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Treat blank optional form fields as absent
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Username or email already taken")]
    AlreadyTaken,
    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// Editable profile fields
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub image_url: Option<&'a str>,
    pub header_image_url: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub location: Option<&'a str>,
}

pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Register a new user with a hashed password.
    ///
    /// Rejects the signup when the username or email already belongs to someone.
    pub fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
        image_url: Option<&str>,
    ) -> Result<User, AccountError> {
        if self.is_taken(username, email, None)? {
            return Err(AccountError::AlreadyTaken);
        }

        let hashed = hash_password(password)?;
        let image_url = non_blank(image_url).unwrap_or(DEFAULT_IMAGE_URL);

        let conn = self.pool.get().context("Failed to get database connection")?;
        let inserted = conn.execute(
            "INSERT INTO users (username, email, password, image_url, header_image_url)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![username, email, hashed, image_url, DEFAULT_HEADER_IMAGE_URL],
        );

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Err(AccountError::AlreadyTaken),
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to create user").into()),
        }

        let id = conn.last_insert_rowid();
        tracing::info!("Registered user {} ({})", username, id);

        Ok(User {
            id,
            username: username.to_string(),
            email: email.to_string(),
            image_url: image_url.to_string(),
            header_image_url: DEFAULT_HEADER_IMAGE_URL.to_string(),
            bio: None,
            location: None,
        })
    }

    /// Find the user with this username and password
    ///
    /// Returns `None` for an unknown username or a wrong password.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let stored: Option<(i64, String)> = conn
            .query_row(
                "SELECT id, password FROM users WHERE username = ?",
                [username],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        drop(conn);

        let Some((id, hash)) = stored else {
            return Ok(None);
        };

        if !verify_password(password, &hash)? {
            return Ok(None);
        }

        self.get_by_id(id)
    }

    /// Whether a username or email is already used by someone other than `except_id`
    pub fn is_taken(&self, username: &str, email: &str, except_id: Option<i64>) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE (username = ?1 OR email = ?2) AND id IS NOT ?3",
            params![username, email, except_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get user by ID
    pub fn get_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM users u WHERE u.id = ?", USER_COLUMNS))?;
        let user = stmt.query_row([user_id], map_user_row).optional()?;
        Ok(user)
    }

    /// Get user by username
    pub fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM users u WHERE u.username = ?", USER_COLUMNS))?;
        let user = stmt.query_row([username], map_user_row).optional()?;
        Ok(user)
    }

    /// List users ordered by username, optionally narrowed to usernames containing `search`
    pub fn list(&self, search: Option<&str>) -> Result<Vec<User>> {
        let conn = self.pool.get()?;
        let users = match non_blank(search) {
            Some(term) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM users u
                     WHERE instr(lower(u.username), lower(?1)) > 0
                     ORDER BY u.username",
                    USER_COLUMNS
                ))?;
                let rows = stmt.query_map([term], map_user_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM users u ORDER BY u.username",
                    USER_COLUMNS
                ))?;
                let rows = stmt.query_map([], map_user_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(users)
    }

    /// Update profile fields. Blank image fields fall back to the defaults.
    pub fn update_profile(
        &self,
        user_id: i64,
        update: &ProfileUpdate,
    ) -> Result<User, AccountError> {
        if self.is_taken(update.username, update.email, Some(user_id))? {
            return Err(AccountError::AlreadyTaken);
        }

        let conn = self.pool.get().context("Failed to get database connection")?;
        let updated = conn.execute(
            "UPDATE users
             SET username = ?1, email = ?2, image_url = ?3, header_image_url = ?4,
                 bio = ?5, location = ?6
             WHERE id = ?7",
            params![
                update.username,
                update.email,
                non_blank(update.image_url).unwrap_or(DEFAULT_IMAGE_URL),
                non_blank(update.header_image_url).unwrap_or(DEFAULT_HEADER_IMAGE_URL),
                non_blank(update.bio),
                non_blank(update.location),
                user_id,
            ],
        );
        drop(conn);

        match updated {
            Ok(0) => Err(anyhow::anyhow!("User {} not found", user_id).into()),
            Ok(_) => self
                .get_by_id(user_id)?
                .ok_or_else(|| anyhow::anyhow!("User {} vanished during update", user_id).into()),
            Err(e) if is_unique_violation(&e) => Err(AccountError::AlreadyTaken),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to update user").into()),
        }
    }

    /// Delete a user; messages, follows, likes and sessions go with it
    pub fn delete(&self, user_id: i64) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows_affected = conn
            .execute("DELETE FROM users WHERE id = ?", [user_id])
            .context("Failed to delete user")?;
        Ok(rows_affected)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
