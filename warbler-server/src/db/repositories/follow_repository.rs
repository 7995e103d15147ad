use anyhow::{Context, Result};
use rusqlite::params;

use warbler_types::User;

use crate::db::repositories::user_repository::{map_user_row, USER_COLUMNS};
use crate::db::DbPool;

pub struct FollowRepository {
    pool: DbPool,
}

impl FollowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Check if `follower_id` is following `followed_id`
    pub fn is_following(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows
             WHERE user_following_id = ?1 AND user_being_followed_id = ?2",
            params![follower_id, followed_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Follow a user. Following twice is a no-op.
    pub fn follow(&self, follower_id: i64, followed_id: i64) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT OR IGNORE INTO follows (user_being_followed_id, user_following_id)
             VALUES (?1, ?2)",
            params![followed_id, follower_id],
        )
        .context("Failed to follow user")?;
        Ok(())
    }

    /// Unfollow a user
    pub fn unfollow(&self, follower_id: i64, followed_id: i64) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows_affected = conn
            .execute(
                "DELETE FROM follows WHERE user_following_id = ?1 AND user_being_followed_id = ?2",
                params![follower_id, followed_id],
            )
            .context("Failed to unfollow user")?;
        Ok(rows_affected)
    }

    /// Users who follow `user_id`
    pub fn followers(&self, user_id: i64) -> Result<Vec<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM follows f
             JOIN users u ON u.id = f.user_following_id
             WHERE f.user_being_followed_id = ?
             ORDER BY u.username",
            USER_COLUMNS
        ))?;

        let followers = stmt
            .query_map([user_id], map_user_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(followers)
    }

    /// Users that `user_id` follows
    pub fn following(&self, user_id: i64) -> Result<Vec<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM follows f
             JOIN users u ON u.id = f.user_being_followed_id
             WHERE f.user_following_id = ?
             ORDER BY u.username",
            USER_COLUMNS
        ))?;

        let following = stmt
            .query_map([user_id], map_user_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(following)
    }

    /// Get follower count
    pub fn follower_count(&self, user_id: i64) -> Result<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE user_being_followed_id = ?",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Get following count
    pub fn following_count(&self, user_id: i64) -> Result<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE user_following_id = ?",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::UserRepository;
    use crate::db::Database;

    fn setup_test_db() -> (Database, FollowRepository, [i64; 3]) {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize database");
        let users = UserRepository::new(db.pool.clone());
        let ids = [
            users.signup("test1", "test1@gmail.com", "password1", None).unwrap().id,
            users.signup("test2", "test2@gmail.com", "password2", None).unwrap().id,
            users.signup("test3", "test3@gmail.com", "password3", None).unwrap().id,
        ];
        let repo = FollowRepository::new(db.pool.clone());
        (db, repo, ids)
    }

    #[test]
    fn test_followers_and_following_are_directed() {
        let (_db, repo, [u1, u2, u3]) = setup_test_db();

        // u2 follows u1 and u3
        repo.follow(u2, u1).unwrap();
        repo.follow(u2, u3).unwrap();

        assert_eq!(repo.following(u2).unwrap().len(), 2);
        assert_eq!(repo.followers(u2).unwrap().len(), 0);
        assert_eq!(repo.following_count(u2).unwrap(), 2);
        assert_eq!(repo.follower_count(u2).unwrap(), 0);

        let u1_followers = repo.followers(u1).unwrap();
        assert_eq!(u1_followers.len(), 1);
        assert_eq!(u1_followers[0].username, "test2");
        assert_eq!(repo.follower_count(u3).unwrap(), 1);

        assert!(repo.is_following(u2, u1).unwrap());
        assert!(!repo.is_following(u1, u2).unwrap());
    }

    #[test]
    fn test_follow_is_idempotent() {
        let (_db, repo, [u1, u2, _]) = setup_test_db();
        repo.follow(u1, u2).unwrap();
        repo.follow(u1, u2).unwrap();
        assert_eq!(repo.follower_count(u2).unwrap(), 1);
        assert_eq!(repo.following_count(u1).unwrap(), 1);
    }

    #[test]
    fn test_unfollow() {
        let (_db, repo, [u1, u2, _]) = setup_test_db();
        repo.follow(u1, u2).unwrap();
        assert_eq!(repo.unfollow(u1, u2).unwrap(), 1);
        assert_eq!(repo.unfollow(u1, u2).unwrap(), 0);
        assert!(!repo.is_following(u1, u2).unwrap());
    }
}
