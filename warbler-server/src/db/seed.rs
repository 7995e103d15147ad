use anyhow::{Context, Result};
use chrono::{Duration, TimeZone, Utc};

use crate::db::repositories::{FollowRepository, LikeRepository, MessageRepository, UserRepository};
use crate::db::Database;

/// Password shared by every demo account
pub const DEMO_PASSWORD: &str = "password";

/// Demo users: (username, email, bio, location)
const DEMO_USERS: [(&str, &str, &str, &str); 5] = [
    ("alice", "alice@warbler.test", "Birdwatcher and early riser", "Portland"),
    ("bob", "bob@warbler.test", "I warble about databases", "Denver"),
    ("charlie", "charlie@warbler.test", "Coffee first, then code", "Austin"),
    ("diana", "diana@warbler.test", "Open source maintainer", "Boston"),
    ("eve", "eve@warbler.test", "Security researcher", "Seattle"),
];

/// Demo messages: (author index, text)
const DEMO_MESSAGES: [(usize, &str); 10] = [
    (0, "Spotted a pair of warblers by the lake this morning."),
    (0, "Hot take: the best time to ship is before lunch."),
    (1, "Indexes are love letters to your future self."),
    (1, "Just migrated everything to SQLite. No regrets."),
    (2, "Third espresso. The bug is still there."),
    (2, "Pair programming with my cat again."),
    (3, "New release is out! Thanks to all the contributors."),
    (3, "Reviewing pull requests on a Sunday, as one does."),
    (4, "Reminder: rotate your credentials."),
    (4, "Found a fun edge case in a cookie parser today."),
];

/// Demo follows: (follower index, followed index)
const DEMO_FOLLOWS: [(usize, usize); 7] = [(0, 1), (0, 2), (1, 0), (2, 0), (2, 3), (3, 4), (4, 0)];

/// Demo likes: (user index, message index)
const DEMO_LIKES: [(usize, usize); 6] = [(1, 0), (2, 0), (0, 2), (3, 5), (4, 6), (0, 8)];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub messages: usize,
    pub follows: usize,
    pub likes: usize,
}

/// Fill an empty database with a small social graph.
///
/// Does nothing when users already exist.
pub fn seed_demo_data(db: &Database) -> Result<SeedSummary> {
    let users = UserRepository::new(db.pool.clone());
    if users.count()? > 0 {
        tracing::info!("Database already has users; skipping demo seed");
        return Ok(SeedSummary::default());
    }

    let messages = MessageRepository::new(db.pool.clone());
    let follows = FollowRepository::new(db.pool.clone());
    let likes = LikeRepository::new(db.pool.clone());

    let mut user_ids = Vec::with_capacity(DEMO_USERS.len());
    for (username, email, bio, location) in DEMO_USERS {
        let user = users
            .signup(username, email, DEMO_PASSWORD, None)
            .with_context(|| format!("Failed to seed user {}", username))?;
        users
            .update_profile(
                user.id,
                &crate::db::repositories::ProfileUpdate {
                    username,
                    email,
                    bio: Some(bio),
                    location: Some(location),
                    ..Default::default()
                },
            )
            .with_context(|| format!("Failed to seed profile for {}", username))?;
        user_ids.push(user.id);
    }

    let start = Utc
        .with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
        .single()
        .context("Invalid seed start time")?;
    let mut message_ids = Vec::with_capacity(DEMO_MESSAGES.len());
    for (i, (author, text)) in DEMO_MESSAGES.iter().enumerate() {
        let posted_at = start + Duration::hours(i as i64 * 7);
        let message = messages.create_at(user_ids[*author], text, posted_at)?;
        message_ids.push(message.id);
    }

    for (follower, followed) in DEMO_FOLLOWS {
        follows.follow(user_ids[follower], user_ids[followed])?;
    }

    for (user, message) in DEMO_LIKES {
        likes.toggle(user_ids[user], message_ids[message])?;
    }

    let summary = SeedSummary {
        users: user_ids.len(),
        messages: message_ids.len(),
        follows: DEMO_FOLLOWS.len(),
        likes: DEMO_LIKES.len(),
    };
    tracing::info!("Seeded demo data: {:?}", summary);
    Ok(summary)
}
