/// SQL schema for the Warbler database
/// Creates all tables with proper constraints, foreign keys, and indexes
pub const SCHEMA: &str = r#"
-- Users table
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT UNIQUE NOT NULL,
    username TEXT UNIQUE NOT NULL,
    image_url TEXT NOT NULL DEFAULT '/static/images/default-pic.svg',
    header_image_url TEXT NOT NULL DEFAULT '/static/images/warbler-hero.svg',
    bio TEXT,
    location TEXT,
    password TEXT NOT NULL
);

-- Messages table
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL CHECK(length(text) <= 140),
    timestamp TEXT NOT NULL,
    user_id INTEGER NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

-- Create indexes for profile pages and the home timeline
CREATE INDEX IF NOT EXISTS idx_messages_user_id ON messages(user_id);
CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages(timestamp DESC);

-- Follows table (directed: user_following_id follows user_being_followed_id)
CREATE TABLE IF NOT EXISTS follows (
    user_being_followed_id INTEGER NOT NULL,
    user_following_id INTEGER NOT NULL,
    PRIMARY KEY (user_being_followed_id, user_following_id),
    FOREIGN KEY (user_being_followed_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (user_following_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_follows_following ON follows(user_following_id);

-- Likes table
CREATE TABLE IF NOT EXISTS likes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    message_id INTEGER NOT NULL,
    UNIQUE (user_id, message_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (message_id) REFERENCES messages(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_likes_message_id ON likes(message_id);

-- Sessions table (value of the CURR_USER_KEY cookie)
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
"#;

/// Tables in dependency order, children first
pub const TABLES: [&str; 5] = ["sessions", "likes", "follows", "messages", "users"];
