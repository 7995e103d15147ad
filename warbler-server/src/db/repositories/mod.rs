mod follow_repository;
mod like_repository;
mod message_repository;
mod user_repository;

pub use follow_repository::FollowRepository;
pub use like_repository::LikeRepository;
pub use message_repository::{validate_text, MessageRepository};
pub use user_repository::{AccountError, ProfileUpdate, UserRepository};
