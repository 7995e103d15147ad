use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
    Extension,
};

use super::{message_cards, user_stats, ApiResult, Page};
use crate::db::repositories::MessageRepository;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Messages shown on the home timeline
pub const TIMELINE_LIMIT: usize = 100;

/// GET / - Landing page, or the timeline of the logged-in user and who they follow
pub async fn homepage(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let Some(user) = &current_user else {
        return Page::new("home-anon.html").render(&state, &headers, &current_user);
    };

    let messages = MessageRepository::new(state.db.pool.clone()).timeline(user.id, TIMELINE_LIMIT)?;
    let cards = message_cards(&state, messages, Some(user))?;

    Page::new("home.html")
        .with("messages", &cards)
        .with("stats", &user_stats(&state, user.id)?)
        .render(&state, &headers, &current_user)
}

/// Fallback for unknown routes
pub async fn not_found(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    Page::new("404.html")
        .status(StatusCode::NOT_FOUND)
        .render(&state, &headers, &current_user)
}
