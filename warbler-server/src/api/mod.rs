pub mod auth;
pub mod error;
pub mod home;
pub mod messages;
pub mod users;

pub use error::{ApiError, ApiResult, ACCESS_UNAUTHORIZED};

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use serde::Serialize;
use std::collections::HashSet;
use warbler_types::{Message, User, UserStats};

use crate::cookie::{clear_cookie, get_cookie, set_cookie};
use crate::db::repositories::{FollowRepository, LikeRepository, MessageRepository};
use crate::flash::{consumed_flash_cookie, pending_flashes, Flash};
use crate::session::CURR_USER_KEY;
use crate::state::AppState;

/// Parse an `:id` path segment; anything non-numeric is a missing page
pub fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::NotFound(format!("No page for id '{}'", raw)))
}

/// A message as listed on a page
#[derive(Debug, Serialize)]
pub struct MessageCard {
    #[serde(flatten)]
    pub message: Message,
    pub display_date: String,
    /// Whether the viewer likes this message
    pub liked: bool,
}

impl MessageCard {
    pub fn new(message: Message, liked: bool) -> Self {
        Self {
            display_date: message.display_date(),
            message,
            liked,
        }
    }
}

/// A user as listed on a page
#[derive(Debug, Serialize)]
pub struct UserCard {
    #[serde(flatten)]
    pub user: User,
    /// Whether the viewer follows this user
    pub followed_by_me: bool,
}

/// A template plus the values it needs
///
/// Rendering adds `current_user` and the flashes, then clears the flash cookie
/// when the request carried one.
pub struct Page {
    template: &'static str,
    context: tera::Context,
    flashes: Vec<Flash>,
    status: StatusCode,
}

impl Page {
    pub fn new(template: &'static str) -> Self {
        Self {
            template,
            context: tera::Context::new(),
            flashes: Vec::new(),
            status: StatusCode::OK,
        }
    }

    pub fn with<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        self.context.insert(key, value);
        self
    }

    /// Show a message on this page without a redirect
    pub fn flash(mut self, flash: Flash) -> Self {
        self.flashes.push(flash);
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn render(
        mut self,
        state: &AppState,
        headers: &HeaderMap,
        current_user: &Option<User>,
    ) -> ApiResult<Response> {
        let mut flashes = pending_flashes(headers);
        let consumed = !flashes.is_empty();
        flashes.append(&mut self.flashes);

        self.context.insert("current_user", current_user);
        self.context.insert("flashes", &flashes);

        let html = state.templates.render(self.template, &self.context)?;

        let mut response = (self.status, Html(html)).into_response();
        if consumed {
            response
                .headers_mut()
                .append(header::SET_COOKIE, consumed_flash_cookie());
        }
        Ok(response)
    }
}

/// The logged-in user, or [`ApiError::Unauthorized`]
pub fn require_user(current_user: &Option<User>) -> ApiResult<&User> {
    current_user
        .as_ref()
        .ok_or_else(|| ApiError::Unauthorized("Login required".to_string()))
}

/// Start a session for `user_id`; returns the `Set-Cookie` value carrying it
pub fn log_in(state: &AppState, user_id: i64) -> ApiResult<HeaderValue> {
    let token = state.session_manager.create_session(user_id)?;
    set_cookie(CURR_USER_KEY, &token)
        .ok_or_else(|| ApiError::InternalError("Session token is not a valid cookie".to_string()))
}

/// End the request's session, if any; returns the `Set-Cookie` value clearing it
pub fn log_out(state: &AppState, headers: &HeaderMap) -> ApiResult<HeaderValue> {
    if let Some(token) = get_cookie(headers, CURR_USER_KEY) {
        state.session_manager.delete_session(&token)?;
    }
    Ok(clear_cookie(CURR_USER_KEY))
}

/// Redirect response that also sets cookies
pub fn with_cookies(cookies: Vec<HeaderValue>, response: impl IntoResponse) -> Response {
    let headers: Vec<_> = cookies
        .into_iter()
        .map(|cookie| (header::SET_COOKIE, cookie))
        .collect();
    (AppendHeaders(headers), response).into_response()
}

/// Ids of the messages the viewer likes
pub fn liked_ids(state: &AppState, viewer: Option<&User>) -> ApiResult<HashSet<i64>> {
    match viewer {
        Some(user) => Ok(LikeRepository::new(state.db.pool.clone())
            .liked_message_ids(user.id)?
            .into_iter()
            .collect()),
        None => Ok(HashSet::new()),
    }
}

pub fn message_cards(
    state: &AppState,
    messages: Vec<Message>,
    viewer: Option<&User>,
) -> ApiResult<Vec<MessageCard>> {
    let liked = liked_ids(state, viewer)?;
    Ok(messages
        .into_iter()
        .map(|message| {
            let is_liked = liked.contains(&message.id);
            MessageCard::new(message, is_liked)
        })
        .collect())
}

pub fn user_cards(
    state: &AppState,
    users: Vec<User>,
    viewer: Option<&User>,
) -> ApiResult<Vec<UserCard>> {
    let followed: HashSet<i64> = match viewer {
        Some(user) => FollowRepository::new(state.db.pool.clone())
            .following(user.id)?
            .into_iter()
            .map(|u| u.id)
            .collect(),
        None => HashSet::new(),
    };

    Ok(users
        .into_iter()
        .map(|user| UserCard {
            followed_by_me: followed.contains(&user.id),
            user,
        })
        .collect())
}

/// Counters shown beside a profile
pub fn user_stats(state: &AppState, user_id: i64) -> ApiResult<UserStats> {
    let follows = FollowRepository::new(state.db.pool.clone());
    Ok(UserStats {
        messages: MessageRepository::new(state.db.pool.clone()).count_by_user(user_id)?,
        following: follows.following_count(user_id)?,
        followers: follows.follower_count(user_id)?,
        likes: LikeRepository::new(state.db.pool.clone()).count_by_user(user_id)?,
    })
}
