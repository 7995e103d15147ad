use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use warbler_types::{User, UserEditForm, UserSearchQuery};

use super::{
    log_out, message_cards, parse_id, require_user, user_cards, user_stats, with_cookies,
    ApiError, ApiResult, Page,
};
use crate::db::repositories::{
    AccountError, FollowRepository, LikeRepository, MessageRepository, ProfileUpdate,
    UserRepository,
};
use crate::flash::Flash;
use crate::forms::{validate_user_edit, FormErrors};
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Messages shown on a profile page
const PROFILE_MESSAGE_LIMIT: usize = 100;

fn load_user(state: &AppState, user_id: i64) -> ApiResult<User> {
    UserRepository::new(state.db.pool.clone())
        .get_by_id(user_id)?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", user_id)))
}

/// Profile header shared by the show/following/followers/likes pages
fn profile_page(
    template: &'static str,
    state: &AppState,
    user: &User,
    viewer: Option<&User>,
) -> ApiResult<Page> {
    let followed_by_me = match viewer {
        Some(v) => FollowRepository::new(state.db.pool.clone()).is_following(v.id, user.id)?,
        None => false,
    };

    Ok(Page::new(template)
        .with("user", user)
        .with("stats", &user_stats(state, user.id)?)
        .with("followed_by_me", &followed_by_me))
}

/// GET /users?q= - List users, optionally filtered by username
pub async fn list_users(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    headers: HeaderMap,
    Query(query): Query<UserSearchQuery>,
) -> ApiResult<Response> {
    let search = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let users = UserRepository::new(state.db.pool.clone()).list(search)?;
    let cards = user_cards(&state, users, current_user.as_ref())?;

    Page::new("users/index.html")
        .with("users", &cards)
        .with("search", &search)
        .render(&state, &headers, &current_user)
}

/// GET /users/:id - Profile with the user's messages
pub async fn show_user(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> ApiResult<Response> {
    let user_id = parse_id(&raw_id)?;
    let user = load_user(&state, user_id)?;
    let messages =
        MessageRepository::new(state.db.pool.clone()).list_by_user(user.id, PROFILE_MESSAGE_LIMIT)?;
    let cards = message_cards(&state, messages, current_user.as_ref())?;

    profile_page("users/show.html", &state, &user, current_user.as_ref())?
        .with("messages", &cards)
        .render(&state, &headers, &current_user)
}

/// GET /users/:id/following - Users this user follows
pub async fn show_following(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> ApiResult<Response> {
    let user_id = parse_id(&raw_id)?;
    let viewer = require_user(&current_user)?;
    let user = load_user(&state, user_id)?;
    let following = FollowRepository::new(state.db.pool.clone()).following(user.id)?;
    let cards = user_cards(&state, following, Some(viewer))?;

    profile_page("users/following.html", &state, &user, Some(viewer))?
        .with("users", &cards)
        .render(&state, &headers, &current_user)
}

/// GET /users/:id/followers - Users following this user
pub async fn show_followers(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> ApiResult<Response> {
    let user_id = parse_id(&raw_id)?;
    let viewer = require_user(&current_user)?;
    let user = load_user(&state, user_id)?;
    let followers = FollowRepository::new(state.db.pool.clone()).followers(user.id)?;
    let cards = user_cards(&state, followers, Some(viewer))?;

    profile_page("users/followers.html", &state, &user, Some(viewer))?
        .with("users", &cards)
        .render(&state, &headers, &current_user)
}

/// GET /users/:id/likes - Messages this user likes
pub async fn show_likes(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> ApiResult<Response> {
    let user_id = parse_id(&raw_id)?;
    let viewer = require_user(&current_user)?;
    let user = load_user(&state, user_id)?;
    let liked = LikeRepository::new(state.db.pool.clone()).liked_messages(user.id)?;
    let cards = message_cards(&state, liked, Some(viewer))?;

    profile_page("users/likes.html", &state, &user, Some(viewer))?
        .with("messages", &cards)
        .render(&state, &headers, &current_user)
}

/// POST /users/follow/:id
pub async fn follow(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> ApiResult<Redirect> {
    let followed_id = parse_id(&raw_id)?;
    let viewer = require_user(&current_user)?;
    let followed = load_user(&state, followed_id)?;

    if followed.id == viewer.id {
        return Err(ApiError::BadRequest("You cannot follow yourself".to_string()));
    }

    FollowRepository::new(state.db.pool.clone()).follow(viewer.id, followed.id)?;
    tracing::debug!("User {} followed {}", viewer.id, followed.id);

    Ok(Redirect::to(&format!("/users/{}/following", viewer.id)))
}

/// POST /users/stop-following/:id
pub async fn stop_following(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> ApiResult<Redirect> {
    let followed_id = parse_id(&raw_id)?;
    let viewer = require_user(&current_user)?;
    let followed = load_user(&state, followed_id)?;

    FollowRepository::new(state.db.pool.clone()).unfollow(viewer.id, followed.id)?;

    Ok(Redirect::to(&format!("/users/{}/following", viewer.id)))
}

fn edit_page(form: &UserEditForm, errors: &FormErrors) -> Page {
    Page::new("users/edit.html")
        .with("form", form)
        .with("errors", errors)
}

/// GET /users/profile - Edit form prefilled with the current profile
pub async fn edit_profile_form(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let user = require_user(&current_user)?;
    let form = UserEditForm {
        username: user.username.clone(),
        email: user.email.clone(),
        image_url: Some(user.image_url.clone()),
        header_image_url: Some(user.header_image_url.clone()),
        bio: user.bio.clone(),
        location: user.location.clone(),
        password: String::new(),
    };

    edit_page(&form, &FormErrors::default()).render(&state, &headers, &current_user)
}

/// POST /users/profile - Update the profile after checking the password
pub async fn edit_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    headers: HeaderMap,
    Form(form): Form<UserEditForm>,
) -> ApiResult<Response> {
    let user = require_user(&current_user)?;

    if let Err(errors) = validate_user_edit(&form) {
        return edit_page(&form, &errors).render(&state, &headers, &current_user);
    }

    let repo = UserRepository::new(state.db.pool.clone());
    if repo.authenticate(&user.username, &form.password)?.is_none() {
        return edit_page(&form, &FormErrors::default())
            .flash(Flash::danger("Wrong password, please try again."))
            .render(&state, &headers, &current_user);
    }

    let update = ProfileUpdate {
        username: form.username.trim(),
        email: form.email.trim(),
        image_url: form.image_url.as_deref(),
        header_image_url: form.header_image_url.as_deref(),
        bio: form.bio.as_deref(),
        location: form.location.as_deref(),
    };

    match repo.update_profile(user.id, &update) {
        Ok(updated) => {
            tracing::info!("User {} updated their profile", updated.id);
            Ok(Redirect::to(&format!("/users/{}", updated.id)).into_response())
        }
        Err(AccountError::AlreadyTaken) => edit_page(&form, &FormErrors::default())
            .flash(Flash::danger(AccountError::AlreadyTaken.to_string()))
            .render(&state, &headers, &current_user),
        Err(AccountError::Database(e)) => Err(e.into()),
    }
}

/// POST /users/delete - Log out and remove the account with everything it owns
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let user = require_user(&current_user)?;

    let cleared = log_out(&state, &headers)?;
    state.session_manager.delete_sessions_for_user(user.id)?;
    UserRepository::new(state.db.pool.clone()).delete(user.id)?;
    tracing::info!("Deleted user {}", user.id);

    Ok(with_cookies(vec![cleared], Redirect::to("/signup")))
}

/// POST /users/add_like/:id - Like a message, or unlike it when already liked
pub async fn add_like(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> ApiResult<Redirect> {
    let message_id = parse_id(&raw_id)?;
    let user = require_user(&current_user)?;
    let message = MessageRepository::new(state.db.pool.clone())
        .get_by_id(message_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Message {} not found", message_id)))?;

    if message.user_id == user.id {
        return Err(ApiError::Forbidden("You cannot like your own message".to_string()));
    }

    let outcome = LikeRepository::new(state.db.pool.clone()).toggle(user.id, message.id)?;
    tracing::debug!("User {} {:?} message {}", user.id, outcome, message.id);

    Ok(Redirect::to("/"))
}
