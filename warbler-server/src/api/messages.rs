use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use warbler_types::MessageForm;

use super::{parse_id, require_user, ApiError, ApiResult, MessageCard, Page};
use crate::db::repositories::{LikeRepository, MessageRepository};
use crate::forms::{validate_message, FormErrors};
use crate::middleware::CurrentUser;
use crate::state::AppState;

fn new_message_page(form: &MessageForm, errors: &FormErrors) -> Page {
    Page::new("messages/new.html")
        .with("form", form)
        .with("errors", errors)
}

/// GET /messages/new
pub async fn new_message_form(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    require_user(&current_user)?;
    new_message_page(&MessageForm::default(), &FormErrors::default())
        .render(&state, &headers, &current_user)
}

/// POST /messages/new - Post a message, then show the author's profile
pub async fn create_message(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    headers: HeaderMap,
    Form(form): Form<MessageForm>,
) -> ApiResult<Response> {
    let user = require_user(&current_user)?;

    if let Err(errors) = validate_message(&form) {
        return new_message_page(&form, &errors).render(&state, &headers, &current_user);
    }

    let message = MessageRepository::new(state.db.pool.clone()).create(user.id, form.text.trim())?;
    tracing::debug!("User {} posted message {}", user.id, message.id);

    Ok(Redirect::to(&format!("/users/{}", user.id)).into_response())
}

/// GET /messages/:id
pub async fn show_message(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> ApiResult<Response> {
    let message_id = parse_id(&raw_id)?;
    let message = MessageRepository::new(state.db.pool.clone())
        .get_by_id(message_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Message {} not found", message_id)))?;

    let liked = match &current_user {
        Some(user) => LikeRepository::new(state.db.pool.clone()).is_liked(user.id, message.id)?,
        None => false,
    };

    Page::new("messages/show.html")
        .with("message", &MessageCard::new(message, liked))
        .render(&state, &headers, &current_user)
}

/// POST /messages/:id/delete - Only the author may delete a message
pub async fn delete_message(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> ApiResult<Redirect> {
    let message_id = parse_id(&raw_id)?;
    let user = require_user(&current_user)?;
    let repo = MessageRepository::new(state.db.pool.clone());

    let message = repo
        .get_by_id(message_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Message {} not found", message_id)))?;

    if message.user_id != user.id {
        return Err(ApiError::Unauthorized(format!(
            "User {} tried to delete message {} owned by {}",
            user.id, message.id, message.user_id
        )));
    }

    repo.delete(message.id)?;
    tracing::debug!("User {} deleted message {}", user.id, message.id);

    Ok(Redirect::to(&format!("/users/{}", user.id)))
}
