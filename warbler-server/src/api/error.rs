use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use once_cell::sync::Lazy;
use warbler_types::User;

use crate::flash::{redirect_with_flash, Flash};
use crate::templates::load_templates;

pub type ApiResult<T> = Result<T, ApiError>;

/// Flash shown when a page needs a login or belongs to someone else
pub const ACCESS_UNAUTHORIZED: &str = "Access unauthorized.";

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    /// Redirects home with an "Access unauthorized." flash
    Unauthorized(String),
    Forbidden(String),
    InternalError(String),
}

// Rendered once; shown to every visitor as if logged out
static NOT_FOUND_PAGE: Lazy<String> = Lazy::new(|| {
    let mut context = tera::Context::new();
    context.insert("current_user", &Option::<User>::None);
    context.insert("flashes", &Vec::<Flash>::new());

    load_templates()
        .and_then(|tera| Ok(tera.render("404.html", &context)?))
        .unwrap_or_else(|e| {
            tracing::error!("Failed to render 404 page: {}", e);
            "<h1>404</h1>".to_string()
        })
});

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(msg) => {
                tracing::debug!("Not found: {}", msg);
                (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE.as_str())).into_response()
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::Unauthorized(msg) => {
                tracing::debug!("Unauthorized: {}", msg);
                redirect_with_flash("/", Flash::danger(ACCESS_UNAUTHORIZED))
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg).into_response(),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred",
                )
                    .into_response()
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(format!("{:#}", err))
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<tera::Error> for ApiError {
    fn from(err: tera::Error) -> Self {
        ApiError::InternalError(format!("Template error: {:?}", err))
    }
}
