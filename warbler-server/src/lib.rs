// Library exports for warbler-server
// The binary, the migrate tool and the integration tests all build on these modules

pub mod api;
pub mod config;
pub mod cookie;
pub mod db;
pub mod flash;
pub mod forms;
pub mod middleware;
pub mod password;
pub mod session;
pub mod state;
pub mod templates;

use axum::{
    http::{header, HeaderValue},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use state::AppState;

/// Sent with every response so pages always reflect the current session
pub const CACHE_CONTROL: &str = "no-cache, no-store, must-revalidate, public, max-age=0";

/// Directory served under `/static`
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::home::homepage))
        // Authentication routes
        .route("/signup", get(api::auth::signup_form).post(api::auth::signup))
        .route("/login", get(api::auth::login_form).post(api::auth::login))
        .route("/logout", get(api::auth::logout))
        // User routes
        .route("/users", get(api::users::list_users))
        .route(
            "/users/profile",
            get(api::users::edit_profile_form).post(api::users::edit_profile),
        )
        .route("/users/delete", post(api::users::delete_user))
        .route("/users/follow/:id", post(api::users::follow))
        .route("/users/stop-following/:id", post(api::users::stop_following))
        .route("/users/add_like/:id", post(api::users::add_like))
        .route("/users/:id", get(api::users::show_user))
        .route("/users/:id/following", get(api::users::show_following))
        .route("/users/:id/followers", get(api::users::show_followers))
        .route("/users/:id/likes", get(api::users::show_likes))
        // Message routes
        .route(
            "/messages/new",
            get(api::messages::new_message_form).post(api::messages::create_message),
        )
        .route("/messages/:id", get(api::messages::show_message))
        .route("/messages/:id/delete", post(api::messages::delete_message))
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .fallback(api::home::not_found)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::load_current_user,
        ))
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL),
        ))
        .layer(TraceLayer::new_for_http())
}
