use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use warbler_types::User;

use crate::cookie::get_cookie;
use crate::db::repositories::UserRepository;
use crate::session::CURR_USER_KEY;
use crate::state::AppState;

/// The logged-in user, or `None` for anonymous requests
#[derive(Clone, Debug, Default)]
pub struct CurrentUser(pub Option<User>);

/// Middleware that resolves the `curr_user` cookie into a [`CurrentUser`] extension
///
/// Missing, expired or unknown sessions all mean anonymous.
pub async fn load_current_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match get_cookie(request.headers(), CURR_USER_KEY) {
        Some(token) => user_for_token(&state, &token),
        None => None,
    };

    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}

fn user_for_token(state: &AppState, token: &str) -> Option<User> {
    let user_id = match state.session_manager.validate_session(token) {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!("Ignoring session cookie: {}", e);
            return None;
        }
    };

    let repo = UserRepository::new(state.db.pool.clone());
    match repo.get_by_id(user_id) {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("Failed to load user {} for session: {}", user_id, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::templates::load_templates;

    fn test_state() -> AppState {
        let db = Database::in_memory().unwrap();
        db.initialize().unwrap();
        AppState::new(db, load_templates().unwrap())
    }

    #[test]
    fn test_valid_token_resolves_user() {
        let state = test_state();
        let user = UserRepository::new(state.db.pool.clone())
            .signup("test1", "test1@test.com", "password", None)
            .unwrap();
        let token = state.session_manager.create_session(user.id).unwrap();

        assert_eq!(user_for_token(&state, &token), Some(user));
    }

    #[test]
    fn test_unknown_token_is_anonymous() {
        let state = test_state();
        assert_eq!(user_for_token(&state, "not-a-session"), None);
    }
}
