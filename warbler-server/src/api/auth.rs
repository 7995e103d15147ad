use axum::{
    extract::State,
    http::HeaderMap,
    response::{Redirect, Response},
    Extension, Form,
};
use warbler_types::{LoginForm, SignupForm};

use super::{log_in, log_out, with_cookies, ApiResult, Page};
use crate::db::repositories::{AccountError, UserRepository};
use crate::flash::{flash_cookie, Flash};
use crate::forms::{validate_login, validate_signup, FormErrors};
use crate::middleware::CurrentUser;
use crate::state::AppState;

fn signup_page(form: &SignupForm, errors: &FormErrors) -> Page {
    Page::new("users/signup.html")
        .with("form", form)
        .with("errors", errors)
}

fn login_page(form: &LoginForm, errors: &FormErrors) -> Page {
    Page::new("users/login.html")
        .with("form", form)
        .with("errors", errors)
}

/// GET /signup
pub async fn signup_form(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    signup_page(&SignupForm::default(), &FormErrors::default())
        .render(&state, &headers, &current_user)
}

/// POST /signup - Register and log in
///
/// A taken username or email re-renders the form with the error inline.
pub async fn signup(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    headers: HeaderMap,
    Form(form): Form<SignupForm>,
) -> ApiResult<Response> {
    if let Err(errors) = validate_signup(&form) {
        return signup_page(&form, &errors).render(&state, &headers, &current_user);
    }

    let repo = UserRepository::new(state.db.pool.clone());
    let user = match repo.signup(
        form.username.trim(),
        form.email.trim(),
        &form.password,
        form.image_url.as_deref(),
    ) {
        Ok(user) => user,
        Err(AccountError::AlreadyTaken) => {
            return signup_page(&form, &FormErrors::default())
                .flash(Flash::danger(AccountError::AlreadyTaken.to_string()))
                .render(&state, &headers, &current_user);
        }
        Err(AccountError::Database(e)) => return Err(e.into()),
    };

    let session = log_in(&state, user.id)?;
    Ok(with_cookies(vec![session], Redirect::to("/")))
}

/// GET /login
pub async fn login_form(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    login_page(&LoginForm::default(), &FormErrors::default())
        .render(&state, &headers, &current_user)
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Extension(CurrentUser(current_user)): Extension<CurrentUser>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> ApiResult<Response> {
    if let Err(errors) = validate_login(&form) {
        return login_page(&form, &errors).render(&state, &headers, &current_user);
    }

    let repo = UserRepository::new(state.db.pool.clone());
    match repo.authenticate(form.username.trim(), &form.password)? {
        Some(user) => {
            tracing::info!("User {} logged in", user.id);
            let session = log_in(&state, user.id)?;
            let greeting = flash_cookie(&[Flash::success(format!("Hello, {}!", user.username))]);
            Ok(with_cookies(vec![session, greeting], Redirect::to("/")))
        }
        None => login_page(&form, &FormErrors::default())
            .flash(Flash::danger("Invalid credentials."))
            .render(&state, &headers, &current_user),
    }
}

/// GET /logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let cleared = log_out(&state, &headers)?;
    let farewell = flash_cookie(&[Flash::success("You have successfully logged out.")]);
    Ok(with_cookies(vec![cleared, farewell], Redirect::to("/login")))
}
