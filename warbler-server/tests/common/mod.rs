// Shared setup for the view tests: a router over a fresh in-memory database
#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request},
    response::Response,
    Router,
};
use tower::ServiceExt;
use warbler_server::{
    build_router,
    db::{repositories::UserRepository, Database},
    session::CURR_USER_KEY,
    state::AppState,
    templates::load_templates,
};
use warbler_types::User;

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let db = Database::in_memory().expect("in-memory database");
        db.initialize().expect("schema");
        let state = AppState::new(db, load_templates().expect("templates"));
        let router = build_router(state.clone());
        Self { state, router }
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.state.db.pool.clone())
    }

    /// Register `name` with email `{name}@gmail.com` and password `password1`
    pub fn create_user(&self, name: &str) -> User {
        self.users()
            .signup(name, &format!("{}@gmail.com", name), "password1", None)
            .expect("signup")
    }

    /// `Cookie` header value holding a fresh session for `user_id`
    pub fn login_cookie(&self, user_id: i64) -> String {
        let token = self
            .state
            .session_manager
            .create_session(user_id)
            .expect("session");
        format!("{}={}", CURR_USER_KEY, token)
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> Response {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(body)).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect location")
        .to_str()
        .unwrap()
}

/// `Cookie` header value replaying every non-expired cookie the response set
pub fn cookies_from(response: &Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter(|v| !v.contains("Max-Age=0"))
        .filter_map(|v| v.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}
