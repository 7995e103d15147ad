//! One-shot status messages shown on the next rendered page.
//!
//! A redirecting handler stores the messages in the `flash` cookie; the page that
//! renders them clears the cookie again.

use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use warbler_types::FlashCategory;

use crate::cookie::{clear_cookie, get_cookie, set_cookie};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

impl Flash {
    pub fn new(category: FlashCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashCategory::Success, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(FlashCategory::Danger, message)
    }
}

fn encode(flashes: &[Flash]) -> String {
    let json = serde_json::to_string(flashes).unwrap_or_else(|_| "[]".to_string());
    urlencoding::encode(&json).into_owned()
}

fn decode(raw: &str) -> Vec<Flash> {
    urlencoding::decode(raw)
        .ok()
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or_default()
}

/// Flashes carried by the request, if any
pub fn pending_flashes(headers: &HeaderMap) -> Vec<Flash> {
    get_cookie(headers, FLASH_COOKIE)
        .map(|raw| decode(&raw))
        .unwrap_or_default()
}

/// `Set-Cookie` value storing flashes for the next request
pub fn flash_cookie(flashes: &[Flash]) -> HeaderValue {
    set_cookie(FLASH_COOKIE, &encode(flashes)).unwrap_or_else(|| clear_cookie(FLASH_COOKIE))
}

/// `Set-Cookie` value removing consumed flashes
pub fn consumed_flash_cookie() -> HeaderValue {
    clear_cookie(FLASH_COOKIE)
}

/// 303 redirect that shows `flash` on the destination page
pub fn redirect_with_flash(to: &str, flash: Flash) -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, flash_cookie(&[flash]))]),
        Redirect::to(to),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_flash_cookie_round_trip() {
        let flashes = vec![
            Flash::danger("Access unauthorized."),
            Flash::success("Hello, test1!"),
        ];
        let cookie = flash_cookie(&flashes);
        let pair = cookie.to_str().unwrap().split(';').next().unwrap().to_string();

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(&pair).unwrap());
        assert_eq!(pending_flashes(&headers), flashes);
    }

    #[test]
    fn test_garbage_cookie_yields_no_flashes() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("flash=%7Bnot-json"));
        assert!(pending_flashes(&headers).is_empty());
    }

    #[test]
    fn test_redirect_with_flash() {
        let response = redirect_with_flash("/", Flash::danger("Access unauthorized."));
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
        assert!(response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("flash="));
    }
}
