use axum::http::{header, HeaderMap, HeaderValue};

/// Find a cookie value in the request's `Cookie` headers
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
}

/// `Set-Cookie` value for a session-scoped, HTTP-only cookie
pub fn set_cookie(name: &str, value: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        name, value
    ))
    .ok()
}

/// `Set-Cookie` value that makes the browser drop a cookie
pub fn clear_cookie(name: &str) -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        name
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("invalid=; Max-Age=0"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn headers_with(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_get_cookie() {
        let headers = headers_with("theme=dark; curr_user=abc-123;flash=x");
        assert_eq!(get_cookie(&headers, "curr_user").as_deref(), Some("abc-123"));
        assert_eq!(get_cookie(&headers, "flash").as_deref(), Some("x"));
        assert_eq!(get_cookie(&headers, "missing"), None);
        assert_eq!(get_cookie(&headers, "curr"), None);
    }

    #[test]
    fn test_get_cookie_across_multiple_headers() {
        let mut headers = headers_with("a=1");
        headers.append(header::COOKIE, HeaderValue::from_static("b=2"));
        assert_eq!(get_cookie(&headers, "b").as_deref(), Some("2"));
    }

    #[test]
    fn test_set_and_clear_cookie() {
        let set = set_cookie("curr_user", "tok").unwrap();
        assert!(set.to_str().unwrap().starts_with("curr_user=tok;"));
        assert!(set.to_str().unwrap().contains("HttpOnly"));

        let clear = clear_cookie("curr_user");
        assert!(clear.to_str().unwrap().contains("Max-Age=0"));
    }

    proptest! {
        #[test]
        fn prop_set_cookie_value_is_read_back(value in "[A-Za-z0-9%._-]{1,40}") {
            let set = set_cookie("k", &value).unwrap();
            let pair = set.to_str().unwrap().split(';').next().unwrap().to_string();
            let headers = headers_with(&pair);
            prop_assert_eq!(get_cookie(&headers, "k"), Some(value));
        }
    }
}
