use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

use warbler_types::{LoginForm, MessageForm, SignupForm, UserEditForm, MAX_MESSAGE_LENGTH};

pub const MIN_PASSWORD_LENGTH: usize = 6;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

/// Field name -> messages, rendered under each input
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    fn require(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "This field is required.");
        }
    }

    fn email(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "This field is required.");
        } else if !is_valid_email(value) {
            self.add(field, "Invalid email address.");
        }
    }

    fn min_length(&mut self, field: &'static str, value: &str, min: usize) {
        if value.chars().count() < min {
            self.add(field, format!("Field must be at least {} characters long.", min));
        }
    }

    fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

pub fn validate_signup(form: &SignupForm) -> Result<(), FormErrors> {
    let mut errors = FormErrors::default();
    errors.require("username", &form.username);
    errors.email("email", &form.email);
    errors.min_length("password", &form.password, MIN_PASSWORD_LENGTH);
    errors.into_result()
}

pub fn validate_login(form: &LoginForm) -> Result<(), FormErrors> {
    let mut errors = FormErrors::default();
    errors.require("username", &form.username);
    errors.min_length("password", &form.password, MIN_PASSWORD_LENGTH);
    errors.into_result()
}

pub fn validate_message(form: &MessageForm) -> Result<(), FormErrors> {
    let mut errors = FormErrors::default();
    // Messages are stored trimmed
    let text = form.text.trim();
    errors.require("text", text);
    if text.chars().count() > MAX_MESSAGE_LENGTH {
        errors.add(
            "text",
            format!("Field cannot be longer than {} characters.", MAX_MESSAGE_LENGTH),
        );
    }
    errors.into_result()
}

pub fn validate_user_edit(form: &UserEditForm) -> Result<(), FormErrors> {
    let mut errors = FormErrors::default();
    errors.require("username", &form.username);
    errors.email("email", &form.email);
    errors.min_length("password", &form.password, MIN_PASSWORD_LENGTH);
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_signup_validation() {
        let good = SignupForm {
            username: "test1".into(),
            email: "test1@gmail.com".into(),
            password: "password2".into(),
            image_url: None,
        };
        assert!(validate_signup(&good).is_ok());

        let bad = SignupForm {
            username: " ".into(),
            email: "not-an-email".into(),
            password: "short".into(),
            image_url: None,
        };
        let errors = validate_signup(&bad).unwrap_err();
        assert_eq!(errors.get("username").unwrap(), ["This field is required."]);
        assert_eq!(errors.get("email").unwrap(), ["Invalid email address."]);
        assert!(errors.get("password").is_some());
    }

    #[test]
    fn test_message_validation() {
        assert!(validate_message(&MessageForm { text: "hi".into() }).is_ok());
        assert!(validate_message(&MessageForm { text: "".into() }).is_err());
        assert!(validate_message(&MessageForm { text: "x".repeat(141) }).is_err());
    }

    #[test]
    fn test_message_length_ignores_surrounding_whitespace() {
        let padded = format!("  {}  ", "x".repeat(MAX_MESSAGE_LENGTH));
        assert!(validate_message(&MessageForm { text: padded }).is_ok());

        let errors = validate_message(&MessageForm { text: "   ".into() }).unwrap_err();
        assert_eq!(errors.get("text").unwrap(), ["This field is required."]);
    }

    #[test]
    fn test_login_and_edit_require_password_length() {
        let login = LoginForm {
            username: "test1".into(),
            password: "12345".into(),
        };
        assert!(validate_login(&login).is_err());

        let edit = UserEditForm {
            username: "test1".into(),
            email: "test1@gmail.com".into(),
            password: "password1".into(),
            ..Default::default()
        };
        assert!(validate_user_edit(&edit).is_ok());
    }

    proptest! {
        #[test]
        fn prop_simple_addresses_are_valid(
            local in "[a-z0-9._]{1,12}",
            domain in "[a-z0-9]{1,12}",
            tld in "[a-z]{2,6}",
        ) {
            let email = format!("{}@{}.{}", local, domain, tld);
            prop_assert!(is_valid_email(&email));
        }

        #[test]
        fn prop_addresses_without_at_are_invalid(s in "[a-z0-9.]{0,30}") {
            prop_assert!(!is_valid_email(&s));
        }
    }
}
