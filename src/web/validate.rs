//! Input checks shared by the handlers. Each returns a short message that
//! ends up in the 400 response.

use serde_json::Value;

use crate::web::{WebError, WebResult};

pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_EMAIL_LEN: usize = 254;
const MAX_TITLE_LEN: usize = 200;
pub const MAX_ACTIVITY_SCORE: i32 = 10_000;

pub fn username(value: &str) -> WebResult<()> {
    let len = value.chars().count();
    if !(3..=32).contains(&len) {
        return Err(WebError::bad_request("username must be 3 to 32 characters long"));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(WebError::bad_request(
            "username may only contain letters, digits, `_` and `-`",
        ));
    }
    Ok(())
}

pub fn email(value: &str) -> WebResult<()> {
    let invalid = || WebError::bad_request("email address is invalid");

    if value.len() > MAX_EMAIL_LEN || value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    match domain.split_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() && !domain.ends_with('.') => {
            Ok(())
        }
        _ => Err(invalid()),
    }
}

pub fn password(value: &str) -> WebResult<()> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(WebError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

/// Non-blank text of at most 200 characters.
pub fn title(field: &str, value: &str) -> WebResult<()> {
    if value.trim().is_empty() {
        return Err(WebError::bad_request(format!("{field} must not be empty")));
    }
    if value.chars().count() > MAX_TITLE_LEN {
        return Err(WebError::bad_request(format!(
            "{field} must be at most {MAX_TITLE_LEN} characters long"
        )));
    }
    Ok(())
}

pub fn json_object(field: &str, value: &Value) -> WebResult<()> {
    if !value.is_object() {
        return Err(WebError::bad_request(format!("{field} must be a JSON object")));
    }
    Ok(())
}

pub fn score(score: i32, max_score: i32) -> WebResult<()> {
    if !(1..=MAX_ACTIVITY_SCORE).contains(&max_score) {
        return Err(WebError::bad_request(format!(
            "max_score must be between 1 and {MAX_ACTIVITY_SCORE}"
        )));
    }
    if !(0..=max_score).contains(&score) {
        return Err(WebError::bad_request("score must be between 0 and max_score"));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn usernames() {
        assert!(username("tutor_cat-1").is_ok());
        assert!(username("ab").is_err());
        assert!(username(&"a".repeat(33)).is_err());
        assert!(username("has space").is_err());
        assert!(username("émile").is_err());
    }

    #[test]
    fn emails() {
        assert!(email("cat@tutor.cat").is_ok());
        assert!(email("first.last@mail.example.org").is_ok());
        assert!(email("no-at-sign").is_err());
        assert!(email("@tutor.cat").is_err());
        assert!(email("cat@tutor").is_err());
        assert!(email("cat@.cat").is_err());
        assert!(email("cat@tutor.").is_err());
        assert!(email("cat@@tutor.cat").is_err());
        assert!(email("c at@tutor.cat").is_err());
    }

    #[test]
    fn passwords() {
        assert!(password("12345678").is_ok());
        assert!(password("1234567").is_err());
    }

    #[test]
    fn titles() {
        assert!(title("title", "Greetings").is_ok());
        assert!(title("title", "   ").is_err());
        assert!(title("title", &"x".repeat(201)).is_err());
    }

    #[test]
    fn content_must_be_object() {
        assert!(json_object("content", &json!({"words": []})).is_ok());
        assert!(json_object("content", &json!([1, 2])).is_err());
        assert!(json_object("content", &json!(null)).is_err());
    }

    #[test]
    fn scores() {
        assert!(score(0, 5).is_ok());
        assert!(score(5, 5).is_ok());
        assert!(score(6, 5).is_err());
        assert!(score(-1, 5).is_err());
        assert!(score(0, 0).is_err());
        assert!(score(0, MAX_ACTIVITY_SCORE).is_ok());
        assert!(score(0, MAX_ACTIVITY_SCORE + 1).is_err());
        assert!(score(i32::MAX, i32::MAX).is_err());
    }
}
