//! Request DTOs for the admin API

use serde::Deserialize;

/// Longest key accepted by the admin endpoints.
pub const MAX_KEY_LEN: usize = 256;

/// Optional body of `POST /stores/:name/refresh`.
///
/// Without a key the whole store is cleared.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub key: Option<String>,
}

impl RefreshRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(self.key.as_deref()?)
    }
}

pub fn validate_key(key: &str) -> Option<String> {
    if key.trim().is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LEN {
        return Some(format!("Key exceeds maximum length of {MAX_KEY_LEN} characters"));
    }
    None
}

/// `?locale=` on read-through endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocaleQuery {
    #[serde(default)]
    pub locale: Option<String>,
}

impl LocaleQuery {
    pub fn or_default<'a>(&'a self, default: &'a str) -> &'a str {
        self.locale
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_request_key_is_optional() {
        let req: RefreshRequest = serde_json::from_str("{}").unwrap();
        assert!(req.key.is_none());
        assert!(req.validate().is_none());

        let req: RefreshRequest = serde_json::from_str(r#"{"key": "Action"}"#).unwrap();
        assert_eq!(req.key.as_deref(), Some("Action"));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("  ").is_some());
        assert!(validate_key(&"k".repeat(MAX_KEY_LEN + 1)).is_some());
        assert!(validate_key("slope::en").is_none());
    }

    #[test]
    fn test_locale_default() {
        assert_eq!(LocaleQuery::default().or_default("en"), "en");
        let query = LocaleQuery {
            locale: Some(" fr ".into()),
        };
        assert_eq!(query.or_default("en"), "fr");
    }
}
