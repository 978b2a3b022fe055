mod provider;
pub use provider::Provider;

use serde::Deserialize;
use std::fmt;

/// OAuth2 client credentials of a Sentinel Hub account.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

// Keeps the secret out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    error_description: Option<String>,
}

impl ErrorBody {
    fn message(self, fallback: &str) -> String {
        if let Some(description) = self.error_description {
            return description;
        }
        match self.error {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Object(map)) => map
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string()),
            _ => fallback.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_secret() {
        let credentials = Credentials::new("my-id", "hunter2");
        let printed = format!("{credentials:?}");
        assert!(printed.contains("my-id"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_error_message_oauth() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"error": "invalid_client", "error_description": "Invalid client credentials"}"#,
        )
        .unwrap();
        assert_eq!(body.message("401"), "Invalid client credentials");
    }

    #[test]
    fn test_error_message_api() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"error": {"status": 400, "reason": "Bad Request", "message": "Invalid bbox"}}"#,
        )
        .unwrap();
        assert_eq!(body.message("400"), "Invalid bbox");
        assert_eq!(ErrorBody::default().message("500"), "500");
    }
}
