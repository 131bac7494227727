//! Account record returned by the backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Canonical account information returned by login, registration, session
/// checks and token refresh.
///
/// The backend may embed a rotated refresh token in the record itself; it is
/// kept out of `Debug` output.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Account identifier (`_id` or `id` on the wire).
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Refresh token embedded in the record, when the backend rotates it there.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Any other fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    /// A record carrying only an identifier.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
            email: None,
            refresh_token: None,
            extra: Map::new(),
        }
    }

    /// Name to show for this account: username, then email, then id.
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_mongo_style_id_and_keeps_extra_fields() {
        let user: UserRecord = serde_json::from_value(json!({
            "_id": "u1",
            "username": "ada",
            "refreshToken": "embedded",
            "createdAt": "2024-01-01"
        }))
        .unwrap();

        assert_eq!(user.id, "u1");
        assert_eq!(user.refresh_token.as_deref(), Some("embedded"));
        assert_eq!(user.extra["createdAt"], "2024-01-01");
        assert_eq!(user.display_name(), "ada");
    }

    #[test]
    fn debug_redacts_embedded_refresh_token() {
        let mut user = UserRecord::with_id("u2");
        user.refresh_token = Some("super-secret".into());
        let debug = format!("{:?}", user);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
