//! REST endpoint paths and request/response types.

use serde::{Deserialize, Serialize};

use toolshelf_core::UserRecord;

// ============================================================================
// Endpoint Paths
// ============================================================================

pub const LOGIN: &str = "/api/auth/login";
pub const REGISTER: &str = "/api/auth/register";
pub const CHECK_SESSION: &str = "/api/auth/check-session";
pub const REFRESH_ACCESS_TOKEN: &str = "/api/auth/refresh-access-token";
pub const LOGOUT: &str = "/api/auth/logout";
pub const USER_TOOLS: &str = "/api/user/tools";
pub const USER_BOOKMARKS: &str = "/api/user/bookmarks";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for login.
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Request body for registration.
#[derive(Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Request body for token refresh and logout.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest<'a> {
    pub refresh_token: &'a str,
}

/// Response from login and registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub user: Option<UserRecord>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response from check-session. Either token may be rotated.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSessionResponse {
    #[serde(default)]
    pub user: Option<UserRecord>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Response from refresh-access-token.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserRecord>,
}

/// Response from the user collection endpoints.
#[derive(Debug, Deserialize)]
pub struct ToolsResponse {
    #[serde(default)]
    pub tools: Vec<ToolRef>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A tool as listed in a collection: a bare id or a populated document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ToolRef {
    Id(String),
    Document {
        #[serde(alias = "_id")]
        id: String,
    },
}

impl ToolRef {
    pub fn into_id(self) -> String {
        match self {
            ToolRef::Id(id) | ToolRef::Document { id } => id,
        }
    }
}

/// Response carrying only a message.
#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorResponse {
    pub fn describe(self) -> Option<String> {
        self.message.or(self.error)
    }
}
