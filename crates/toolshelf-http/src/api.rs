//! Backend operations over HTTP.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use toolshelf_core::error::{AuthError, Error, InvalidInputError, ProtocolError};
use toolshelf_core::{
    AccessToken, ApiUrl, AuthEvent, CollectionFetcher, CollectionKind, RefreshGrant,
    RefreshToken, Result, SessionVerifier, TokenRefresher, UserRecord, VerifyResponse,
};

use crate::client::{ApiClient, ClientConfig, unexpected_status};
use crate::endpoints::{
    self, AuthResponse, CheckSessionResponse, LoginRequest, MessageResponse, RefreshResponse,
    RefreshTokenRequest, RegisterRequest, ToolRef, ToolsResponse,
};

/// A successful login or registration.
#[derive(Debug, Clone)]
pub struct AuthGrant {
    pub user: UserRecord,
    pub access_token: AccessToken,
    pub refresh_token: Option<RefreshToken>,
    /// Message from the backend, if it sent one.
    pub message: Option<String>,
}

impl From<AuthGrant> for AuthEvent {
    fn from(grant: AuthGrant) -> Self {
        AuthEvent::SetAuthenticated {
            user: grant.user,
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
        }
    }
}

/// The toolshelf REST API.
///
/// Implements the capability traits the session machine and the collection
/// coordinator need, so one instance can be shared by both.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: ApiClient,
}

impl HttpAuthApi {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::from_client(ApiClient::new(config)?))
    }

    pub fn from_client(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn api_url(&self) -> &ApiUrl {
        self.client.api_url()
    }

    /// Log in with email and password.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthGrant> {
        require("email", email)?;
        require("password", password)?;

        let request = self
            .client
            .post(endpoints::LOGIN)
            .json(&LoginRequest { email, password });
        let response: AuthResponse = self.client.execute(request, credentials_rejected).await?;

        let grant = auth_grant(response)?;
        info!(user = %grant.user.id, "Logged in");
        Ok(grant)
    }

    /// Create an account. The backend signs the new user in directly.
    #[instrument(skip(self, email, password))]
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<AuthGrant> {
        require("username", username)?;
        require("email", email)?;
        require("password", password)?;

        let request = self.client.post(endpoints::REGISTER).json(&RegisterRequest {
            username,
            email,
            password,
        });
        let response: AuthResponse = self.client.execute(request, credentials_rejected).await?;

        let grant = auth_grant(response)?;
        info!(user = %grant.user.id, "Registered");
        Ok(grant)
    }
}

#[async_trait]
impl SessionVerifier for HttpAuthApi {
    #[instrument(skip_all)]
    async fn verify(&self, access_token: &AccessToken) -> Result<VerifyResponse> {
        let request = ApiClient::bearer(
            self.client.get(endpoints::CHECK_SESSION),
            access_token.as_str(),
        );
        let response: CheckSessionResponse = self
            .client
            .execute(request, |status, _| {
                AuthError::SessionInvalid { status }.into()
            })
            .await?;

        debug!(has_user = response.user.is_some(), "Session checked");
        Ok(VerifyResponse {
            user: response.user,
            access_token: response.access_token.and_then(|t| AccessToken::new(t).ok()),
            refresh_token: RefreshToken::from_optional(response.refresh_token),
        })
    }
}

#[async_trait]
impl TokenRefresher for HttpAuthApi {
    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<RefreshGrant> {
        let request = self
            .client
            .post(endpoints::REFRESH_ACCESS_TOKEN)
            .json(&RefreshTokenRequest {
                refresh_token: refresh_token.as_str(),
            });
        let response: RefreshResponse = self
            .client
            .execute(request, |status, message| match status {
                400 | 401 | 403 | 404 => AuthError::RefreshInvalid.into(),
                _ => unexpected_status(status, message),
            })
            .await?;

        let access_token = response
            .access_token
            .and_then(|t| AccessToken::new(t).ok())
            .ok_or_else(|| missing("accessToken"))?;

        debug!("Access token refreshed");
        Ok(RefreshGrant {
            access_token,
            refresh_token: RefreshToken::from_optional(response.refresh_token),
            user: response.user,
        })
    }

    #[instrument(skip_all)]
    async fn revoke(&self, refresh_token: &RefreshToken) -> Result<()> {
        let request = self.client.post(endpoints::LOGOUT).json(&RefreshTokenRequest {
            refresh_token: refresh_token.as_str(),
        });
        let response: MessageResponse = self.client.execute(request, unexpected_status).await?;

        debug!(message = ?response.message, "Refresh token revoked");
        Ok(())
    }
}

#[async_trait]
impl CollectionFetcher for HttpAuthApi {
    #[instrument(skip(self, access_token))]
    async fn fetch(&self, kind: CollectionKind, access_token: &AccessToken) -> Result<Vec<String>> {
        let path = match kind {
            CollectionKind::OwnedTools => endpoints::USER_TOOLS,
            CollectionKind::Bookmarks => endpoints::USER_BOOKMARKS,
        };
        let request = ApiClient::bearer(self.client.get(path), access_token.as_str());
        let response: ToolsResponse = self
            .client
            .execute(request, |status, message| match status {
                401 | 403 => AuthError::SessionInvalid { status }.into(),
                _ => unexpected_status(status, message),
            })
            .await?;

        Ok(response.tools.into_iter().map(ToolRef::into_id).collect())
    }
}

fn credentials_rejected(status: u16, message: Option<String>) -> Error {
    match status {
        400 | 401 | 403 | 409 => AuthError::InvalidCredentials {
            message: message.unwrap_or_else(|| "rejected by server".to_string()),
        }
        .into(),
        _ => unexpected_status(status, message),
    }
}

fn auth_grant(response: AuthResponse) -> Result<AuthGrant> {
    let user = response.user.ok_or_else(|| missing("user"))?;
    let access_token = response
        .access_token
        .and_then(|t| AccessToken::new(t).ok())
        .ok_or_else(|| missing("accessToken"))?;

    Ok(AuthGrant {
        user,
        access_token,
        refresh_token: RefreshToken::from_optional(response.refresh_token),
        message: response.message,
    })
}

fn missing(field: &str) -> Error {
    Error::Protocol(ProtocolError::malformed(format!(
        "response is missing {}",
        field
    )))
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(InvalidInputError::Other {
            message: format!("{} must not be empty", name),
        }
        .into());
    }
    Ok(())
}
