//! Token refresh trait.

use async_trait::async_trait;

use crate::types::UserRecord;
use crate::{AccessToken, RefreshToken, Result};

/// New credentials issued in exchange for a refresh token.
#[derive(Debug, Clone)]
pub struct RefreshGrant {
    pub access_token: AccessToken,
    /// Rotated refresh token, if the backend issued one.
    pub refresh_token: Option<RefreshToken>,
    pub user: Option<UserRecord>,
}

/// Exchanges refresh tokens for new access tokens.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange `refresh_token` for a new access token.
    ///
    /// Implementations must not retry on their own.
    ///
    /// # Errors
    ///
    /// - [`AuthError::RefreshInvalid`](crate::error::AuthError::RefreshInvalid)
    ///   when the token is expired or revoked (terminal)
    /// - [`Error::Transport`](crate::Error::Transport) for transient failures
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<RefreshGrant>;

    /// Tell the backend a refresh token is no longer in use.
    ///
    /// Best-effort; the default does nothing.
    async fn revoke(&self, _refresh_token: &RefreshToken) -> Result<()> {
        Ok(())
    }
}
