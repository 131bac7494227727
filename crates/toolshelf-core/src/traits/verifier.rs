//! Session verification trait.

use async_trait::async_trait;

use crate::types::UserRecord;
use crate::{AccessToken, RefreshToken, Result};

/// Outcome of a successful session check.
#[derive(Debug, Clone)]
pub struct VerifyResponse {
    /// The canonical user. A response without one is not a valid session.
    pub user: Option<UserRecord>,
    /// A rotated access token, if the backend issued one.
    pub access_token: Option<AccessToken>,
    /// A rotated refresh token at the response root, if any.
    pub refresh_token: Option<RefreshToken>,
}

/// Validates an access token against the backend.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// Check `access_token` and return the canonical user.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`](crate::Error::Transport) when no response arrived
    /// - [`AuthError::SessionInvalid`](crate::error::AuthError::SessionInvalid)
    ///   with the status code for any non-2xx answer
    /// - [`Error::Protocol`](crate::Error::Protocol) for a malformed body
    async fn verify(&self, access_token: &AccessToken) -> Result<VerifyResponse>;
}
