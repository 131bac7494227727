//! Persisted state layout and the in-memory store.
//!
//! Everything the client persists lives in one [`TokenStore`] under three
//! well-known keys: [`ACCESS_TOKEN_KEY`], [`REFRESH_TOKEN_KEY`] and
//! [`USER_STATE_KEY`] (a JSON-encoded [`UserState`]).

mod memory;

pub use memory::MemoryTokenStore;

use crate::collections::UserState;
use crate::error::InvalidInputError;
use crate::traits::TokenStore;
use crate::{AccessToken, RefreshToken, Result};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_STATE_KEY: &str = "userState";

/// The token pair as persisted in a [`TokenStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredTokens {
    pub access_token: Option<AccessToken>,
    pub refresh_token: Option<RefreshToken>,
}

impl StoredTokens {
    /// Read both tokens. Empty stored strings count as absent.
    pub fn load(store: &dyn TokenStore) -> Result<Self> {
        let access_token = store
            .get(ACCESS_TOKEN_KEY)?
            .and_then(|t| AccessToken::new(t).ok());
        let refresh_token = RefreshToken::from_optional(store.get(REFRESH_TOKEN_KEY)?);

        Ok(Self {
            access_token,
            refresh_token,
        })
    }

    /// Write both tokens, removing the keys of absent ones.
    pub fn save(&self, store: &dyn TokenStore) -> Result<()> {
        match &self.access_token {
            Some(token) => store.set(ACCESS_TOKEN_KEY, token.as_str())?,
            None => store.remove(ACCESS_TOKEN_KEY)?,
        }
        match &self.refresh_token {
            Some(token) => store.set(REFRESH_TOKEN_KEY, token.as_str())?,
            None => store.remove(REFRESH_TOKEN_KEY)?,
        }
        Ok(())
    }

    /// Remove both tokens.
    pub fn clear(store: &dyn TokenStore) -> Result<()> {
        store.remove(ACCESS_TOKEN_KEY)?;
        store.remove(REFRESH_TOKEN_KEY)
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Read the cached per-user collections. A missing key is an empty state.
pub fn load_user_state(store: &dyn TokenStore) -> Result<UserState> {
    match store.get(USER_STATE_KEY)? {
        Some(json) => serde_json::from_str(&json).map_err(|e| {
            InvalidInputError::Other {
                message: format!("invalid {}: {}", USER_STATE_KEY, e),
            }
            .into()
        }),
        None => Ok(UserState::default()),
    }
}

/// Persist the cached per-user collections.
pub fn save_user_state(store: &dyn TokenStore, state: &UserState) -> Result<()> {
    let json = serde_json::to_string(state).map_err(|e| InvalidInputError::Other {
        message: e.to_string(),
    })?;
    store.set(USER_STATE_KEY, &json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_through_store() {
        let store = MemoryTokenStore::new();
        let tokens = StoredTokens {
            access_token: Some(AccessToken::new("a1").unwrap()),
            refresh_token: Some(RefreshToken::new("r1").unwrap()),
        };
        tokens.save(&store).unwrap();
        assert_eq!(StoredTokens::load(&store).unwrap(), tokens);

        StoredTokens::clear(&store).unwrap();
        assert!(store.get(ACCESS_TOKEN_KEY).unwrap().is_none());
        assert!(store.get(REFRESH_TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn saving_absent_refresh_token_removes_key() {
        let store = MemoryTokenStore::with_entries([
            (ACCESS_TOKEN_KEY, "old"),
            (REFRESH_TOKEN_KEY, "stale"),
        ]);
        StoredTokens {
            access_token: Some(AccessToken::new("new").unwrap()),
            refresh_token: None,
        }
        .save(&store)
        .unwrap();

        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("new"));
        assert!(store.get(REFRESH_TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn empty_stored_token_counts_as_absent() {
        let store = MemoryTokenStore::with_entries([(ACCESS_TOKEN_KEY, "")]);
        assert!(StoredTokens::load(&store).unwrap().is_empty());
    }

    #[test]
    fn corrupt_user_state_is_an_error() {
        let store = MemoryTokenStore::with_entries([(USER_STATE_KEY, "{not json")]);
        assert!(load_user_state(&store).is_err());
        assert!(load_user_state(&MemoryTokenStore::new()).unwrap().is_empty());
    }
}
