//! Per-user collection fetch trait.

use async_trait::async_trait;

use crate::collections::CollectionKind;
use crate::{AccessToken, Result};

/// Loads a user-owned collection of tool ids from the backend.
#[async_trait]
pub trait CollectionFetcher: Send + Sync {
    async fn fetch(&self, kind: CollectionKind, access_token: &AccessToken)
    -> Result<Vec<String>>;
}
