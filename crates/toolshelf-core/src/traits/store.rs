//! Durable key-value storage trait.

use crate::Result;

/// Durable key-value persistence for tokens and cached user state.
///
/// Implementations must survive process restarts and be scoped to a single
/// client installation. The only expected failure is the store being
/// unavailable, reported as [`Error::Storage`](crate::Error::Storage).
pub trait TokenStore: Send + Sync {
    /// Retrieve a value.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
