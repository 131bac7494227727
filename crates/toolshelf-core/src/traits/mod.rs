//! Capability traits injected into the session subsystem.

mod fetcher;
mod refresher;
mod store;
mod verifier;

pub use fetcher::CollectionFetcher;
pub use refresher::{RefreshGrant, TokenRefresher};
pub use store::TokenStore;
pub use verifier::{SessionVerifier, VerifyResponse};
