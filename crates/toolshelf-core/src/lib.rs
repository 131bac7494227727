//! toolshelf-core - Session, token and per-user collection coordination.
//!
//! The crate is split between a small set of capability traits (token
//! persistence, session verification, token refresh, collection fetching) and
//! the two components that coordinate them:
//!
//! - [`AuthSessionMachine`] owns the authentication session lifecycle:
//!   boot-time verification, a single refresh-and-retry on `401`, explicit
//!   login and logout.
//! - [`DependentDataCoordinator`] watches the machine and keeps the cached
//!   owned/bookmarked tool ids in step with it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use toolshelf_core::{AuthSessionMachine, AuthState, MemoryTokenStore};
//! # use toolshelf_core::{SessionVerifier, TokenRefresher};
//!
//! # async fn example(
//! #     verifier: Arc<dyn SessionVerifier>,
//! #     refresher: Arc<dyn TokenRefresher>,
//! # ) {
//! let store = Arc::new(MemoryTokenStore::new());
//! let machine = AuthSessionMachine::new(store, verifier, refresher);
//!
//! machine.start().await;
//! if machine.state() == AuthState::Authenticated {
//!     println!("signed in as {:?}", machine.session().user);
//! }
//! # }
//! ```

pub mod collections;
pub mod coordinator;
pub mod error;
pub mod session;
pub mod store;
pub mod tokens;
pub mod traits;
pub mod types;

pub use collections::{CollectionKind, ToolIds, UserState};
pub use coordinator::{CollectionsView, DependentDataCoordinator};
pub use error::{Error, ErrorKind};
pub use session::{AuthEvent, AuthSessionMachine, AuthState, Session, SingleFlightRefresher};
pub use store::{MemoryTokenStore, StoredTokens};
pub use tokens::{AccessToken, RefreshToken};
pub use traits::{
    CollectionFetcher, RefreshGrant, SessionVerifier, TokenRefresher, TokenStore, VerifyResponse,
};
pub use types::{ApiUrl, UserRecord};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
