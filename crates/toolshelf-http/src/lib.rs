//! toolshelf-http - `reqwest` implementation of the toolshelf backend traits.
//!
//! [`HttpAuthApi`] implements [`SessionVerifier`], [`TokenRefresher`] and
//! [`CollectionFetcher`] against the toolshelf REST API, and adds the login,
//! registration and logout calls a client needs to produce
//! [`AuthEvent`]s.
//!
//! [`SessionVerifier`]: toolshelf_core::SessionVerifier
//! [`TokenRefresher`]: toolshelf_core::TokenRefresher
//! [`CollectionFetcher`]: toolshelf_core::CollectionFetcher
//! [`AuthEvent`]: toolshelf_core::AuthEvent

mod api;
mod client;
pub mod endpoints;

pub use api::{AuthGrant, HttpAuthApi};
pub use client::{ApiClient, ClientConfig};
