//! toolshelf-file - File-backed [`TokenStore`](toolshelf_core::TokenStore).

mod store;

pub use store::FileTokenStore;
