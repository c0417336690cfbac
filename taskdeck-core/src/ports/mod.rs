//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod credentials;
mod token_store;

pub use credentials::Credentials;
pub use token_store::TokenStore;
