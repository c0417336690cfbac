//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - reqwest HTTP client for the task API (with the refresh interceptor)
//! - JSON file on disk for the TokenStore port
//! - In-memory TokenStore for ephemeral sessions

pub mod api_client;
pub mod memory;
pub mod token_file;

#[cfg(test)]
pub mod mock_server;
