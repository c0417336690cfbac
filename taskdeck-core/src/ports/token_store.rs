//! Token store port
//!
//! Durable client-side storage for the access/refresh token pair.

use crate::domain::result::Result;
use crate::domain::StoredTokens;

/// Persisted token storage
///
/// Absence of tokens means an anonymous session. Implementations must write
/// both tokens together so a reader never sees a half-updated pair.
pub trait TokenStore: Send + Sync {
    /// Load the persisted tokens (empty when nothing is stored)
    fn load(&self) -> Result<StoredTokens>;

    /// Replace the persisted tokens
    fn save(&self, tokens: &StoredTokens) -> Result<()>;

    /// Remove all persisted tokens
    fn clear(&self) -> Result<()>;
}
