//! Credentials port
//!
//! The HTTP client reads and rotates tokens through this trait, so it does not
//! depend on how the session is stored or observed.

use crate::domain::result::Result;
use crate::domain::StoredTokens;

/// Source of bearer credentials for API calls
pub trait Credentials: Send + Sync {
    /// Current access token, if any
    fn access_token(&self) -> Option<String>;

    /// Current refresh token, if any
    fn refresh_token(&self) -> Option<String>;

    /// Adopt tokens minted by a successful refresh
    fn store_refreshed(&self, tokens: StoredTokens) -> Result<()>;

    /// Tear down the session after an irrecoverable auth failure
    fn expire(&self);
}
