//! Session domain model

use serde::{Deserialize, Serialize};

use super::User;

/// Access/refresh token pair as persisted between runs
///
/// Stored under the fixed keys `accessToken` and `refreshToken`; a missing key
/// means that token is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl StoredTokens {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Client-side view of the current authenticated identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub current_user: Option<User>,
    /// True only while the startup restoration is in flight
    pub is_loading: bool,
}

impl Session {
    /// Logged-out session with nothing pending
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.current_user.is_some()
    }

    pub fn tokens(&self) -> StoredTokens {
        StoredTokens {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }

    /// A user is only visible alongside an access token, unless restoring
    pub fn is_consistent(&self) -> bool {
        self.is_loading || self.current_user.is_none() || self.access_token.is_some()
    }
}
