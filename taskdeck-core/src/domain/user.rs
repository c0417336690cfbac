//! User domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::wire::{deserialize_id, deserialize_timestamp};

/// Represents an authenticated user as returned by `/api/users/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub email: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "createdAt", deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            display_name: display_name.into(),
            created_at: Utc::now(),
        }
    }
}
