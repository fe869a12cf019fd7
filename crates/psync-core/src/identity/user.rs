//! User records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

/// A registered identity.
///
/// Email and username are unique across the system; uniqueness is enforced
/// by the storage layer at insert time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: Uuid,

    /// Unique email address.
    pub email: String,

    /// Unique display name.
    pub username: String,

    /// The role this identity holds.
    pub role: Role,

    /// Whether the identity is active. Inactive users are omitted from
    /// listings; requests they authenticate are not otherwise blocked.
    pub is_active: bool,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates an active user with both timestamps set to `now`.
    #[must_use]
    pub fn new(
        id: Uuid,
        email: impl Into<String>,
        username: impl Into<String>,
        role: Role,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            username: username.into(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
