//! Project records and manager ownership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A project owned by the project manager.
///
/// `manager_id` is set at creation and never reassigned. Only title and
/// description are editable, and only by the owning manager; the
/// [`gate`](crate::gate) enforces that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier.
    pub id: Uuid,

    /// Project title.
    pub title: String,

    /// Optional free-form description.
    pub description: Option<String>,

    /// The manager identity that owns this project. Immutable.
    pub manager_id: Uuid,

    /// Whether the project appears in listings.
    pub is_active: bool,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Creates an active project with both timestamps set to `now`.
    #[must_use]
    pub fn new(
        id: Uuid,
        title: impl Into<String>,
        description: Option<String>,
        manager_id: Uuid,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description,
            manager_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` if `actor_id` is the manager that owns this project.
    ///
    /// This is the project-ownership relation. It is distinct from the
    /// assignee-of-issue relation ([`Issue::is_assigned_to`]); the two are
    /// never interchangeable.
    ///
    /// [`Issue::is_assigned_to`]: crate::issue::Issue::is_assigned_to
    #[must_use]
    pub fn is_managed_by(&self, actor_id: Uuid) -> bool {
        self.manager_id == actor_id
    }

    /// Applies a title/description edit and refreshes `updated_at`.
    pub fn apply_edit(
        &mut self,
        title: impl Into<String>,
        description: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.title = title.into();
        self.description = description;
        self.updated_at = now;
    }
}
