//! Storage collaborator traits.
//!
//! The operations layer talks to storage through these traits only. Two
//! implementations ship: [`MemoryStore`] (bounded, lock-guarded maps) and
//! [`SqliteStore`] (durable, rusqlite-backed).
//!
//! Two invariants are enforced *here*, at the storage boundary, because
//! they must hold under concurrent requests:
//!
//! - **Status compare-and-set**: [`IssueStore::update`] takes the status
//!   the caller's decision was made over and refuses the write if the
//!   stored status has moved, so a racing transition is surfaced instead
//!   of silently overwritten.
//! - **Single manager seat**: [`UserStore::insert`] refuses a second row
//!   with the manager role atomically (partial unique index in SQLite,
//!   insert-under-write-lock in memory), closing the check-then-insert
//!   race on registration.

mod memory;
mod sqlite;

use psync_core::issue::IssueStatus;
use psync_core::{Issue, Project, User};
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// A record with this id already exists.
    #[error("record already exists: {id}")]
    DuplicateId {
        /// The duplicate id.
        id: Uuid,
    },

    /// Email uniqueness violated.
    #[error("email already registered: {email}")]
    DuplicateEmail {
        /// The conflicting email.
        email: String,
    },

    /// Username uniqueness violated.
    #[error("username already taken: {username}")]
    DuplicateUsername {
        /// The conflicting username.
        username: String,
    },

    /// A second manager row was attempted; the seat holds one identity.
    #[error("a project manager is already registered")]
    ManagerSeatTaken,

    /// Issue id did not resolve at write time.
    #[error("issue not found: {id}")]
    IssueNotFound {
        /// The missing id.
        id: Uuid,
    },

    /// The compare-and-set guard tripped: the stored status is no longer
    /// the one the caller decided over.
    #[error("issue {id} status changed concurrently: expected {expected}, found {actual}")]
    StatusConflict {
        /// The contested issue.
        id: Uuid,
        /// The status the caller expected.
        expected: IssueStatus,
        /// The status actually stored.
        actual: IssueStatus,
    },

    /// Backend infrastructure failure.
    #[error("storage backend failure: {message}")]
    Backend {
        /// Backend error detail.
        message: String,
    },
}

/// Issue persistence.
pub trait IssueStore: Send + Sync {
    /// Loads an issue by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn load(&self, id: Uuid) -> Result<Option<Issue>, StoreError>;

    /// Inserts a new issue.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateId`] if the id is already present.
    fn insert(&self, issue: &Issue) -> Result<(), StoreError>;

    /// Writes `issue` if and only if the stored status still equals
    /// `expected_status`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StatusConflict`] when the guard trips and
    /// [`StoreError::IssueNotFound`] when the id no longer resolves.
    fn update(&self, issue: &Issue, expected_status: IssueStatus) -> Result<(), StoreError>;

    /// All issues, ordered by creation time then id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn list_all(&self) -> Result<Vec<Issue>, StoreError>;

    /// Issues currently assigned to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn list_assigned_to(&self, user_id: Uuid) -> Result<Vec<Issue>, StoreError>;

    /// Issues created by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn list_created_by(&self, user_id: Uuid) -> Result<Vec<Issue>, StoreError>;

    /// Issues currently in `status`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn list_with_status(&self, status: IssueStatus) -> Result<Vec<Issue>, StoreError>;

    /// Issues belonging to `project_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn list_for_project(&self, project_id: Uuid) -> Result<Vec<Issue>, StoreError>;
}

/// Project persistence.
pub trait ProjectStore: Send + Sync {
    /// Loads a project by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn load(&self, id: Uuid) -> Result<Option<Project>, StoreError>;

    /// Inserts a new project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateId`] if the id is already present.
    fn insert(&self, project: &Project) -> Result<(), StoreError>;

    /// Overwrites an existing project record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the id does not resolve.
    fn update(&self, project: &Project) -> Result<(), StoreError>;

    /// Active projects, ordered by creation time then id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn list_active(&self) -> Result<Vec<Project>, StoreError>;

    /// All projects, ordered by creation time then id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn list_all(&self) -> Result<Vec<Project>, StoreError>;
}

/// User persistence.
pub trait UserStore: Send + Sync {
    /// Loads a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn load(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Inserts a new user, enforcing email/username uniqueness and the
    /// single-manager seat atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ManagerSeatTaken`],
    /// [`StoreError::DuplicateEmail`], or [`StoreError::DuplicateUsername`]
    /// on the corresponding violation.
    fn insert(&self, user: &User) -> Result<(), StoreError>;

    /// Finds a user by exact email.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Finds a user by exact username.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Active users, ordered by creation time then id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn list_active(&self) -> Result<Vec<User>, StoreError>;

    /// Returns `true` if any user holds the manager role.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn manager_exists(&self) -> Result<bool, StoreError>;

    /// Total number of users, active or not.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on infrastructure failure.
    fn user_count(&self) -> Result<u64, StoreError>;
}
