//! Operation error taxonomy.
//!
//! Every error here is terminal for the request: nothing is retried
//! internally, and no partial mutation is ever committed alongside one.

use psync_core::identity::RegistrationError;
use psync_core::issue::IssueStatus;
use psync_core::Denial;
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Which kind of record failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResourceKind {
    /// An issue id.
    Issue,
    /// A project id.
    Project,
    /// A user id (actor or assignee).
    User,
}

impl ResourceKind {
    /// Returns the lowercase noun for messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Project => "project",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors surfaced by [`SyncService`](crate::service::SyncService)
/// operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    /// An identifier did not resolve to a record.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// The kind of record.
        kind: ResourceKind,
        /// The identifier that failed to resolve.
        id: Uuid,
    },

    /// The gate denied the request on role or ownership grounds.
    ///
    /// The denial's message is the stable reason string; it is surfaced
    /// verbatim.
    #[error("{0}")]
    Forbidden(Denial),

    /// The target status is not reachable from the current status under
    /// the workflow table (non-manager actors only).
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The issue's current status.
        from: IssueStatus,
        /// The requested target status.
        to: IssueStatus,
    },

    /// The bearer credential did not resolve to an identity.
    #[error("could not validate credentials")]
    Unauthorized,

    /// Registration was rejected.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// The issue changed under us between the gate decision and the write.
    ///
    /// The caller may re-read and re-submit; nothing was written.
    #[error("issue {issue_id} changed concurrently: expected status {expected}, found {actual}")]
    Conflict {
        /// The contested issue.
        issue_id: Uuid,
        /// The status the decision was made over.
        expected: IssueStatus,
        /// The status found at write time.
        actual: IssueStatus,
    },

    /// Storage infrastructure failure.
    #[error("storage failure: {message}")]
    Store {
        /// Backend error detail.
        message: String,
    },
}

impl ServiceError {
    /// Wraps a gate denial, routing workflow violations to their own taxon.
    #[must_use]
    pub fn from_denial(denial: Denial) -> Self {
        match denial {
            Denial::WorkflowViolation { from, to } => Self::InvalidTransition { from, to },
            other => Self::Forbidden(other),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::IssueNotFound { id } => Self::NotFound {
                kind: ResourceKind::Issue,
                id,
            },
            StoreError::StatusConflict {
                id,
                expected,
                actual,
            } => Self::Conflict {
                issue_id: id,
                expected,
                actual,
            },
            StoreError::ManagerSeatTaken => {
                Self::Registration(RegistrationError::ManagerSeatTaken)
            }
            StoreError::DuplicateEmail { email } => {
                Self::Registration(RegistrationError::DuplicateEmail { email })
            }
            StoreError::DuplicateUsername { username } => {
                Self::Registration(RegistrationError::DuplicateUsername { username })
            }
            StoreError::DuplicateId { id } => Self::Store {
                message: format!("record already exists: {id}"),
            },
            StoreError::Backend { message } => Self::Store { message },
        }
    }
}
