//! psync-service - the service layer around the issue lifecycle kernel.
//!
//! This crate owns everything the kernel deliberately does not: storage
//! collaborators, credential resolution, and the transport-agnostic
//! operations a server layer would expose. Requests are independent,
//! stateless, and short-lived; every operation reads its records fresh,
//! asks the kernel's gate, and commits at most one write.
//!
//! # Modules
//!
//! - [`auth`]: bearer credential → authenticated identity resolution
//! - [`store`]: storage collaborator traits plus the in-memory and SQLite
//!   implementations
//! - [`service`]: the operations (`SyncService`)
//! - [`views`]: enriched read models (issue details, project summaries,
//!   dashboard stats)
//! - [`error`]: the operation error taxonomy
//!
//! # Concurrency
//!
//! Issue writes are compare-and-set on the status the gate decided over,
//! so two racing requests cannot both report success while one of their
//! transitions is silently lost; the loser sees
//! [`ServiceError::Conflict`](error::ServiceError::Conflict). The
//! single-manager seat is enforced atomically inside the stores for the
//! same reason.

pub mod auth;
pub mod error;
pub mod service;
pub mod store;
pub mod views;

pub use auth::{AuthError, CredentialResolver, StaticTokenResolver};
pub use error::{ResourceKind, ServiceError};
pub use service::{NewIssue, NewProject, NewUser, ProjectEdit, SyncService};
pub use store::{IssueStore, MemoryStore, ProjectStore, SqliteStore, StoreError, UserStore};
pub use views::{DashboardStats, IssueDetails, ProjectSummary};
