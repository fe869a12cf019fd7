//! psync-core - Issue lifecycle kernel.
//!
//! This crate holds the deterministic domain rules for a project tracker
//! managed by a single privileged project manager. It knows nothing about
//! storage, credentials, or transport; those collaborators live in
//! `psync-service` and call into this crate with fully loaded records.
//!
//! # Modules
//!
//! - [`identity`]: roles, the capability table, user records, and the
//!   registration role policy (first registered user takes the manager seat)
//! - [`project`]: project records and manager ownership
//! - [`issue`]: issue records, the status workflow table, and the mutation
//!   entry points (`apply_transition`, `apply_assignment`)
//! - [`gate`]: the authorization gate combining role, ownership, and the
//!   workflow table into an allow/deny decision
//!
//! # Design
//!
//! The gate is a pure decision layer: it never mutates a record. Callers
//! evaluate the gate first and only then apply one of the issue mutation
//! entry points, so a denial can never leave a partial write behind.

pub mod gate;
pub mod identity;
pub mod issue;
pub mod project;

pub use gate::Denial;
pub use identity::{Capability, RegistrationError, Role, User};
pub use issue::{Issue, IssueKind, IssuePriority, IssueStatus};
pub use project::Project;
