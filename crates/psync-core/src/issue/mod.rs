//! Issue records and the status workflow.
//!
//! # Lifecycle
//!
//! ```text
//! create --> Open
//!             |  assignment (manager only, forces status)
//!             v
//!          Assigned <--> InProgress <--> Review
//!                                          |  completion (manager only)
//!                                          v
//!                                      Completed (terminal)
//! ```
//!
//! The workflow table ([`permitted_targets`]) bounds the moves of
//! non-manager actors; the manager bypasses it entirely (see
//! [`Capability::BypassWorkflow`](crate::identity::Capability::BypassWorkflow)).
//! Assignment is not a status move: it binds an assignee and unconditionally
//! resets the status to `Assigned`, whatever it was before.
//!
//! # Key Concepts
//!
//! - **Workflow table**: the map from current status to the statuses a
//!   non-manager assignee may move to directly.
//! - **Mutation entry points**: [`Issue::apply_transition`] and
//!   [`Issue::apply_assignment`] are the only ways an issue changes, and
//!   they are called only after the [`gate`](crate::gate) approves.

mod error;
mod state;


pub use error::FieldParseError;
pub use state::{is_permitted, permitted_targets, Issue, IssueKind, IssuePriority, IssueStatus};
