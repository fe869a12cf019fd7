//! Identities, roles, and the registration role policy.
//!
//! # Key Concepts
//!
//! - **Role**: one of `ProjectManager`, `Developer`, `Designer`. At most one
//!   identity holds the manager role across the whole system.
//! - **Capability**: a named permission a role grants before any record
//!   state is consulted. The role → capability mapping is a declarative
//!   table, not branching code, so it can be tested in isolation.
//! - **Registration policy**: the first registered identity takes the
//!   manager seat regardless of the requested role; later requests for the
//!   manager role are rejected while the seat is occupied.
//!
//! Ownership relations (assignee-of-issue, manager-of-project) are *not*
//! capabilities; they are predicates on the records themselves and are
//! combined with capabilities by the [`gate`](crate::gate).

mod error;
mod policy;
mod role;
mod user;

pub use error::{RegistrationError, UnknownRole};
pub use policy::resolve_registration_role;
pub use role::{Capability, Role};
pub use user::User;
