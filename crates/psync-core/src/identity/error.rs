//! Identity error types.

use thiserror::Error;

/// A role string that does not name a known role.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized role: {value}")]
pub struct UnknownRole {
    /// The rejected string.
    pub value: String,
}

/// Errors raised while registering a new identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RegistrationError {
    /// A project manager is already registered; the seat holds one identity.
    #[error("a project manager already exists; choose the Developer or Designer role")]
    ManagerSeatTaken,

    /// Email is already registered.
    #[error("email already registered: {email}")]
    DuplicateEmail {
        /// The conflicting email address.
        email: String,
    },

    /// Username is already taken.
    #[error("username already taken: {username}")]
    DuplicateUsername {
        /// The conflicting username.
        username: String,
    },
}
