//! Issue field parse errors.

use thiserror::Error;

/// A wire string that does not name a known issue field value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FieldParseError {
    /// Unrecognized status string.
    #[error("unrecognized issue status: {value}")]
    Status {
        /// The rejected string.
        value: String,
    },

    /// Unrecognized priority string.
    #[error("unrecognized issue priority: {value}")]
    Priority {
        /// The rejected string.
        value: String,
    },

    /// Unrecognized kind string.
    #[error("unrecognized issue kind: {value}")]
    Kind {
        /// The rejected string.
        value: String,
    },
}
