//! Error types for stage-option generation.
//!
//! Failures fall into two severities:
//!
//! - **Recoverable**: the caller-supplied blueprint data is malformed (an
//!   unparsable filesystem UUID, a password that cannot be hashed). The
//!   surrounding service can reject the build request with the message.
//! - **Fatal**: the static distro/partition catalog is inconsistent (no boot
//!   partition where one is required, an architecture outside the supported
//!   set). Generation must abort; emitting a best-effort record would produce
//!   a non-bootable image.
//!
//! Generators return fatal conditions as [`StageError::Invariant`] rather than
//! panicking, so the decision to abort happens at one top-level boundary.

use thiserror::Error;

/// Error produced while synthesizing stage options.
#[derive(Debug, Error)]
pub enum StageError {
    /// A filesystem or partition-table identifier failed to parse.
    #[error("malformed uuid '{value}' for {what}")]
    MalformedUuid {
        /// What the identifier belongs to (e.g. "root filesystem").
        what: &'static str,
        /// The offending identifier as supplied.
        value: String,
        #[source]
        source: uuid::Error,
    },

    /// A plaintext password could not be hashed.
    #[error("failed to hash password for user '{user}'")]
    PasswordHash { user: String },

    /// The static build configuration is internally inconsistent.
    ///
    /// This is never caused by user input; it indicates a defect in catalog
    /// data and must abort the whole generation.
    #[error("configuration invariant violated: {0}")]
    Invariant(String),
}

impl StageError {
    /// Build a fatal invariant-violation error.
    pub fn invariant(msg: impl Into<String>) -> Self {
        StageError::Invariant(msg.into())
    }

    /// Whether this error must abort generation rather than fail the request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StageError::Invariant(_))
    }
}

/// Result alias used throughout the stage generators.
pub type Result<T, E = StageError> = std::result::Result<T, E>;
