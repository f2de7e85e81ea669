//! Error types for the analysis wizard
//!
//! - Step validation failures (recovered locally, state unchanged)
//! - Line slot misuse (unknown or removed keys)
//! - Submission failures (validation or backend rejection)
//! - Backend collaborator errors

use crate::lines::{LineKey, Section};
use crate::step::Step;

/// A step's precondition does not hold
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Title is blank
    #[error("title is required")]
    MissingTitle,

    /// Author is blank
    #[error("author is required")]
    MissingAuthor,

    /// Section has no non-blank line
    #[error("{0} is required: add at least one non-empty line")]
    EmptySection(Section),
}

impl ValidationError {
    /// Step where the requirement is enforced
    #[must_use]
    pub fn step(&self) -> Step {
        match self {
            Self::MissingTitle | Self::MissingAuthor => Step::Identification,
            Self::EmptySection(section) => section.step(),
        }
    }
}

/// Misuse of a line key
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    /// Key was never handed out
    #[error("no line with key {0}")]
    UnknownKey(LineKey),

    /// Key points at a tombstoned entry
    #[error("line {0} was removed")]
    Removed(LineKey),
}

/// Errors reported by the backend collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Backend refused the request
    #[error("backend rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status
        status: u16,
        /// Server-provided message
        message: String,
    },

    /// Record does not exist
    #[error("analysis not found: {0}")]
    NotFound(String),

    /// Request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// Response could not be decoded
    #[error("invalid response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Create a rejection error
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Whether retrying the same request may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::NotFound(_) | Self::Decode(_) => false,
        }
    }
}

/// Submission could not be completed
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Submit triggered before the last step
    #[error("submission is only available on the last step (currently on {0})")]
    NotOnFinalStep(Step),

    /// Assembled record is incomplete
    #[error("incomplete analysis: {0}")]
    Incomplete(#[from] ValidationError),

    /// Backend refused or failed; wizard state kept for retry
    #[error("submission failed: {0}")]
    Backend(#[from] BackendError),
}

/// Any error a wizard command can return
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    /// Step validation failed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Line slot misuse
    #[error(transparent)]
    Line(#[from] LineError),

    /// Submission failed
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// Backend lookup failed
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl WizardError {
    /// Whether the controller already queued a notice for this error
    ///
    /// Hosts render notices from the event queue; only errors for which
    /// this is `false` still need to be shown.
    #[must_use]
    pub fn is_notified(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Backend(_) => true,
            Self::Submit(err) => !matches!(err, SubmitError::NotOnFinalStep(_)),
            Self::Line(_) => false,
        }
    }
}

/// Result type alias for wizard commands
pub type WizardResult<T> = Result<T, WizardError>;
