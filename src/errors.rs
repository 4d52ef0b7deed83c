use thiserror::Error;

use crate::models::domain::attempt::Phase;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    #[error("Assessment generation failed: {0}")]
    Generation(String),

    #[error("Assessment is not yet open")]
    NotYetOpen,

    #[error("Assessment window has closed")]
    WindowClosed,

    #[error("Assessment has already been submitted")]
    AlreadySubmitted,

    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("Session expired, re-authentication required")]
    SessionExpired,

    #[error("Not authorized for this assessment")]
    NotAuthorized,

    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Invalid transition: cannot {action} while {from:?}")]
    InvalidTransition { from: Phase, action: &'static str },

    #[error("Submission ledger error: {0}")]
    Ledger(String),
}

impl SessionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::Generation(_) => "GENERATION_ERROR",
            SessionError::NotYetOpen => "NOT_YET_OPEN",
            SessionError::WindowClosed => "WINDOW_CLOSED",
            SessionError::AlreadySubmitted => "ALREADY_SUBMITTED",
            SessionError::InvalidSubmission(_) => "INVALID_SUBMISSION",
            SessionError::SessionExpired => "SESSION_EXPIRED",
            SessionError::NotAuthorized => "NOT_AUTHORIZED",
            SessionError::SubmissionFailed(_) => "SUBMISSION_FAILED",
            SessionError::InvalidTransition { .. } => "INVALID_TRANSITION",
            SessionError::Ledger(_) => "LEDGER_ERROR",
        }
    }

    /// Whether pressing submit again can meaningfully succeed.
    /// Nothing in the flow retries automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::SubmissionFailed(_))
    }
}

impl From<validator::ValidationErrors> for SessionError {
    fn from(err: validator::ValidationErrors) -> Self {
        SessionError::Generation(err.to_string())
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
