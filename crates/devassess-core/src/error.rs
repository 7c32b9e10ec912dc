//! Error types.
//!
//! `ApiError` is defined in `devassess-core` so the session layer can classify
//! failures (validation, network, session) and decide between an inline
//! message and a redirect to login without string matching.

use thiserror::Error;

use crate::model::ChallengeKind;

/// Errors surfaced by the API seam and the session layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Local input validation failed; no request was issued.
    #[error("{0}")]
    Validation(String),

    /// The backend answered with a failure envelope.
    #[error("{code}: {message}")]
    Rejected { code: String, message: String },

    /// The backend returned a non-2xx status.
    #[error("Request failed {status}: {message}")]
    Http { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not match the wire contract.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// No stored candidate for the requested assessment.
    #[error("No active assessment session found. Please login first.")]
    NoSession,

    /// The time limit has elapsed.
    #[error("Assessment session has expired")]
    SessionExpired,

    /// The challenge was already submitted and is read-only.
    #[error("challenge {0} has already been submitted")]
    AlreadySubmitted(String),

    /// Another submission for the challenge has not resolved yet.
    #[error("a submission for challenge {0} is already in progress")]
    SubmissionInFlight(String),

    /// The answer type does not match the challenge type.
    #[error("challenge {challenge_id} expects a {expected} answer, got {actual}")]
    KindMismatch {
        challenge_id: String,
        expected: ChallengeKind,
        actual: ChallengeKind,
    },

    /// The backend does not know the requested resource.
    #[error("{0}")]
    NotFound(String),
}

/// Coarse error classes that decide how a failure is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rendered next to the offending field.
    Validation,
    /// Rendered as a blocking alert.
    Network,
    /// Forces a redirect back to login.
    Session,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            ApiError::Validation(_)
            | ApiError::KindMismatch { .. }
            | ApiError::AlreadySubmitted(_)
            | ApiError::SubmissionInFlight(_) => ErrorClass::Validation,
            ApiError::NoSession | ApiError::SessionExpired => ErrorClass::Session,
            ApiError::Http { status: 401, .. } => ErrorClass::Session,
            _ => ErrorClass::Network,
        }
    }

    /// Returns `true` if the caller must send the candidate back to login.
    pub fn requires_login(&self) -> bool {
        self.class() == ErrorClass::Session
    }
}

/// Result alias for the API seam.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Failures of a key-value storage backend.
///
/// The session store never propagates these; they are logged and degrade to
/// "no data".
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("failed to persist {key}: {message}")]
    Persist { key: String, message: String },
}
