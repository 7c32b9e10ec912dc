//! Core trait definitions for the assessment backend.
//!
//! `AssessmentApi` is implemented by the HTTP client and the in-memory mock
//! in `devassess-client`. It is the only network boundary of the system.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::model::{Answer, Assessment, Challenge};

// ---------------------------------------------------------------------------
// Assessment API trait
// ---------------------------------------------------------------------------

/// Trait for assessment backends.
#[async_trait]
pub trait AssessmentApi: Send + Sync {
    /// Human-readable backend name (e.g. "http").
    fn name(&self) -> &str;

    /// Install or drop the bearer token sent with authenticated requests.
    fn set_token(&self, token: Option<String>);

    /// Exchange candidate credentials for a session.
    async fn authenticate(&self, request: &AuthRequest) -> ApiResult<AuthResponse>;

    /// Fetch assessment metadata.
    async fn get_assessment(&self, assessment_id: &str) -> ApiResult<Assessment>;

    /// Fetch the challenge list (summaries without type payloads).
    async fn get_challenges(&self, assessment_id: &str) -> ApiResult<Vec<Challenge>>;

    /// Fetch one challenge with its full payload.
    async fn get_challenge_details(&self, challenge_id: &str) -> ApiResult<Challenge>;

    /// Submit the answer to one challenge.
    async fn submit_challenge(&self, submission: &ChallengeSubmission)
        -> ApiResult<SubmissionReceipt>;

    /// Finalize the whole assessment.
    async fn submit_assessment(
        &self,
        submission: &AssessmentSubmission,
    ) -> ApiResult<AssessmentReceipt>;
}

/// Candidate credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    pub name: String,
    pub email: String,
    pub assessment_id: String,
}

/// Successful authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub candidate_id: String,
    pub name: String,
    pub email: String,
    pub assessment_id: String,
    pub token: String,
    /// Time limit in minutes.
    pub time_limit: u32,
    /// Server-side session start, absent on legacy backends.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

/// A challenge answer ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeSubmission {
    pub challenge_id: String,
    pub assessment_id: String,
    pub candidate_name: String,
    pub candidate_email: String,
    pub answer: Answer,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub auto_submit: bool,
}

/// Backend acknowledgement of a challenge submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub submission_id: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Request to finalize an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentSubmission {
    pub assessment_id: String,
    pub candidate_name: String,
    pub candidate_email: String,
}

/// Backend acknowledgement of a finalized assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentReceipt {
    pub assessment_id: String,
    pub submission_id: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Confirmation prompt seam
// ---------------------------------------------------------------------------

/// Asks the candidate to confirm an irreversible action.
pub trait Prompter: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

/// Prompter that accepts every confirmation.
pub struct AlwaysConfirm;

impl Prompter for AlwaysConfirm {
    fn confirm(&self, _: &str) -> bool {
        true
    }
}

/// Prompter that declines every confirmation.
pub struct NeverConfirm;

impl Prompter for NeverConfirm {
    fn confirm(&self, _: &str) -> bool {
        false
    }
}
