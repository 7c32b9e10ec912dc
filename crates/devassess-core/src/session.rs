//! The assessment session: login, challenge loading, drafting, submission
//! and finalization on top of an `AssessmentApi` and the state container.
//!
//! All methods take `&self`; the state lives behind a mutex that is never
//! held across an `.await`. A per-challenge in-flight set guarantees that a
//! manual submit and a timer-triggered auto-submit of the same challenge can
//! never both reach the backend.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::instrument;

use crate::challenge::{self, SubmitMode};
use crate::clock::Clock;
use crate::error::{ApiError, ApiResult};
use crate::model::{Answer, Assessment, Candidate, Challenge, SessionInfo, SubmissionData};
use crate::session_store::SessionStore;
use crate::state::{Action, AssessmentState, StateContainer};
use crate::traits::{
    AlwaysConfirm, AssessmentApi, AssessmentReceipt, AssessmentSubmission, AuthRequest,
    ChallengeSubmission, Prompter, SubmissionReceipt,
};
use crate::validation;

/// Result of a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted(SubmissionReceipt),
    /// The candidate declined the confirmation; nothing changed.
    Cancelled,
}

/// A challenge as opened for work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedChallenge {
    pub challenge: Challenge,
    /// Stored draft or starter answer.
    pub answer: Answer,
    /// Read-only when true.
    pub completed: bool,
}

/// One candidate's run through an assessment.
pub struct AssessmentSession {
    api: Arc<dyn AssessmentApi>,
    clock: Arc<dyn Clock>,
    container: Mutex<StateContainer>,
    in_flight: Mutex<HashSet<String>>,
}

impl AssessmentSession {
    /// Hydrate from `store` and reinstall the stored token, if any.
    pub fn new(api: Arc<dyn AssessmentApi>, store: SessionStore, clock: Arc<dyn Clock>) -> Self {
        let container = StateContainer::hydrate(store);
        if let Some(candidate) = &container.state().candidate {
            api.set_token(Some(candidate.token.clone()));
        }
        Self {
            api,
            clock,
            container: Mutex::new(container),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    fn container(&self) -> MutexGuard<'_, StateContainer> {
        self.container.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AssessmentState {
        self.container().state().clone()
    }

    pub fn dispatch(&self, action: Action) {
        self.container().dispatch(action);
    }

    pub fn candidate(&self) -> Option<Candidate> {
        self.container().state().candidate.clone()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn api(&self) -> &Arc<dyn AssessmentApi> {
        &self.api
    }

    /// Remaining seconds of the stored candidate, if any.
    pub fn remaining_seconds(&self) -> Option<u64> {
        self.candidate()
            .map(|c| c.remaining_seconds(self.clock.now()))
    }

    // -----------------------------------------------------------------------
    // Login and session checks
    // -----------------------------------------------------------------------

    /// Log the candidate in, resuming a stored session for the same person and
    /// assessment instead of authenticating again.
    #[instrument(skip(self, name, email))]
    pub async fn authenticate_candidate(
        &self,
        name: &str,
        email: &str,
        assessment_id: &str,
    ) -> ApiResult<Candidate> {
        let (name, email, assessment_id) = (name.trim(), email.trim(), assessment_id.trim());
        validation::validate_credentials(name, email, assessment_id)?;

        if let Some(stored) = self.candidate() {
            if stored.matches(name, email, assessment_id) {
                if stored.is_expired(self.clock.now()) {
                    tracing::info!("stored session has expired");
                    self.dispatch(Action::ResetAssessment);
                    self.api.set_token(None);
                    return Err(ApiError::SessionExpired);
                }
                tracing::info!(candidate = %stored.id, "resuming stored session");
                self.api.set_token(Some(stored.token.clone()));
                return Ok(stored);
            }
            tracing::info!("stored session belongs to another login, discarding it");
            self.dispatch(Action::ResetAssessment);
            self.api.set_token(None);
        }

        let request = AuthRequest {
            name: name.to_string(),
            email: email.to_string(),
            assessment_id: assessment_id.to_string(),
        };
        let response = self.api.authenticate(&request).await.inspect_err(|e| {
            tracing::error!("authentication failed: {e}");
        })?;

        let candidate = Candidate {
            id: response.candidate_id,
            name: response.name,
            email: response.email,
            assessment_id: response.assessment_id,
            token: response.token,
            time_limit: response.time_limit,
            started_at: response.started_at.unwrap_or_else(|| self.clock.now()),
        };
        self.api.set_token(Some(candidate.token.clone()));
        self.dispatch(Action::SetCandidate(candidate.clone()));
        tracing::info!(candidate = %candidate.id, "candidate authenticated");
        Ok(candidate)
    }

    /// Live session view for `assessment_id`, optionally checked against
    /// `email`.
    pub fn get_assessment_session(
        &self,
        assessment_id: &str,
        email: Option<&str>,
    ) -> ApiResult<SessionInfo> {
        let candidate = self
            .candidate()
            .filter(|c| c.assessment_id == assessment_id)
            .filter(|c| email.map_or(true, |e| c.email.eq_ignore_ascii_case(e)))
            .ok_or(ApiError::NoSession)?;
        Ok(SessionInfo::from_candidate(&candidate, self.clock.now()))
    }

    /// The candidate of a valid, unexpired session for `assessment_id`.
    pub fn require_session(&self, assessment_id: &str) -> ApiResult<Candidate> {
        let state = self.state();
        let candidate = state
            .candidate
            .filter(|c| c.assessment_id == assessment_id)
            .ok_or(ApiError::NoSession)?;
        if state
            .assessment
            .as_ref()
            .is_some_and(|a| a.id != candidate.assessment_id)
        {
            return Err(ApiError::NoSession);
        }
        if candidate.is_expired(self.clock.now()) {
            return Err(ApiError::SessionExpired);
        }
        Ok(candidate)
    }

    /// True when a route for `assessment_id` may be shown.
    pub fn has_valid_session(&self, assessment_id: &str) -> bool {
        self.require_session(assessment_id).is_ok()
    }

    fn active_candidate(&self) -> ApiResult<Candidate> {
        self.candidate().ok_or(ApiError::NoSession)
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn load_assessment(&self, assessment_id: &str) -> ApiResult<Assessment> {
        self.dispatch(Action::ClearError);
        self.dispatch(Action::SetLoading(true));
        match self.api.get_assessment(assessment_id).await {
            Ok(assessment) => {
                self.dispatch(Action::SetAssessment(assessment.clone()));
                self.dispatch(Action::SetLoading(false));
                Ok(assessment)
            }
            Err(e) => {
                tracing::error!("failed to load assessment: {e}");
                self.dispatch(Action::SetError(e.to_string()));
                Err(e)
            }
        }
    }

    /// Fetch the challenge list of the candidate's assessment.
    #[instrument(skip(self))]
    pub async fn load_challenges(&self) -> ApiResult<Vec<Challenge>> {
        let candidate = self.active_candidate()?;
        self.dispatch(Action::SetLoading(true));
        match self.api.get_challenges(&candidate.assessment_id).await {
            Ok(challenges) => {
                tracing::debug!(count = challenges.len(), "loaded challenges");
                self.dispatch(Action::SetChallenges(challenges.clone()));
                self.dispatch(Action::SetLoading(false));
                Ok(challenges)
            }
            Err(e) => {
                tracing::error!("failed to load challenges: {e}");
                self.dispatch(Action::SetError(e.to_string()));
                Err(e)
            }
        }
    }

    /// Fetch a challenge, make it current and pick its working answer.
    #[instrument(skip(self))]
    pub async fn open_challenge(&self, challenge_id: &str) -> ApiResult<OpenedChallenge> {
        self.active_candidate()?;
        self.dispatch(Action::SetLoading(true));
        let challenge = match self.api.get_challenge_details(challenge_id).await {
            Ok(challenge) => challenge,
            Err(e) => {
                tracing::error!("failed to load challenge: {e}");
                self.dispatch(Action::SetError(e.to_string()));
                return Err(e);
            }
        };

        let mut container = self.container();
        container.dispatch(Action::SetCurrentChallenge(Some(challenge.clone())));
        container.dispatch(Action::SetLoading(false));
        let state = container.state();
        let answer = challenge::working_answer(&challenge, state.submission(challenge_id));
        let completed = state.is_completed(challenge_id);
        Ok(OpenedChallenge {
            challenge,
            answer,
            completed,
        })
    }

    async fn challenge_for(&self, challenge_id: &str) -> ApiResult<Challenge> {
        let current = self
            .container()
            .state()
            .current_challenge
            .clone()
            .filter(|c| c.id == challenge_id);
        match current {
            Some(challenge) => Ok(challenge),
            None => self.api.get_challenge_details(challenge_id).await,
        }
    }

    // -----------------------------------------------------------------------
    // Drafts and submissions
    // -----------------------------------------------------------------------

    /// Record a working answer without submitting it.
    pub fn save_draft(&self, challenge_id: &str, answer: Answer) -> ApiResult<()> {
        self.active_candidate()?;
        let mut container = self.container();
        let state = container.state();
        if state.is_completed(challenge_id) {
            return Err(ApiError::AlreadySubmitted(challenge_id.to_string()));
        }
        if let Some(challenge) = state.challenge(challenge_id) {
            validation::ensure_kind_matches(challenge, &answer)?;
        }
        let submission = SubmissionData::new(challenge_id, answer, self.clock.now());
        container.dispatch(Action::UpdateSubmission {
            challenge_id: challenge_id.to_string(),
            submission,
        });
        tracing::debug!(challenge = challenge_id, "draft saved");
        Ok(())
    }

    /// Completion is recorded before an `InFlight` is released, so checking it
    /// with the in-flight set held leaves no gap between the two.
    fn begin_submission(&self, challenge_id: &str) -> ApiResult<InFlight<'_>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if self.container().state().is_completed(challenge_id) {
            return Err(ApiError::AlreadySubmitted(challenge_id.to_string()));
        }
        if !in_flight.insert(challenge_id.to_string()) {
            return Err(ApiError::SubmissionInFlight(challenge_id.to_string()));
        }
        Ok(InFlight {
            set: &self.in_flight,
            challenge_id: challenge_id.to_string(),
        })
    }

    /// Submit `answer` for `challenge_id`.
    ///
    /// Manual submissions ask `prompter` first and require an unexpired
    /// session; auto submissions skip both. On success the answer is recorded
    /// and the challenge marked completed. On failure nothing changes.
    #[instrument(skip(self, answer, prompter))]
    pub async fn submit_challenge(
        &self,
        challenge_id: &str,
        answer: Answer,
        mode: SubmitMode,
        prompter: &dyn Prompter,
    ) -> ApiResult<SubmitOutcome> {
        let candidate = self.active_candidate()?;
        if !mode.is_auto() && candidate.is_expired(self.clock.now()) {
            return Err(ApiError::SessionExpired);
        }
        if self.container().state().is_completed(challenge_id) {
            return Err(ApiError::AlreadySubmitted(challenge_id.to_string()));
        }

        validation::validate_answer(&answer)?;
        let challenge = self.challenge_for(challenge_id).await?;
        validation::ensure_kind_matches(&challenge, &answer)?;

        if !mode.is_auto() && !prompter.confirm(&challenge::confirmation_message(&challenge, &answer))
        {
            tracing::info!(challenge = challenge_id, "submission cancelled");
            return Ok(SubmitOutcome::Cancelled);
        }

        let _guard = self.begin_submission(challenge_id)?;
        let submission = ChallengeSubmission {
            challenge_id: challenge_id.to_string(),
            assessment_id: candidate.assessment_id.clone(),
            candidate_name: candidate.name.clone(),
            candidate_email: candidate.email.clone(),
            answer: answer.clone(),
            timestamp: self.clock.now(),
            auto_submit: mode.is_auto(),
        };
        let receipt = self.api.submit_challenge(&submission).await.inspect_err(|e| {
            tracing::error!("challenge submission failed: {e}");
        })?;

        let mut container = self.container();
        container.dispatch(Action::UpdateSubmission {
            challenge_id: challenge_id.to_string(),
            submission: SubmissionData {
                challenge_id: challenge_id.to_string(),
                answer,
                timestamp: submission.timestamp,
                auto_submit: mode.is_auto(),
            },
        });
        container.dispatch(Action::CompleteChallenge {
            challenge_id: challenge_id.to_string(),
        });
        tracing::info!(
            challenge = challenge_id,
            submission = %receipt.submission_id,
            "challenge submitted"
        );
        Ok(SubmitOutcome::Submitted(receipt))
    }

    /// Finalize the assessment and clear the session.
    #[instrument(skip(self))]
    pub async fn finalize_assessment(&self) -> ApiResult<AssessmentReceipt> {
        let candidate = self.active_candidate()?;
        let request = AssessmentSubmission {
            assessment_id: candidate.assessment_id.clone(),
            candidate_name: candidate.name.clone(),
            candidate_email: candidate.email.clone(),
        };
        let receipt = self.api.submit_assessment(&request).await.inspect_err(|e| {
            tracing::error!("assessment submission failed: {e}");
        })?;
        self.dispatch(Action::ResetAssessment);
        self.api.set_token(None);
        tracing::info!(submission = %receipt.submission_id, "assessment finalized");
        Ok(receipt)
    }

    /// Time-limit handler: submit every pending draft (current challenge
    /// first), then finalize. Drafts that fail local validation are skipped.
    #[instrument(skip(self))]
    pub async fn auto_submit_on_expiry(&self) -> ApiResult<AssessmentReceipt> {
        self.active_candidate()?;
        let pending = self.pending_drafts();
        for (challenge_id, answer) in pending {
            if let Err(e) = validation::validate_answer(&answer) {
                tracing::warn!(challenge = %challenge_id, "skipping draft: {e}");
                continue;
            }
            match self
                .submit_challenge(&challenge_id, answer, SubmitMode::Auto, &AlwaysConfirm)
                .await
            {
                Ok(_) => {}
                Err(ApiError::AlreadySubmitted(_)) | Err(ApiError::SubmissionInFlight(_)) => {
                    tracing::debug!(challenge = %challenge_id, "already handled");
                }
                Err(ApiError::KindMismatch { .. }) => {
                    tracing::warn!(challenge = %challenge_id, "skipping draft of the wrong type");
                }
                Err(e) => return Err(e),
            }
        }
        self.finalize_assessment().await
    }

    fn pending_drafts(&self) -> Vec<(String, Answer)> {
        let container = self.container();
        let state = container.state();
        let current = state.current_challenge.as_ref().map(|c| c.id.as_str());
        let mut pending: Vec<(String, Answer)> = state
            .submissions
            .iter()
            .filter(|(id, _)| !state.is_completed(id))
            .map(|(id, s)| (id.clone(), s.answer.clone()))
            .collect();
        pending.sort_by(|(a, _), (b, _)| {
            (Some(a.as_str()) != current, a).cmp(&(Some(b.as_str()) != current, b))
        });
        pending
    }

    /// Forget the candidate and everything stored for them.
    pub fn logout(&self) {
        self.dispatch(Action::ResetAssessment);
        self.api.set_token(None);
        tracing::info!("logged out");
    }
}

/// Marks a challenge as having a submission in flight until dropped.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    challenge_id: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.challenge_id);
    }
}
