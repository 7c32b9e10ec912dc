//! Application state, its reducer, and the container that keeps it in sync
//! with the session store.
//!
//! `reduce` is the only place candidate, assessment and submission data are
//! mutated. `StateContainer` hydrates from the store at construction and
//! mirrors every change back to it, excluding the transient loading/error
//! flags.

use std::collections::BTreeSet;

use crate::model::{Assessment, Candidate, Challenge, SubmissionData};
use crate::session_store::{SessionStore, StateUpdate, StoredState, Submissions};

/// The aggregate state rendered by the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssessmentState {
    pub candidate: Option<Candidate>,
    pub assessment: Option<Assessment>,
    pub challenges: Vec<Challenge>,
    pub current_challenge: Option<Challenge>,
    pub loading: bool,
    pub error: Option<String>,
    pub submissions: Submissions,
    pub completed_challenges: BTreeSet<String>,
}

impl AssessmentState {
    fn from_stored(stored: StoredState) -> Self {
        Self {
            candidate: stored.candidate,
            assessment: stored.assessment,
            challenges: stored.challenges,
            current_challenge: stored.current_challenge,
            loading: false,
            error: None,
            submissions: stored.submissions,
            completed_challenges: stored.completed_challenges,
        }
    }

    /// The persisted projection of this state.
    pub fn persisted(&self) -> StateUpdate<'_> {
        StateUpdate {
            candidate: self.candidate.as_ref(),
            assessment: self.assessment.as_ref(),
            challenges: Some(&self.challenges),
            submissions: Some(&self.submissions),
            completed_challenges: Some(&self.completed_challenges),
            current_challenge: self.current_challenge.as_ref(),
        }
    }

    pub fn is_completed(&self, challenge_id: &str) -> bool {
        self.completed_challenges.contains(challenge_id)
    }

    /// Completed challenges among the loaded challenge list.
    pub fn completed_count(&self) -> usize {
        self.challenges
            .iter()
            .filter(|c| self.is_completed(&c.id))
            .count()
    }

    pub fn submission(&self, challenge_id: &str) -> Option<&SubmissionData> {
        self.submissions.get(challenge_id)
    }

    pub fn challenge(&self, challenge_id: &str) -> Option<&Challenge> {
        match &self.current_challenge {
            Some(current) if current.id == challenge_id => Some(current),
            _ => self.challenges.iter().find(|c| c.id == challenge_id),
        }
    }
}

/// State transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetLoading(bool),
    /// Also clears `loading`.
    SetError(String),
    ClearError,
    SetCandidate(Candidate),
    SetAssessment(Assessment),
    SetChallenges(Vec<Challenge>),
    SetCurrentChallenge(Option<Challenge>),
    /// Insert or overwrite; does not mark completion.
    UpdateSubmission {
        challenge_id: String,
        submission: SubmissionData,
    },
    /// Idempotent.
    CompleteChallenge {
        challenge_id: String,
    },
    ResetAssessment,
}

impl Action {
    /// Actions that only touch `loading`/`error`.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Action::SetLoading(_) | Action::SetError(_) | Action::ClearError
        )
    }
}

/// Apply `action` to `state`.
pub fn reduce(mut state: AssessmentState, action: Action) -> AssessmentState {
    match action {
        Action::SetLoading(loading) => state.loading = loading,
        Action::SetError(message) => {
            state.error = Some(message);
            state.loading = false;
        }
        Action::ClearError => state.error = None,
        Action::SetCandidate(candidate) => state.candidate = Some(candidate),
        Action::SetAssessment(assessment) => state.assessment = Some(assessment),
        Action::SetChallenges(challenges) => state.challenges = challenges,
        Action::SetCurrentChallenge(challenge) => state.current_challenge = challenge,
        Action::UpdateSubmission {
            challenge_id,
            submission,
        } => {
            state.submissions.insert(challenge_id, submission);
        }
        Action::CompleteChallenge { challenge_id } => {
            state.completed_challenges.insert(challenge_id);
        }
        Action::ResetAssessment => return AssessmentState::default(),
    }
    state
}

/// Owner of the application state and its persistence.
pub struct StateContainer {
    state: AssessmentState,
    store: SessionStore,
}

impl StateContainer {
    /// Build the initial state from `store`. Stored data is adopted only when
    /// a stored candidate exists.
    pub fn hydrate(store: SessionStore) -> Self {
        let stored = store.load_app_state();
        let state = if stored.candidate.is_some() {
            tracing::debug!(
                submissions = stored.submissions.len(),
                completed = stored.completed_challenges.len(),
                "resumed stored session"
            );
            AssessmentState::from_stored(stored)
        } else {
            AssessmentState::default()
        };
        Self { state, store }
    }

    pub fn state(&self) -> &AssessmentState {
        &self.state
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Apply `action` and mirror the result to the store.
    pub fn dispatch(&mut self, action: Action) {
        tracing::trace!(?action, "dispatch");
        if action == Action::ResetAssessment {
            self.store.clear_session();
            self.state = AssessmentState::default();
            return;
        }

        let transient = action.is_transient();
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
        if !transient {
            self.persist();
        }
    }

    fn persist(&self) {
        self.store.save_app_state(self.state.persisted());
        if self.state.current_challenge.is_none() {
            self.store.clear_current_challenge();
        }
    }
}
