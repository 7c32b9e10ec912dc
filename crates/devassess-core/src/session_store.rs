//! Session persistence facade.
//!
//! Serializes the candidate identity, assessment metadata, challenge list,
//! per-challenge submissions, the completed-challenge set and the current
//! challenge into a `KeyValueStore`, one blob per key. Every read and write
//! is fault tolerant: storage or decoding failures are logged and degrade to
//! "no data", they never reach the caller.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::model::{Answer, Assessment, Candidate, Challenge, SubmissionData};
use crate::storage::{KeyValueStore, MemoryStore};

/// Storage keys, one per logical entity.
pub mod keys {
    pub const CANDIDATE: &str = "candidate_session";
    pub const ASSESSMENT: &str = "assessment_data";
    pub const CHALLENGES: &str = "challenge_list";
    pub const SUBMISSIONS: &str = "challenge_submissions";
    pub const COMPLETED: &str = "completed_challenges";
    pub const CURRENT_CHALLENGE: &str = "current_challenge";

    pub const ALL: [&str; 6] = [
        CANDIDATE,
        ASSESSMENT,
        CHALLENGES,
        SUBMISSIONS,
        COMPLETED,
        CURRENT_CHALLENGE,
    ];
}

/// Submissions keyed by challenge id.
pub type Submissions = HashMap<String, SubmissionData>;

/// Everything the store knows, as loaded at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredState {
    pub candidate: Option<Candidate>,
    pub assessment: Option<Assessment>,
    pub challenges: Vec<Challenge>,
    pub submissions: Submissions,
    pub completed_challenges: BTreeSet<String>,
    pub current_challenge: Option<Challenge>,
}

/// A partial state to persist; `None` parts are left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateUpdate<'a> {
    pub candidate: Option<&'a Candidate>,
    pub assessment: Option<&'a Assessment>,
    pub challenges: Option<&'a [Challenge]>,
    pub submissions: Option<&'a Submissions>,
    pub completed_challenges: Option<&'a BTreeSet<String>>,
    pub current_challenge: Option<&'a Challenge>,
}

/// Key-value persistence for one candidate session.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("failed to serialize {key}: {e}");
                return;
            }
        };
        match self.backend.set(key, &json) {
            Ok(()) => tracing::debug!(key, bytes = json.len(), "saved session entry"),
            Err(e) => tracing::error!("failed to save {key}: {e}"),
        }
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("failed to read {key}: {e}");
                None
            }
        }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("discarding corrupt {key} entry: {e}");
                None
            }
        }
    }

    fn delete(&self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            tracing::error!("failed to remove {key}: {e}");
        }
    }

    pub fn save_candidate(&self, candidate: &Candidate) {
        self.write(keys::CANDIDATE, candidate);
    }

    /// The stored candidate, or `None` when absent or unreadable.
    pub fn get_candidate(&self) -> Option<Candidate> {
        self.read(keys::CANDIDATE)
    }

    pub fn save_assessment(&self, assessment: &Assessment) {
        self.write(keys::ASSESSMENT, assessment);
    }

    pub fn get_assessment(&self) -> Option<Assessment> {
        self.read(keys::ASSESSMENT)
    }

    pub fn save_challenges(&self, challenges: &[Challenge]) {
        self.write(keys::CHALLENGES, challenges);
    }

    pub fn get_challenges(&self) -> Vec<Challenge> {
        self.read(keys::CHALLENGES).unwrap_or_default()
    }

    pub fn save_submissions(&self, submissions: &Submissions) {
        self.write(keys::SUBMISSIONS, submissions);
    }

    /// Stored submissions. Entries that fail to decode are dropped one by one
    /// so a single bad entry does not lose the others.
    pub fn get_submissions(&self) -> Submissions {
        let Some(entries) = self.read::<BTreeMap<String, Value>>(keys::SUBMISSIONS) else {
            return Submissions::new();
        };
        entries
            .into_iter()
            .filter_map(|(challenge_id, value)| {
                let decoded = decode_submission(&challenge_id, value);
                if decoded.is_none() {
                    tracing::warn!("dropping unreadable submission for {challenge_id}");
                }
                decoded.map(|s| (challenge_id, s))
            })
            .collect()
    }

    /// Stored as a JSON array.
    pub fn save_completed_challenges(&self, completed: &BTreeSet<String>) {
        let ids: Vec<&String> = completed.iter().collect();
        self.write(keys::COMPLETED, &ids);
    }

    pub fn get_completed_challenges(&self) -> BTreeSet<String> {
        self.read::<Vec<String>>(keys::COMPLETED)
            .map(|ids| ids.into_iter().collect())
            .unwrap_or_default()
    }

    pub fn save_current_challenge(&self, challenge: &Challenge) {
        self.write(keys::CURRENT_CHALLENGE, challenge);
    }

    pub fn get_current_challenge(&self) -> Option<Challenge> {
        self.read(keys::CURRENT_CHALLENGE)
    }

    pub fn clear_current_challenge(&self) {
        self.delete(keys::CURRENT_CHALLENGE);
    }

    /// True iff a stored candidate exists for `assessment_id`.
    pub fn has_session_for_assessment(&self, assessment_id: &str) -> bool {
        self.get_candidate()
            .is_some_and(|c| c.assessment_id == assessment_id)
    }

    /// Remove every key.
    pub fn clear_session(&self) {
        for key in keys::ALL {
            self.delete(key);
        }
        tracing::info!("session cleared");
    }

    /// Drop the candidate and their answers, keep assessment metadata.
    pub fn clear_candidate_session(&self) {
        for key in [
            keys::CANDIDATE,
            keys::SUBMISSIONS,
            keys::COMPLETED,
            keys::CURRENT_CHALLENGE,
        ] {
            self.delete(key);
        }
        tracing::info!("candidate session cleared");
    }

    /// Persist the present parts of `update`.
    pub fn save_app_state(&self, update: StateUpdate<'_>) {
        if let Some(candidate) = update.candidate {
            self.save_candidate(candidate);
        }
        if let Some(assessment) = update.assessment {
            self.save_assessment(assessment);
        }
        if let Some(challenges) = update.challenges {
            self.save_challenges(challenges);
        }
        if let Some(submissions) = update.submissions {
            self.save_submissions(submissions);
        }
        if let Some(completed) = update.completed_challenges {
            self.save_completed_challenges(completed);
        }
        if let Some(challenge) = update.current_challenge {
            self.save_current_challenge(challenge);
        }
    }

    pub fn load_app_state(&self) -> StoredState {
        StoredState {
            candidate: self.get_candidate(),
            assessment: self.get_assessment(),
            challenges: self.get_challenges(),
            submissions: self.get_submissions(),
            completed_challenges: self.get_completed_challenges(),
            current_challenge: self.get_current_challenge(),
        }
    }
}

/// Decode one stored submission, accepting the older untyped layouts
/// (plain string, `{answer}`, list of file contents, raw answers map).
fn decode_submission(challenge_id: &str, value: Value) -> Option<SubmissionData> {
    let answer = match value {
        Value::Null => return None,
        Value::Object(ref map) if map.contains_key("type") => {
            return serde_json::from_value(value).ok();
        }
        Value::String(answer) => Answer::OpenEnded { answer },
        Value::Object(map) if map.contains_key("answer") => Answer::OpenEnded {
            answer: match &map["answer"] {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            },
        },
        Value::Array(items) => Answer::Code {
            files: items
                .iter()
                .enumerate()
                .filter_map(|(idx, item)| item.as_str().map(|s| (format!("file{idx}"), s.to_string())))
                .collect(),
            language: String::new(),
        },
        Value::Object(map) => Answer::MultipleChoice {
            answers: map
                .into_iter()
                .filter_map(|(q, o)| o.as_str().map(|o| (q, o.to_string())))
                .collect(),
        },
        _ => return None,
    };
    Some(SubmissionData::new(challenge_id, answer, Utc::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChallengeBody;
    use crate::storage::KeyValueStore;

    fn candidate(assessment_id: &str) -> Candidate {
        Candidate {
            id: "candidate-1".into(),
            name: "John Doe".into(),
            email: "john@example.com".into(),
            assessment_id: assessment_id.into(),
            token: "token-1".into(),
            time_limit: 60,
            started_at: "2025-03-01T10:00:00Z".parse().unwrap(),
        }
    }

    fn assessment() -> Assessment {
        Assessment {
            id: "assessment-123".into(),
            title: "Frontend Developer Assessment".into(),
            description: String::new(),
            challenges: vec!["challenge-1".into()],
            time_limit: None,
        }
    }

    fn store_with_backend() -> (Arc<MemoryStore>, SessionStore) {
        let backend = Arc::new(MemoryStore::new());
        let store = SessionStore::new(backend.clone());
        (backend, store)
    }

    #[test]
    fn save_and_get_candidate() {
        let store = SessionStore::in_memory();
        assert!(store.get_candidate().is_none());
        store.save_candidate(&candidate("assessment-123"));
        assert_eq!(store.get_candidate(), Some(candidate("assessment-123")));
    }

    #[test]
    fn corrupt_candidate_reads_as_none() {
        let (backend, store) = store_with_backend();
        backend.set(keys::CANDIDATE, "{not json").unwrap();
        assert!(store.get_candidate().is_none());
    }

    #[test]
    fn completed_set_round_trips_as_array() {
        let (backend, store) = store_with_backend();
        assert!(store.get_completed_challenges().is_empty());

        let completed: BTreeSet<String> = ["challenge-2", "challenge-1"]
            .into_iter()
            .map(String::from)
            .collect();
        store.save_completed_challenges(&completed);

        let raw = backend.get(keys::COMPLETED).unwrap().unwrap();
        assert_eq!(raw, r#"["challenge-1","challenge-2"]"#);
        assert_eq!(store.get_completed_challenges(), completed);
    }

    #[test]
    fn has_session_for_assessment_follows_candidate() {
        let store = SessionStore::in_memory();
        assert!(!store.has_session_for_assessment("assessment-123"));
        store.save_candidate(&candidate("assessment-123"));
        assert!(store.has_session_for_assessment("assessment-123"));
        assert!(!store.has_session_for_assessment("assessment-999"));
        store.clear_session();
        assert!(!store.has_session_for_assessment("assessment-123"));
    }

    #[test]
    fn clear_candidate_session_keeps_assessment() {
        let store = SessionStore::in_memory();
        store.save_candidate(&candidate("assessment-123"));
        store.save_assessment(&assessment());
        store.save_completed_challenges(&BTreeSet::from(["challenge-1".to_string()]));

        store.clear_candidate_session();

        assert!(store.get_candidate().is_none());
        assert!(store.get_completed_challenges().is_empty());
        assert_eq!(store.get_assessment(), Some(assessment()));
    }

    #[test]
    fn partial_save_leaves_other_keys_untouched() {
        let store = SessionStore::in_memory();
        store.save_assessment(&assessment());
        let c = candidate("assessment-123");
        store.save_app_state(StateUpdate {
            candidate: Some(&c),
            ..Default::default()
        });
        let loaded = store.load_app_state();
        assert_eq!(loaded.candidate, Some(c));
        assert_eq!(loaded.assessment, Some(assessment()));
        assert!(loaded.current_challenge.is_none());
    }

    #[test]
    fn one_bad_submission_does_not_drop_the_rest() {
        let (backend, store) = store_with_backend();
        backend
            .set(
                keys::SUBMISSIONS,
                r#"{
                    "challenge-1": {"challengeId":"challenge-1","type":"open-ended","answer":"ok","timestamp":"2025-03-01T10:00:00Z"},
                    "challenge-2": {"challengeId":"challenge-2","type":"code","timestamp":"bad"},
                    "challenge-3": null
                }"#,
            )
            .unwrap();
        let submissions = store.get_submissions();
        assert_eq!(submissions.len(), 1);
        assert!(submissions.contains_key("challenge-1"));
    }

    #[test]
    fn legacy_untyped_submissions_are_converted() {
        let (backend, store) = store_with_backend();
        backend
            .set(
                keys::SUBMISSIONS,
                r#"{
                    "c-text": "two pointers",
                    "c-obj": {"answer": "hash map"},
                    "c-code": ["const a = 1;", "export default a;"],
                    "c-mc": {"Q1": "B", "Q2": "D"}
                }"#,
            )
            .unwrap();
        let submissions = store.get_submissions();
        assert_eq!(
            submissions["c-text"].answer,
            Answer::OpenEnded {
                answer: "two pointers".into()
            }
        );
        assert_eq!(
            submissions["c-obj"].answer,
            Answer::OpenEnded {
                answer: "hash map".into()
            }
        );
        match &submissions["c-code"].answer {
            Answer::Code { files, .. } => {
                assert_eq!(files["file0"], "const a = 1;");
                assert_eq!(files.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &submissions["c-mc"].answer {
            Answer::MultipleChoice { answers } => assert_eq!(answers["Q2"], "D"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn current_challenge_round_trip_and_clear() {
        let store = SessionStore::in_memory();
        let challenge = Challenge {
            id: "challenge-2".into(),
            title: "Algorithm Problem".into(),
            description: String::new(),
            instructions: "Two sum".into(),
            time_limit: Some(30),
            body: ChallengeBody::OpenEnded,
        };
        store.save_current_challenge(&challenge);
        assert_eq!(store.get_current_challenge(), Some(challenge));
        store.clear_current_challenge();
        assert!(store.get_current_challenge().is_none());
    }
}
