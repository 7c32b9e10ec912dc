//! Core data model types for devassess.
//!
//! These are the types the whole client works with: the candidate identity,
//! the assessment being taken, its challenges, and the candidate's answers.
//! Challenge payloads and answers are tagged by challenge type so that a
//! `code` challenge can never carry a multiple-choice answer map.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock;

/// The person taking the assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Assessment this identity was issued for.
    pub assessment_id: String,
    /// Bearer token sent with every authenticated request.
    pub token: String,
    /// Overall time limit in minutes.
    pub time_limit: u32,
    pub started_at: DateTime<Utc>,
}

impl Candidate {
    /// Seconds left at `now`, derived from `started_at` and `time_limit`.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        clock::remaining_seconds(self.started_at, self.time_limit, now)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining_seconds(now) == 0
    }

    /// True when this identity belongs to the given name/email/assessment triple.
    pub fn matches(&self, name: &str, email: &str, assessment_id: &str) -> bool {
        self.assessment_id == assessment_id
            && self.email.eq_ignore_ascii_case(email)
            && self.name == name
    }
}

/// Metadata for the test being taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Ordered challenge ids.
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default)]
    pub time_limit: Option<u32>,
}

/// The three kinds of challenge an assessment can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChallengeKind {
    Code,
    OpenEnded,
    MultipleChoice,
}

impl fmt::Display for ChallengeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChallengeKind::Code => write!(f, "code"),
            ChallengeKind::OpenEnded => write!(f, "open-ended"),
            ChallengeKind::MultipleChoice => write!(f, "multiple-choice"),
        }
    }
}

impl FromStr for ChallengeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "code" => Ok(ChallengeKind::Code),
            "open-ended" | "open_ended" | "openended" => Ok(ChallengeKind::OpenEnded),
            "multiple-choice" | "multiple_choice" | "mc" => Ok(ChallengeKind::MultipleChoice),
            other => Err(format!("unknown challenge type: {other}")),
        }
    }
}

/// A starter file shipped with a code challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFile {
    pub content: String,
    pub language: String,
}

/// One selectable option of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    /// Only present on authoring/results payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Type-specific challenge payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ChallengeBody {
    Code {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        #[serde(default)]
        files: BTreeMap<String, CodeFile>,
    },
    OpenEnded,
    MultipleChoice {
        #[serde(default)]
        questions: Vec<Question>,
    },
}

impl ChallengeBody {
    pub fn kind(&self) -> ChallengeKind {
        match self {
            ChallengeBody::Code { .. } => ChallengeKind::Code,
            ChallengeBody::OpenEnded => ChallengeKind::OpenEnded,
            ChallengeBody::MultipleChoice { .. } => ChallengeKind::MultipleChoice,
        }
    }
}

/// A unit of work within an assessment.
///
/// Challenge list entries carry an empty payload; the full payload arrives
/// with the challenge detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    /// Per-challenge time limit in minutes.
    #[serde(default)]
    pub time_limit: Option<u32>,
    #[serde(flatten)]
    pub body: ChallengeBody,
}

impl Challenge {
    pub fn kind(&self) -> ChallengeKind {
        self.body.kind()
    }

    /// Questions of a multiple-choice challenge, empty for other kinds.
    pub fn questions(&self) -> &[Question] {
        match &self.body {
            ChallengeBody::MultipleChoice { questions } => questions,
            _ => &[],
        }
    }
}

/// The candidate's answer, tagged by challenge type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Answer {
    Code {
        /// Path to file content.
        files: BTreeMap<String, String>,
        language: String,
    },
    OpenEnded {
        answer: String,
    },
    MultipleChoice {
        /// Question id to selected option id.
        answers: BTreeMap<String, String>,
    },
}

impl Answer {
    pub fn kind(&self) -> ChallengeKind {
        match self {
            Answer::Code { .. } => ChallengeKind::Code,
            Answer::OpenEnded { .. } => ChallengeKind::OpenEnded,
            Answer::MultipleChoice { .. } => ChallengeKind::MultipleChoice,
        }
    }
}

/// The recorded answer for one challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionData {
    pub challenge_id: String,
    #[serde(flatten)]
    pub answer: Answer,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub auto_submit: bool,
}

impl SubmissionData {
    pub fn new(challenge_id: impl Into<String>, answer: Answer, timestamp: DateTime<Utc>) -> Self {
        Self {
            challenge_id: challenge_id.into(),
            answer,
            timestamp,
            auto_submit: false,
        }
    }

    pub fn kind(&self) -> ChallengeKind {
        self.answer.kind()
    }
}

/// Live view of a candidate's session, derived from the stored candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub assessment_id: String,
    pub candidate_id: String,
    pub name: String,
    pub email: String,
    pub time_limit: u32,
    pub started_at: DateTime<Utc>,
    pub remaining_time_seconds: u64,
    pub is_expired: bool,
}

impl SessionInfo {
    pub fn from_candidate(candidate: &Candidate, now: DateTime<Utc>) -> Self {
        let remaining = candidate.remaining_seconds(now);
        Self {
            assessment_id: candidate.assessment_id.clone(),
            candidate_id: candidate.id.clone(),
            name: candidate.name.clone(),
            email: candidate.email.clone(),
            time_limit: candidate.time_limit,
            started_at: candidate.started_at,
            remaining_time_seconds: remaining,
            is_expired: remaining == 0,
        }
    }
}
