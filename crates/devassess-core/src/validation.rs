//! Local validation run before any request leaves the client.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ApiError, ApiResult};
use crate::model::{Answer, Challenge};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// `local@domain.tld` with no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Check login input.
pub fn validate_credentials(name: &str, email: &str, assessment_id: &str) -> ApiResult<()> {
    if name.trim().is_empty() || email.trim().is_empty() || assessment_id.trim().is_empty() {
        return Err(ApiError::validation(
            "Name, email, and assessment ID are required",
        ));
    }
    if !is_valid_email(email.trim()) {
        return Err(ApiError::validation("Invalid email format"));
    }
    Ok(())
}

/// Check that an answer carries the payload its type requires.
pub fn validate_answer(answer: &Answer) -> ApiResult<()> {
    match answer {
        Answer::Code { files, language } => {
            if files.is_empty() || language.trim().is_empty() {
                return Err(ApiError::validation(
                    "Code submission must include files and language",
                ));
            }
        }
        Answer::OpenEnded { answer } => {
            if answer.trim().is_empty() {
                return Err(ApiError::validation(
                    "Open-ended submission must include a non-empty answer",
                ));
            }
        }
        Answer::MultipleChoice { answers } => {
            if answers.is_empty() {
                return Err(ApiError::validation(
                    "Multiple-choice submission must include answers",
                ));
            }
        }
    }
    Ok(())
}

/// Check that `answer` has the same type as `challenge`.
pub fn ensure_kind_matches(challenge: &Challenge, answer: &Answer) -> ApiResult<()> {
    if challenge.kind() != answer.kind() {
        return Err(ApiError::KindMismatch {
            challenge_id: challenge.id.clone(),
            expected: challenge.kind(),
            actual: answer.kind(),
        });
    }
    Ok(())
}

/// Number of questions of `challenge` without a selected option.
pub fn unanswered_questions(challenge: &Challenge, answer: &Answer) -> usize {
    let Answer::MultipleChoice { answers } = answer else {
        return 0;
    };
    challenge
        .questions()
        .iter()
        .filter(|q| !answers.contains_key(&q.id))
        .count()
}
