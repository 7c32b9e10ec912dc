//! Per-type challenge behavior: the initial working answer, the submission
//! confirmation text and the submit mode.

use std::collections::BTreeMap;

use crate::model::{Answer, Challenge, ChallengeBody, SubmissionData};
use crate::validation::unanswered_questions;

/// Language assumed for code challenges that do not name one.
pub const DEFAULT_LANGUAGE: &str = "javascript";

/// How a submission was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// Candidate-initiated; requires confirmation.
    Manual,
    /// Triggered by the time limit; skips confirmation.
    Auto,
}

impl SubmitMode {
    pub fn is_auto(self) -> bool {
        self == SubmitMode::Auto
    }
}

/// Language of a code challenge, falling back to [`DEFAULT_LANGUAGE`].
pub fn language_of(challenge: &Challenge) -> String {
    match &challenge.body {
        ChallengeBody::Code {
            language: Some(language),
            ..
        } if !language.is_empty() => language.clone(),
        ChallengeBody::Code { files, .. } => files
            .values()
            .map(|f| f.language.as_str())
            .find(|l| !l.is_empty() && *l != "plaintext")
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string(),
        _ => DEFAULT_LANGUAGE.to_string(),
    }
}

/// The answer a fresh challenge starts with: starter files for code, empty
/// text for open-ended, no selections for multiple-choice.
pub fn starter_answer(challenge: &Challenge) -> Answer {
    match &challenge.body {
        ChallengeBody::Code { files, .. } => Answer::Code {
            files: files
                .iter()
                .map(|(path, file)| (path.clone(), file.content.clone()))
                .collect(),
            language: language_of(challenge),
        },
        ChallengeBody::OpenEnded => Answer::OpenEnded {
            answer: String::new(),
        },
        ChallengeBody::MultipleChoice { .. } => Answer::MultipleChoice {
            answers: BTreeMap::new(),
        },
    }
}

/// The answer shown when a challenge is opened: the stored submission when it
/// has the right type, otherwise the starter answer.
pub fn working_answer(challenge: &Challenge, stored: Option<&SubmissionData>) -> Answer {
    match stored {
        Some(submission) if submission.kind() == challenge.kind() => {
            let mut answer = submission.answer.clone();
            // Older stored code drafts carry no language.
            if let Answer::Code { language, .. } = &mut answer {
                if language.is_empty() {
                    *language = language_of(challenge);
                }
            }
            answer
        }
        Some(submission) => {
            tracing::warn!(
                challenge = %challenge.id,
                stored = %submission.kind(),
                expected = %challenge.kind(),
                "ignoring stored answer of the wrong type"
            );
            starter_answer(challenge)
        }
        None => starter_answer(challenge),
    }
}

/// Text of the confirmation asked before a manual submission.
pub fn confirmation_message(challenge: &Challenge, answer: &Answer) -> String {
    let unanswered = unanswered_questions(challenge, answer);
    if unanswered > 0 {
        let plural = if unanswered == 1 { "" } else { "s" };
        return format!(
            "You have {unanswered} unanswered question{plural}. Are you sure you want to submit?"
        );
    }
    "Are you sure you want to submit this challenge? You cannot modify your answer after submission."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CodeFile, Question, QuestionOption};
    use chrono::Utc;

    fn code_challenge(language: Option<&str>) -> Challenge {
        let mut files = BTreeMap::new();
        files.insert(
            "App.jsx".to_string(),
            CodeFile {
                content: "export default function App() {}".into(),
                language: "javascript".into(),
            },
        );
        Challenge {
            id: "challenge-1".into(),
            title: "React Component Implementation".into(),
            description: String::new(),
            instructions: String::new(),
            time_limit: Some(60),
            body: ChallengeBody::Code {
                language: language.map(String::from),
                files,
            },
        }
    }

    fn quiz() -> Challenge {
        let question = |id: &str| Question {
            id: id.into(),
            question: format!("Question {id}"),
            options: vec![
                QuestionOption {
                    id: "A".into(),
                    text: "a".into(),
                },
                QuestionOption {
                    id: "B".into(),
                    text: "b".into(),
                },
            ],
            correct_answer: None,
            explanation: None,
        };
        Challenge {
            id: "challenge-3".into(),
            title: "JavaScript Knowledge Quiz".into(),
            description: String::new(),
            instructions: String::new(),
            time_limit: Some(25),
            body: ChallengeBody::MultipleChoice {
                questions: vec![question("Q1"), question("Q2")],
            },
        }
    }

    #[test]
    fn code_starter_uses_file_contents() {
        let answer = starter_answer(&code_challenge(Some("typescript")));
        let Answer::Code { files, language } = answer else {
            panic!("expected code answer");
        };
        assert_eq!(language, "typescript");
        assert_eq!(files["App.jsx"], "export default function App() {}");
    }

    #[test]
    fn code_language_falls_back_to_files_then_default() {
        assert_eq!(language_of(&code_challenge(None)), "javascript");
        let mut challenge = code_challenge(None);
        if let ChallengeBody::Code { files, .. } = &mut challenge.body {
            files.clear();
        }
        assert_eq!(language_of(&challenge), DEFAULT_LANGUAGE);
    }

    #[test]
    fn stored_answer_wins_when_type_matches() {
        let challenge = quiz();
        let stored = SubmissionData::new(
            "challenge-3",
            Answer::MultipleChoice {
                answers: BTreeMap::from([("Q1".to_string(), "B".to_string())]),
            },
            Utc::now(),
        );
        assert_eq!(working_answer(&challenge, Some(&stored)), stored.answer);

        let wrong = SubmissionData::new(
            "challenge-3",
            Answer::OpenEnded {
                answer: "text".into(),
            },
            Utc::now(),
        );
        assert_eq!(
            working_answer(&challenge, Some(&wrong)),
            starter_answer(&challenge)
        );
    }

    #[test]
    fn legacy_code_draft_gets_language() {
        let challenge = code_challenge(Some("javascript"));
        let stored = SubmissionData::new(
            "challenge-1",
            Answer::Code {
                files: BTreeMap::from([("file0".to_string(), "x".to_string())]),
                language: String::new(),
            },
            Utc::now(),
        );
        let Answer::Code { language, .. } = working_answer(&challenge, Some(&stored)) else {
            panic!("expected code answer");
        };
        assert_eq!(language, "javascript");
    }

    #[test]
    fn confirmation_mentions_unanswered_questions() {
        let challenge = quiz();
        let partial = Answer::MultipleChoice {
            answers: BTreeMap::from([("Q1".to_string(), "A".to_string())]),
        };
        let message = confirmation_message(&challenge, &partial);
        assert_eq!(
            message,
            "You have 1 unanswered question. Are you sure you want to submit?"
        );

        let none = starter_answer(&challenge);
        assert!(confirmation_message(&challenge, &none).contains("2 unanswered questions"));
    }

    #[test]
    fn confirmation_for_complete_answer() {
        let challenge = code_challenge(None);
        let message = confirmation_message(&challenge, &starter_answer(&challenge));
        assert!(message.starts_with("Are you sure you want to submit this challenge?"));
    }
}
