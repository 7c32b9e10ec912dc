//! Wire DTOs and the response envelope.
//!
//! Every backend response is wrapped as
//! `{response_schema: {response_code, response_message}, response_output: {detail | content}}`.
//! Authentication additionally tolerates the older `response_detail` and
//! `response_detail.detail` placements.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use devassess_core::error::{ApiError, ApiResult};
use devassess_core::model::{
    Answer, Assessment, Challenge, ChallengeBody, ChallengeKind, CodeFile, Question,
    QuestionOption,
};
use devassess_core::traits::{AuthResponse, ChallengeSubmission};

/// Language given to raw-string files when neither file nor challenge names one.
const PLAINTEXT: &str = "plaintext";

#[derive(Debug, Default, Deserialize)]
pub struct ResponseSchema {
    #[serde(default)]
    pub response_code: Option<Value>,
    #[serde(default)]
    pub response_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseOutput {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub content: Option<Value>,
}

/// The response envelope.
#[derive(Debug, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub response_schema: Option<ResponseSchema>,
    #[serde(default)]
    pub response_output: Option<ResponseOutput>,
    #[serde(default)]
    pub response_detail: Option<Value>,
}

impl Envelope {
    /// Response code as text; numeric codes are stringified.
    pub fn code(&self) -> Option<String> {
        match self.response_schema.as_ref()?.response_code.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.response_schema
            .as_ref()?
            .response_message
            .as_deref()
            .filter(|m| !m.is_empty())
    }

    /// A missing code counts as success; otherwise 2xx-style codes and
    /// `success`/`ok` do.
    pub fn is_success(&self) -> bool {
        match self.code() {
            None => true,
            Some(code) => {
                code.starts_with('2')
                    || code.eq_ignore_ascii_case("success")
                    || code.eq_ignore_ascii_case("ok")
            }
        }
    }

    fn rejection(&self, fallback: &str) -> ApiError {
        ApiError::Rejected {
            code: self.code().unwrap_or_else(|| "UNKNOWN".to_string()),
            message: self.message().unwrap_or(fallback).to_string(),
        }
    }

    fn decode<T: DeserializeOwned>(value: Value, what: &str) -> ApiResult<T> {
        serde_json::from_value(value)
            .map_err(|e| ApiError::MalformedResponse(format!("{what}: {e}")))
    }

    /// `response_output.detail`, decoded.
    pub fn into_detail<T: DeserializeOwned>(self, what: &str) -> ApiResult<T> {
        if !self.is_success() {
            return Err(self.rejection(&format!("Failed to load {what}")));
        }
        let detail = self
            .response_output
            .as_ref()
            .and_then(|o| o.detail.clone())
            .filter(|d| !d.is_null());
        match detail {
            Some(detail) => Self::decode(detail, what),
            None => Err(self.rejection(&format!("Failed to load {what}"))),
        }
    }

    /// `response_output.content`, decoded. The content must be an array.
    pub fn into_content<T: DeserializeOwned>(self, what: &str) -> ApiResult<Vec<T>> {
        if !self.is_success() {
            return Err(self.rejection(&format!("Failed to load {what}")));
        }
        let content = self
            .response_output
            .as_ref()
            .and_then(|o| o.content.clone())
            .filter(Value::is_array);
        match content {
            Some(content) => Self::decode(content, what),
            None => Err(self.rejection(&format!("Failed to load {what}"))),
        }
    }

    /// The authentication detail from whichever placement carries it.
    pub fn into_auth_detail(self) -> ApiResult<AuthDetail> {
        let from_output = self
            .response_output
            .as_ref()
            .and_then(|o| o.detail.clone())
            .filter(|d| !d.is_null());
        let from_legacy = self.response_detail.clone().map(|rd| match rd {
            Value::Object(ref map) if map.get("detail").is_some_and(Value::is_object) => {
                map["detail"].clone()
            }
            other => other,
        });

        let Some(raw) = from_output.or(from_legacy) else {
            return Err(self.rejection("Authentication failed"));
        };
        let detail: AuthDetail = Self::decode(raw, "authentication")?;
        if !detail.success || !self.is_success() {
            return Err(self.rejection("Authentication failed"));
        }
        Ok(detail)
    }
}

// ---------------------------------------------------------------------------
// Response details
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct AuthDetail {
    #[serde(default = "default_true")]
    pub success: bool,
    pub candidate_id: String,
    pub name: String,
    pub email: String,
    pub assessment_id: String,
    pub token: String,
    pub time_limit_minutes: u32,
    #[serde(default)]
    pub start_at: Option<String>,
}

impl From<AuthDetail> for AuthResponse {
    fn from(detail: AuthDetail) -> Self {
        let started_at = detail.start_at.as_deref().and_then(|raw| {
            raw.parse::<DateTime<Utc>>()
                .inspect_err(|e| tracing::warn!("ignoring unparsable start_at {raw:?}: {e}"))
                .ok()
        });
        AuthResponse {
            candidate_id: detail.candidate_id,
            name: detail.name,
            email: detail.email,
            assessment_id: detail.assessment_id,
            token: detail.token,
            time_limit: detail.time_limit_minutes,
            started_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AssessmentDetail {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default)]
    pub time_limit: Option<u32>,
}

impl From<AssessmentDetail> for Assessment {
    fn from(detail: AssessmentDetail) -> Self {
        Assessment {
            id: detail.id,
            title: detail.title,
            description: detail.description,
            challenges: detail.challenges,
            time_limit: detail.time_limit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChallengeSummaryDto {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ChallengeKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub time_limit: Option<u32>,
}

impl From<ChallengeSummaryDto> for Challenge {
    fn from(dto: ChallengeSummaryDto) -> Self {
        let body = match dto.kind {
            ChallengeKind::Code => ChallengeBody::Code {
                language: None,
                files: BTreeMap::new(),
            },
            ChallengeKind::OpenEnded => ChallengeBody::OpenEnded,
            ChallengeKind::MultipleChoice => ChallengeBody::MultipleChoice { questions: vec![] },
        };
        Challenge {
            id: dto.id,
            title: dto.title,
            description: dto.description,
            instructions: String::new(),
            time_limit: dto.time_limit,
            body,
        }
    }
}

/// A file is either `{content, language}` or a bare content string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FileDto {
    Full {
        content: String,
        #[serde(default)]
        language: Option<String>,
    },
    Raw(String),
}

#[derive(Debug, Deserialize)]
pub struct OptionDto {
    pub id: Value,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionDto {
    pub id: Value,
    pub question: String,
    #[serde(default)]
    pub options: Vec<OptionDto>,
    #[serde(default, alias = "correctAnswer")]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChallengeDetailDto {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ChallengeKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub time_limit: Option<u32>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub files: BTreeMap<String, FileDto>,
    #[serde(default)]
    pub questions: Vec<QuestionDto>,
}

/// Ids may arrive as strings or numbers.
fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl From<ChallengeDetailDto> for Challenge {
    fn from(dto: ChallengeDetailDto) -> Self {
        let body = match dto.kind {
            ChallengeKind::Code => {
                let fallback = dto.language.clone().unwrap_or_else(|| PLAINTEXT.to_string());
                let files = dto
                    .files
                    .into_iter()
                    .map(|(path, file)| {
                        let file = match file {
                            FileDto::Full { content, language } => CodeFile {
                                content,
                                language: language.unwrap_or_else(|| fallback.clone()),
                            },
                            FileDto::Raw(content) => CodeFile {
                                content,
                                language: fallback.clone(),
                            },
                        };
                        (path, file)
                    })
                    .collect();
                ChallengeBody::Code {
                    language: dto.language,
                    files,
                }
            }
            ChallengeKind::OpenEnded => ChallengeBody::OpenEnded,
            ChallengeKind::MultipleChoice => ChallengeBody::MultipleChoice {
                questions: dto
                    .questions
                    .into_iter()
                    .map(|q| Question {
                        id: id_string(&q.id),
                        question: q.question,
                        options: q
                            .options
                            .into_iter()
                            .map(|o| QuestionOption {
                                id: id_string(&o.id),
                                text: o.text,
                            })
                            .collect(),
                        correct_answer: q.correct_answer,
                        explanation: q.explanation,
                    })
                    .collect(),
            },
        };
        Challenge {
            id: dto.id,
            title: dto.title,
            description: dto.description,
            instructions: dto.instructions,
            time_limit: dto.time_limit,
            body,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmissionDetail {
    pub submission_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssessmentSubmissionDetail {
    #[serde(default)]
    pub assessment_id: Option<String>,
    pub submission_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Numeric-looking question ids go out as numbers.
fn question_id_value(id: &str) -> Value {
    match id.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::from(id),
    }
}

/// Body of `POST /challenges/submissions`.
pub fn submission_body(submission: &ChallengeSubmission) -> Value {
    let mut body = json!({ "challenge_id": submission.challenge_id });
    let fields = match &submission.answer {
        Answer::Code { files, language } => json!({ "files": files, "language": language }),
        Answer::OpenEnded { answer } => json!({ "answer": answer }),
        Answer::MultipleChoice { answers } => json!({
            "multiple_choice_answers": answers
                .iter()
                .map(|(question, option)| json!({
                    "question_id": question_id_value(question),
                    "option_id": option,
                }))
                .collect::<Vec<_>>(),
        }),
    };
    if let (Value::Object(body), Value::Object(fields)) = (&mut body, fields) {
        body.extend(fields);
    }
    body
}
