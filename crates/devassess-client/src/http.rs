//! HTTP implementation of the assessment API.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{RequestBuilder, Url};
use serde_json::{json, Value};
use tracing::instrument;

use devassess_core::error::{ApiError, ApiResult};
use devassess_core::model::{Assessment, Challenge};
use devassess_core::traits::{
    AssessmentApi, AssessmentReceipt, AssessmentSubmission, AuthRequest, AuthResponse,
    ChallengeSubmission, SubmissionReceipt,
};
use devassess_core::validation;

use crate::dto::{
    submission_body, AssessmentDetail, AssessmentSubmissionDetail, ChallengeDetailDto,
    ChallengeSummaryDto, Envelope, SubmissionDetail,
};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Backend reached over JSON/HTTP.
pub struct HttpApi {
    base_url: Url,
    timeout_secs: u64,
    token: RwLock<Option<String>>,
    client: reqwest::Client,
}

impl HttpApi {
    /// `base_url` may carry trailing slashes; they are ignored.
    pub fn new(base_url: &str, timeout_secs: u64) -> ApiResult<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ApiError::validation(
                "API base URL is not set. Set api_base_url in devassess.toml or DEVASSESS_API_BASE_URL.",
            ));
        }
        let base_url = Url::parse(trimmed)
            .map_err(|e| ApiError::validation(format!("invalid API base URL {trimmed:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::validation(format!(
                "invalid API base URL {trimmed:?}"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            timeout_secs,
            token: RwLock::new(None),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Envelope> {
        let request = match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.timeout_secs)
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !(200..300).contains(&status) {
            let message = serde_json::from_str::<Envelope>(&body)
                .ok()
                .and_then(|env| env.message().map(String::from))
                .unwrap_or(body);
            tracing::debug!(status, "request rejected");
            return Err(ApiError::Http { status, message });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }

    async fn get(&self, segments: &[&str]) -> ApiResult<Envelope> {
        self.send(self.client.get(self.url(segments))).await
    }

    async fn post(&self, segments: &[&str], body: &Value) -> ApiResult<Envelope> {
        self.send(self.client.post(self.url(segments)).json(body)).await
    }
}

#[async_trait]
impl AssessmentApi for HttpApi {
    fn name(&self) -> &str {
        "http"
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = token;
    }

    #[instrument(skip(self, request), fields(assessment = %request.assessment_id))]
    async fn authenticate(&self, request: &AuthRequest) -> ApiResult<AuthResponse> {
        validation::validate_credentials(&request.name, &request.email, &request.assessment_id)?;
        let body = json!({
            "name": request.name,
            "email": request.email,
            "assessment_id": request.assessment_id,
        });
        let envelope = self.post(&["assessments", "authenticate"], &body).await?;
        Ok(envelope.into_auth_detail()?.into())
    }

    #[instrument(skip(self))]
    async fn get_assessment(&self, assessment_id: &str) -> ApiResult<Assessment> {
        let envelope = self.get(&["assessments", assessment_id]).await?;
        let detail: AssessmentDetail = envelope.into_detail("assessment")?;
        Ok(detail.into())
    }

    #[instrument(skip(self))]
    async fn get_challenges(&self, assessment_id: &str) -> ApiResult<Vec<Challenge>> {
        let envelope = self
            .get(&["assessments", assessment_id, "challenges"])
            .await?;
        let list: Vec<ChallengeSummaryDto> = envelope.into_content("challenges")?;
        Ok(list.into_iter().map(Challenge::from).collect())
    }

    #[instrument(skip(self))]
    async fn get_challenge_details(&self, challenge_id: &str) -> ApiResult<Challenge> {
        let envelope = self.get(&["challenges", challenge_id]).await?;
        let detail: ChallengeDetailDto = envelope.into_detail("challenge")?;
        Ok(detail.into())
    }

    #[instrument(skip(self, submission), fields(challenge = %submission.challenge_id))]
    async fn submit_challenge(
        &self,
        submission: &ChallengeSubmission,
    ) -> ApiResult<SubmissionReceipt> {
        validation::validate_answer(&submission.answer)?;
        let envelope = self
            .post(&["challenges", "submissions"], &submission_body(submission))
            .await?;
        let detail: SubmissionDetail = envelope.into_detail("submission")?;
        Ok(SubmissionReceipt {
            submission_id: detail.submission_id,
            timestamp: Utc::now(),
            message: detail
                .message
                .unwrap_or_else(|| "Challenge submitted successfully".to_string()),
        })
    }

    #[instrument(skip(self, submission), fields(assessment = %submission.assessment_id))]
    async fn submit_assessment(
        &self,
        submission: &AssessmentSubmission,
    ) -> ApiResult<AssessmentReceipt> {
        let body = json!({ "assessment_id": submission.assessment_id });
        let envelope = self.post(&["assessments", "submissions"], &body).await?;
        let detail: AssessmentSubmissionDetail = envelope.into_detail("assessment submission")?;
        Ok(AssessmentReceipt {
            assessment_id: detail
                .assessment_id
                .unwrap_or_else(|| submission.assessment_id.clone()),
            submission_id: detail.submission_id,
            timestamp: Utc::now(),
            message: detail
                .message
                .unwrap_or_else(|| "Assessment submitted successfully".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use devassess_core::model::{Answer, ChallengeKind};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ok(output: Value) -> Value {
        json!({
            "response_schema": {"response_code": "200", "response_message": "OK"},
            "response_output": output
        })
    }

    fn submission(answer: Answer) -> ChallengeSubmission {
        ChallengeSubmission {
            challenge_id: "challenge-1".into(),
            assessment_id: "assessment-123".into(),
            candidate_name: "John Doe".into(),
            candidate_email: "john@example.com".into(),
            answer,
            timestamp: Utc::now(),
            auto_submit: false,
        }
    }

    #[test]
    fn base_url_is_required_and_trimmed() {
        assert!(HttpApi::new("", 30).is_err());
        let api = HttpApi::new("http://localhost:8080/api///", 30).unwrap();
        assert_eq!(api.base_url(), "http://localhost:8080/api");
        assert_eq!(
            api.url(&["challenges", "challenge 1"]).as_str(),
            "http://localhost:8080/api/challenges/challenge%201"
        );
    }

    #[tokio::test]
    async fn authenticate_reads_time_limit_and_start() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/assessments/authenticate"))
            .and(body_json(json!({
                "name": "John Doe",
                "email": "john@example.com",
                "assessment_id": "assessment-123"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
                "detail": {
                    "success": true,
                    "candidate_id": "candidate-1",
                    "name": "John Doe",
                    "email": "john@example.com",
                    "assessment_id": "assessment-123",
                    "token": "token-abc",
                    "time_limit_minutes": 60,
                    "start_at": "2025-03-01T10:00:00Z"
                }
            }))))
            .mount(&server)
            .await;

        let api = HttpApi::new(&server.uri(), 30).unwrap();
        let response = api
            .authenticate(&AuthRequest {
                name: "John Doe".into(),
                email: "john@example.com".into(),
                assessment_id: "assessment-123".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.time_limit, 60);
        assert_eq!(response.token, "token-abc");
        assert_eq!(
            response.started_at,
            Some("2025-03-01T10:00:00Z".parse().unwrap())
        );
    }

    #[tokio::test]
    async fn invalid_email_is_rejected_without_a_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let api = HttpApi::new(&server.uri(), 30).unwrap();
        let err = api
            .authenticate(&AuthRequest {
                name: "John Doe".into(),
                email: "john@example".into(),
                assessment_id: "assessment-123".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid email format");
    }

    #[tokio::test]
    async fn bearer_token_is_sent_once_set() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/assessments/assessment-123"))
            .and(header("Authorization", "Bearer token-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
                "detail": {"id": "assessment-123", "title": "Frontend Developer Assessment",
                    "description": "React skills"}
            }))))
            .mount(&server)
            .await;

        let api = HttpApi::new(&server.uri(), 30).unwrap();
        api.set_token(Some("token-abc".into()));
        let assessment = api.get_assessment("assessment-123").await.unwrap();
        assert_eq!(assessment.title, "Frontend Developer Assessment");
    }

    #[tokio::test]
    async fn challenge_list_and_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/assessments/assessment-123/challenges"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
                "content": [
                    {"id": "challenge-1", "title": "React", "type": "code", "description": "d",
                        "time_limit": 60},
                    {"id": "challenge-3", "title": "Quiz", "type": "multiple-choice",
                        "description": "d"}
                ]
            }))))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/challenges/challenge-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
                "detail": {"id": "challenge-1", "title": "React", "type": "code",
                    "description": "d", "instructions": "# Do it", "time_limit": 60,
                    "language": "javascript", "files": {"App.jsx": "export default App;"}}
            }))))
            .mount(&server)
            .await;

        let api = HttpApi::new(&server.uri(), 30).unwrap();
        let list = api.get_challenges("assessment-123").await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].kind(), ChallengeKind::MultipleChoice);
        assert_eq!(list[0].time_limit, Some(60));

        let detail = api.get_challenge_details("challenge-1").await.unwrap();
        assert_eq!(detail.instructions, "# Do it");
        assert_eq!(detail.kind(), ChallengeKind::Code);
    }

    #[tokio::test]
    async fn empty_code_submission_issues_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/challenges/submissions"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let api = HttpApi::new(&server.uri(), 30).unwrap();
        let err = api
            .submit_challenge(&submission(Answer::Code {
                files: BTreeMap::new(),
                language: "javascript".into(),
            }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("must include files"));
    }

    #[tokio::test]
    async fn code_submission_body_and_default_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/challenges/submissions"))
            .and(body_json(json!({
                "challenge_id": "challenge-1",
                "files": {"App.jsx": "done"},
                "language": "javascript"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
                "detail": {"submission_id": "sub-1"}
            }))))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpApi::new(&server.uri(), 30).unwrap();
        let receipt = api
            .submit_challenge(&submission(Answer::Code {
                files: BTreeMap::from([("App.jsx".to_string(), "done".to_string())]),
                language: "javascript".into(),
            }))
            .await
            .unwrap();
        assert_eq!(receipt.submission_id, "sub-1");
        assert_eq!(receipt.message, "Challenge submitted successfully");
    }

    #[tokio::test]
    async fn http_error_carries_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/challenges/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "response_schema": {"response_code": "404", "response_message": "Challenge not found"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/challenges/broken"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let api = HttpApi::new(&server.uri(), 30).unwrap();
        let err = api.get_challenge_details("missing").await.unwrap_err();
        assert_eq!(err.to_string(), "Request failed 404: Challenge not found");
        let err = api.get_challenge_details("broken").await.unwrap_err();
        assert_eq!(err.to_string(), "Request failed 500: internal error");
    }

    #[tokio::test]
    async fn unauthorized_requires_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/assessments/submissions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .mount(&server)
            .await;

        let api = HttpApi::new(&server.uri(), 30).unwrap();
        let err = api
            .submit_assessment(&AssessmentSubmission {
                assessment_id: "assessment-123".into(),
                candidate_name: "John Doe".into(),
                candidate_email: "john@example.com".into(),
            })
            .await
            .unwrap_err();
        assert!(err.requires_login());
    }

    #[tokio::test]
    async fn malformed_body_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/assessments/assessment-123"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let api = HttpApi::new(&server.uri(), 30).unwrap();
        let err = api.get_assessment("assessment-123").await.unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ok(json!({"detail": {"id": "a", "title": "t"}})))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let api = HttpApi::new(&server.uri(), 1).unwrap();
        let err = api.get_assessment("a").await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout(1)));
    }
}
