//! In-memory backend with a sample assessment, for demos and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use devassess_core::error::{ApiError, ApiResult};
use devassess_core::model::{
    Assessment, Challenge, ChallengeBody, CodeFile, Question, QuestionOption,
};
use devassess_core::routes::DEFAULT_ASSESSMENT_ID;
use devassess_core::traits::{
    AssessmentApi, AssessmentReceipt, AssessmentSubmission, AuthRequest, AuthResponse,
    ChallengeSubmission, SubmissionReceipt,
};
use devassess_core::validation;

/// Time limit handed out when the assessment does not define one.
pub const DEFAULT_TIME_LIMIT_MINUTES: u32 = 60;

/// A mock assessment backend.
///
/// Authentication is idempotent per (assessment, email): logging in twice
/// returns the same candidate, token and start time.
pub struct MockApi {
    assessments: HashMap<String, Assessment>,
    challenges: HashMap<String, Challenge>,
    time_limit: u32,
    sessions: Mutex<HashMap<(String, String), AuthResponse>>,
    token: Mutex<Option<String>>,
    call_count: AtomicU32,
    submissions: Mutex<Vec<ChallengeSubmission>>,
    finalized: Mutex<Vec<AssessmentSubmission>>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    /// A backend serving the sample assessment.
    pub fn new() -> Self {
        let challenges: HashMap<String, Challenge> = sample_challenges()
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        let assessment = sample_assessment();
        Self {
            assessments: HashMap::from([(assessment.id.clone(), assessment)]),
            challenges,
            time_limit: DEFAULT_TIME_LIMIT_MINUTES,
            sessions: Mutex::new(HashMap::new()),
            token: Mutex::new(None),
            call_count: AtomicU32::new(0),
            submissions: Mutex::new(Vec::new()),
            finalized: Mutex::new(Vec::new()),
        }
    }

    /// Override the time limit given to new candidates.
    pub fn with_time_limit(mut self, minutes: u32) -> Self {
        self.time_limit = minutes;
        self
    }

    /// Number of API calls made.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Challenge submissions received, in order.
    pub fn submissions(&self) -> Vec<ChallengeSubmission> {
        self.submissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Assessment finalizations received, in order.
    pub fn finalized(&self) -> Vec<AssessmentSubmission> {
        self.finalized
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The bearer token currently installed.
    pub fn token(&self) -> Option<String> {
        self.token.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record_call(&self) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
    }

    fn assessment(&self, assessment_id: &str) -> ApiResult<&Assessment> {
        self.assessments
            .get(assessment_id)
            .ok_or_else(|| ApiError::NotFound("Assessment not found".into()))
    }

    fn challenge(&self, challenge_id: &str) -> ApiResult<&Challenge> {
        self.challenges
            .get(challenge_id)
            .ok_or_else(|| ApiError::NotFound("Challenge not found".into()))
    }
}

/// A challenge list entry: metadata without the type payload.
fn summary(challenge: &Challenge) -> Challenge {
    let body = match &challenge.body {
        ChallengeBody::Code { .. } => ChallengeBody::Code {
            language: None,
            files: BTreeMap::new(),
        },
        ChallengeBody::OpenEnded => ChallengeBody::OpenEnded,
        ChallengeBody::MultipleChoice { .. } => ChallengeBody::MultipleChoice { questions: vec![] },
    };
    Challenge {
        id: challenge.id.clone(),
        title: challenge.title.clone(),
        description: challenge.description.clone(),
        instructions: String::new(),
        time_limit: challenge.time_limit,
        body,
    }
}

#[async_trait]
impl AssessmentApi for MockApi {
    fn name(&self) -> &str {
        "mock"
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = token;
    }

    async fn authenticate(&self, request: &AuthRequest) -> ApiResult<AuthResponse> {
        self.record_call();
        validation::validate_credentials(&request.name, &request.email, &request.assessment_id)?;
        let assessment = self.assessment(&request.assessment_id)?;

        let key = (
            request.assessment_id.clone(),
            request.email.to_ascii_lowercase(),
        );
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let response = sessions.entry(key).or_insert_with(|| AuthResponse {
            candidate_id: format!("candidate-{}", Uuid::new_v4()),
            name: request.name.clone(),
            email: request.email.clone(),
            assessment_id: request.assessment_id.clone(),
            token: format!("token-{}", Uuid::new_v4().simple()),
            time_limit: assessment.time_limit.unwrap_or(self.time_limit),
            started_at: Some(Utc::now()),
        });
        Ok(response.clone())
    }

    async fn get_assessment(&self, assessment_id: &str) -> ApiResult<Assessment> {
        self.record_call();
        self.assessment(assessment_id).cloned()
    }

    async fn get_challenges(&self, assessment_id: &str) -> ApiResult<Vec<Challenge>> {
        self.record_call();
        let assessment = self.assessment(assessment_id)?;
        Ok(assessment
            .challenges
            .iter()
            .filter_map(|id| self.challenges.get(id))
            .map(summary)
            .collect())
    }

    async fn get_challenge_details(&self, challenge_id: &str) -> ApiResult<Challenge> {
        self.record_call();
        self.challenge(challenge_id).cloned()
    }

    async fn submit_challenge(
        &self,
        submission: &ChallengeSubmission,
    ) -> ApiResult<SubmissionReceipt> {
        self.record_call();
        validation::validate_answer(&submission.answer)?;
        self.challenge(&submission.challenge_id)?;
        tracing::debug!(challenge = %submission.challenge_id, "mock submission received");
        self.submissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(submission.clone());
        Ok(SubmissionReceipt {
            submission_id: format!("submission-{}", Uuid::new_v4()),
            timestamp: Utc::now(),
            message: "Challenge submitted successfully".into(),
        })
    }

    async fn submit_assessment(
        &self,
        submission: &AssessmentSubmission,
    ) -> ApiResult<AssessmentReceipt> {
        self.record_call();
        self.assessment(&submission.assessment_id)?;
        self.finalized
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(submission.clone());
        Ok(AssessmentReceipt {
            assessment_id: submission.assessment_id.clone(),
            submission_id: format!("assessment-{}", Uuid::new_v4()),
            timestamp: Utc::now(),
            message: "Assessment submitted successfully".into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Sample data
// ---------------------------------------------------------------------------

fn sample_assessment() -> Assessment {
    Assessment {
        id: DEFAULT_ASSESSMENT_ID.into(),
        title: "Frontend Developer Assessment".into(),
        description: "Complete assessment for frontend developer position".into(),
        challenges: (1..=4).map(|n| format!("challenge-{n}")).collect(),
        time_limit: None,
    }
}

fn js_file(content: &str) -> CodeFile {
    CodeFile {
        content: content.into(),
        language: "javascript".into(),
    }
}

fn question(id: &str, text: &str, options: [&str; 4], correct: &str, explanation: &str) -> Question {
    Question {
        id: id.into(),
        question: text.into(),
        options: ["A", "B", "C", "D"]
            .into_iter()
            .zip(options)
            .map(|(id, text)| QuestionOption {
                id: id.into(),
                text: text.into(),
            })
            .collect(),
        correct_answer: Some(correct.into()),
        explanation: Some(explanation.into()),
    }
}

fn sample_challenges() -> Vec<Challenge> {
    vec![
        Challenge {
            id: "challenge-1".into(),
            title: "React Component Implementation".into(),
            description: "Create a reusable React component that displays a list of users with search functionality.".into(),
            instructions: "# React Component Challenge\n\n\
                Create a UserList component with the following requirements:\n\
                - Display a list of users from props\n\
                - Include search functionality\n\
                - Show user avatar, name, and email\n\
                - Handle loading and empty states\n"
                .into(),
            time_limit: Some(60),
            body: ChallengeBody::Code {
                language: Some("javascript".into()),
                files: BTreeMap::from([
                    (
                        "UserList.jsx".to_string(),
                        js_file(
                            "// Implement your UserList component here\n\n\
                             const UserList = ({ users }) => {\n  return (\n    <div>\n      {/* Your implementation here */}\n    </div>\n  );\n};\n\n\
                             export default UserList;",
                        ),
                    ),
                    (
                        "App.jsx".to_string(),
                        js_file(
                            "import UserList from './UserList';\n\n\
                             const users = [\n  { id: 1, name: 'John Doe', email: 'john@example.com' },\n  { id: 2, name: 'Jane Smith', email: 'jane@example.com' }\n];\n\n\
                             function App() {\n  return <UserList users={users} />;\n}\n\n\
                             export default App;",
                        ),
                    ),
                ]),
            },
        },
        Challenge {
            id: "challenge-2".into(),
            title: "Algorithm Problem".into(),
            description: "Solve this algorithmic problem and explain your approach.".into(),
            instructions: "# Two Sum Problem\n\n\
                Given an array of integers nums and an integer target, return indices of the \
                two numbers such that they add up to target.\n\n\
                1. Provide the solution code\n\
                2. Explain your approach and time complexity\n\
                3. Discuss alternative solutions if any\n"
                .into(),
            time_limit: Some(30),
            body: ChallengeBody::OpenEnded,
        },
        Challenge {
            id: "challenge-3".into(),
            title: "JavaScript Fundamentals Quiz".into(),
            description: "Test your knowledge of JavaScript fundamentals and modern ES6+ features.".into(),
            instructions: "Answer the following multiple-choice questions about JavaScript. Each question has only one correct answer.".into(),
            time_limit: Some(25),
            body: ChallengeBody::MultipleChoice {
                questions: vec![
                    question(
                        "Q1",
                        "What is the output of `console.log(typeof null)`?",
                        ["\"null\"", "\"object\"", "\"undefined\"", "\"boolean\""],
                        "B",
                        "`typeof null` returns \"object\", a historical quirk of the language.",
                    ),
                    question(
                        "Q2",
                        "Which of the following is NOT a valid way to declare a variable in modern JavaScript?",
                        ["let myVar = 10;", "const myVar = 10;", "var myVar = 10;", "variable myVar = 10;"],
                        "D",
                        "\"variable\" is not a JavaScript keyword. Use let, const, or var instead.",
                    ),
                    question(
                        "Q3",
                        "What does the spread operator (...) do when used with arrays?",
                        [
                            "Creates a shallow copy of the array",
                            "Expands array elements individually",
                            "Can be used for array concatenation",
                            "All of the above",
                        ],
                        "D",
                        "Spread copies, expands elements individually and is used for concatenation.",
                    ),
                    question(
                        "Q4",
                        "Which method is used to add elements to the end of an array?",
                        ["append()", "add()", "push()", "insert()"],
                        "C",
                        "push() appends elements and returns the new length of the array.",
                    ),
                    question(
                        "Q5",
                        "What is the difference between == and === in JavaScript?",
                        [
                            "No difference, they work exactly the same",
                            "== compares values with type coercion, === compares values and types strictly",
                            "== is for numbers only, === is for strings only",
                            "=== is deprecated and should not be used",
                        ],
                        "B",
                        "== coerces types before comparing; === compares value and type strictly.",
                    ),
                ],
            },
        },
        Challenge {
            id: "challenge-4".into(),
            title: "System Design Question".into(),
            description: "Design a simple system architecture.".into(),
            instructions: "# System Design: URL Shortener\n\n\
                Design a URL shortener service like bit.ly. Cover the high-level architecture, \
                database schema, API endpoints, scaling approach and caching strategy.\n"
                .into(),
            time_limit: Some(45),
            body: ChallengeBody::OpenEnded,
        },
    ]
}
