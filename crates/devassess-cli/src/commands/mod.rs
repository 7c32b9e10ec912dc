pub mod challenges;
pub mod draft;
pub mod finalize;
pub mod init;
pub mod login;
pub mod logout;
pub mod show;
pub mod status;
pub mod submit;
pub mod watch;

use std::io::{BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;

use devassess_client::{create_api, load_config_from, open_session_store, ClientConfig};
use devassess_core::clock::{Clock, SystemClock};
use devassess_core::model::{Answer, Candidate, Challenge};
use devassess_core::routes::Route;
use devassess_core::{ApiError, AssessmentSession, Prompter};

/// Everything a command needs: configuration and the hydrated session.
pub struct Context {
    pub config: ClientConfig,
    pub session: AssessmentSession,
}

impl Context {
    pub fn open(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config_from(config_path)?;
        let api = create_api(&config)?;
        let store = open_session_store(&config)?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        tracing::debug!(
            backend = api.name(),
            session_dir = %config.session_dir.display(),
            "opened session"
        );
        let session = AssessmentSession::new(api, store, clock);
        Ok(Self { config, session })
    }

    /// The explicit id, else the logged-in assessment, else the configured default.
    pub fn assessment_id(&self, explicit: Option<String>) -> String {
        explicit
            .or_else(|| self.session.candidate().map(|c| c.assessment_id))
            .unwrap_or_else(|| self.config.default_assessment_id.clone())
    }

    /// Pass `route` through the session guard.
    pub fn enter(&self, route: &Route) -> Result<Candidate> {
        let target = route
            .clone()
            .resolve(|id| self.session.has_valid_session(id));
        tracing::debug!(%route, %target, "route resolved");
        let assessment_id = target
            .assessment_id()
            .unwrap_or(&self.config.default_assessment_id);
        self.session
            .require_session(assessment_id)
            .map_err(session_error)
    }
}

/// Add a login hint to errors that send the candidate back to login.
pub fn session_error(e: ApiError) -> anyhow::Error {
    if e.requires_login() {
        anyhow::anyhow!("{e} Run `devassess login` to start a session.")
    } else {
        e.into()
    }
}

/// Asks on the terminal; anything but `y`/`yes` declines.
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn confirm(&self, message: &str) -> bool {
        eprint!("{message} [y/N] ");
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Answer payload flags shared by `draft` and `submit`.
#[derive(Args, Debug, Default)]
pub struct PayloadArgs {
    /// Source file for a code challenge (repeatable)
    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Language of the submitted code
    #[arg(long, requires = "files")]
    pub language: Option<String>,

    /// Answer text for an open-ended challenge ("-" reads stdin)
    #[arg(long, conflicts_with_all = ["files", "choices"])]
    pub answer: Option<String>,

    /// Multiple-choice selection as QUESTION=OPTION (repeatable)
    #[arg(
        long = "choice",
        value_name = "QUESTION=OPTION",
        value_parser = parse_choice,
        conflicts_with = "files"
    )]
    pub choices: Vec<(String, String)>,
}

impl PayloadArgs {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.answer.is_none() && self.choices.is_empty()
    }

    /// Apply the flags on top of `base`, the current working answer.
    pub fn apply(&self, challenge: &Challenge, base: Answer) -> Result<Answer> {
        match base {
            Answer::Code {
                mut files,
                mut language,
            } => {
                anyhow::ensure!(
                    self.answer.is_none() && self.choices.is_empty(),
                    "{} is a code challenge; pass source files with --file",
                    challenge.id
                );
                for path in &self.files {
                    let name = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .with_context(|| format!("invalid file name: {}", path.display()))?;
                    let content = std::fs::read_to_string(path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    files.insert(name.to_string(), content);
                }
                if let Some(lang) = &self.language {
                    language = lang.clone();
                }
                Ok(Answer::Code { files, language })
            }
            Answer::OpenEnded { .. } => {
                let text = self.answer.as_deref().with_context(|| {
                    format!("{} is an open-ended challenge; pass --answer", challenge.id)
                })?;
                let answer = if text == "-" {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read answer from stdin")?;
                    buf
                } else {
                    text.to_string()
                };
                Ok(Answer::OpenEnded { answer })
            }
            Answer::MultipleChoice { mut answers } => {
                anyhow::ensure!(
                    self.answer.is_none(),
                    "{} is a multiple-choice challenge; pass --choice QUESTION=OPTION",
                    challenge.id
                );
                for (question_id, option_id) in &self.choices {
                    let question = challenge
                        .questions()
                        .iter()
                        .find(|q| &q.id == question_id)
                        .with_context(|| format!("unknown question {question_id}"))?;
                    anyhow::ensure!(
                        question.options.iter().any(|o| &o.id == option_id),
                        "question {question_id} has no option {option_id}"
                    );
                    answers.insert(question_id.clone(), option_id.clone());
                }
                Ok(Answer::MultipleChoice { answers })
            }
        }
    }
}

fn parse_choice(s: &str) -> Result<(String, String), String> {
    let (question, option) = s
        .split_once('=')
        .ok_or_else(|| format!("expected QUESTION=OPTION, got {s:?}"))?;
    let (question, option) = (question.trim(), option.trim());
    if question.is_empty() || option.is_empty() {
        return Err(format!("expected QUESTION=OPTION, got {s:?}"));
    }
    Ok((question.to_string(), option.to_string()))
}
