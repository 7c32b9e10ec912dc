//! Client configuration and backend factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use devassess_core::routes::DEFAULT_ASSESSMENT_ID;
use devassess_core::storage::{FileStore, KeyValueStore};
use devassess_core::traits::AssessmentApi;
use devassess_core::SessionStore;

use crate::http::{HttpApi, DEFAULT_TIMEOUT_SECS};
use crate::mock::MockApi;

/// Name of the per-project configuration file.
pub const CONFIG_FILE: &str = "devassess.toml";

/// Which backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Http,
    Mock,
}

impl std::str::FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Backend::Http),
            "mock" => Ok(Backend::Mock),
            other => anyhow::bail!("unknown backend {other:?} (expected \"http\" or \"mock\")"),
        }
    }
}

/// Top-level devassess configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Base URL of the assessment API; required for the HTTP backend.
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default = "default_assessment_id")]
    pub default_assessment_id: String,
    /// Where the session is kept between runs.
    #[serde(default = "default_session_dir")]
    pub session_dir: PathBuf,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Countdown refresh period for `watch`.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

fn default_assessment_id() -> String {
    DEFAULT_ASSESSMENT_ID.to_string()
}
fn default_session_dir() -> PathBuf {
    config_home()
        .map(|dir| dir.join("session"))
        .unwrap_or_else(|| PathBuf::from(".devassess"))
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_tick_interval() -> u64 {
    1000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            api_base_url: None,
            default_assessment_id: default_assessment_id(),
            session_dir: default_session_dir(),
            request_timeout_secs: default_timeout(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

impl ClientConfig {
    /// The base URL with trailing slashes removed, if set and non-empty.
    pub fn base_url(&self) -> Option<&str> {
        self.api_base_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(len) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + len];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + len + 1..]);
        from = start + value.len();
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `devassess.toml` in the current directory
/// 2. `~/.config/devassess/config.toml`
///
/// Environment overrides: `DEVASSESS_API_BASE_URL`, `DEVASSESS_BACKEND`,
/// `DEVASSESS_SESSION_DIR`.
pub fn load_config() -> Result<ClientConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from(CONFIG_FILE);
            if local.exists() {
                Some(local)
            } else {
                config_home()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            toml::from_str::<ClientConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ClientConfig::default(),
    };

    if let Ok(url) = std::env::var("DEVASSESS_API_BASE_URL") {
        config.api_base_url = Some(url);
    }
    if let Ok(backend) = std::env::var("DEVASSESS_BACKEND") {
        config.backend = backend
            .parse()
            .context("invalid DEVASSESS_BACKEND")?;
    }
    if let Ok(dir) = std::env::var("DEVASSESS_SESSION_DIR") {
        config.session_dir = PathBuf::from(dir);
    }

    config.api_base_url = config.api_base_url.as_deref().map(resolve_env_vars);
    config.session_dir = PathBuf::from(resolve_env_vars(&config.session_dir.to_string_lossy()));
    config.default_assessment_id = resolve_env_vars(&config.default_assessment_id);

    Ok(config)
}

fn config_home() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("devassess"))
}

/// Create the backend selected by `config`.
pub fn create_api(config: &ClientConfig) -> Result<Arc<dyn AssessmentApi>> {
    match config.backend {
        Backend::Mock => Ok(Arc::new(MockApi::new())),
        Backend::Http => {
            let base_url = config.base_url().context(
                "api_base_url is not set. Define it in devassess.toml or DEVASSESS_API_BASE_URL",
            )?;
            let api = HttpApi::new(base_url, config.request_timeout_secs)
                .context("failed to create HTTP client")?;
            Ok(Arc::new(api))
        }
    }
}

/// Open the on-disk session store under `config.session_dir`.
pub fn open_session_store(config: &ClientConfig) -> Result<SessionStore> {
    let store = FileStore::open(&config.session_dir).with_context(|| {
        format!(
            "failed to open session directory: {}",
            config.session_dir.display()
        )
    })?;
    let backend: Arc<dyn KeyValueStore> = Arc::new(store);
    Ok(SessionStore::new(backend))
}

/// A commented starter configuration.
pub fn starter_config() -> String {
    format!(
        r#"# devassess configuration

# "http" talks to api_base_url, "mock" serves a built-in sample assessment.
backend = "mock"

# api_base_url = "https://assessments.example.com/api"

default_assessment_id = "{DEFAULT_ASSESSMENT_ID}"

# Environment variables can be referenced as ${{VAR_NAME}}.
# session_dir = "${{HOME}}/.config/devassess/session"

request_timeout_secs = {DEFAULT_TIMEOUT_SECS}
tick_interval_ms = 1000
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_DEVASSESS_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_DEVASSESS_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_DEVASSESS_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${_DEVASSESS_UNSET_VAR}x"), "x");
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        std::env::remove_var("_DEVASSESS_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.backend, Backend::Http);
        assert_eq!(config.default_assessment_id, "assessment-123");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.tick_interval_ms, 1000);
        assert!(config.base_url().is_none());
    }

    #[test]
    fn parse_config_and_trim_base_url() {
        let toml_str = r#"
backend = "http"
api_base_url = "https://api.example.com/v1//"
session_dir = "/tmp/devassess-session"
request_timeout_secs = 10
"#;
        let config: ClientConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.base_url(), Some("https://api.example.com/v1"));
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.session_dir, PathBuf::from("/tmp/devassess-session"));
    }

    #[test]
    fn starter_config_parses() {
        let config: ClientConfig = toml::from_str(&starter_config()).unwrap();
        assert_eq!(config.backend, Backend::Mock);
    }

    #[test]
    fn http_backend_requires_base_url() {
        let config = ClientConfig::default();
        let err = create_api(&config).err().unwrap();
        assert!(err.to_string().contains("api_base_url is not set"));

        let config = ClientConfig {
            backend: Backend::Mock,
            ..ClientConfig::default()
        };
        assert_eq!(create_api(&config).unwrap().name(), "mock");
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/nonexistent/devassess.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn session_store_lives_in_session_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            session_dir: dir.path().join("session"),
            ..ClientConfig::default()
        };
        let store = open_session_store(&config).unwrap();
        assert!(store.get_candidate().is_none());
        assert!(dir.path().join("session").is_dir());
    }
}
