use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhantomError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Engine executable '{command}' was not found on PATH")]
    EngineNotFound { command: String },

    #[error("Engine timed out after {limit:?}: {message}")]
    Timeout {
        limit: Duration,
        message: String,
        stderr: String,
    },

    #[error("Render failed ({}): {message}", describe_exit(.exit_code))]
    Render {
        exit_code: Option<i32>,
        message: String,
        stderr: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit {code}"),
        None => "no exit code".to_string(),
    }
}

impl PhantomError {
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        PhantomError::InvalidConfiguration(message.into())
    }

    pub fn render(exit_code: Option<i32>, message: impl Into<String>, stderr: impl Into<String>) -> Self {
        PhantomError::Render {
            exit_code,
            message: message.into(),
            stderr: stderr.into(),
        }
    }

    pub fn timeout(limit: Duration, message: impl Into<String>, stderr: impl Into<String>) -> Self {
        PhantomError::Timeout {
            limit,
            message: message.into(),
            stderr: stderr.into(),
        }
    }

    /// True for slow pages and hung engines, false for broken ones.
    pub fn is_timeout(&self) -> bool {
        matches!(self, PhantomError::Timeout { .. })
    }

    /// Captured engine stderr, when the failure came from a finished process.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            PhantomError::Timeout { stderr, .. } | PhantomError::Render { stderr, .. } => {
                Some(stderr.as_str())
            }
            _ => None,
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            PhantomError::Io(e) => ErrorPayload::new(
                ErrorCategory::Io,
                e.to_string(),
                "Check file paths/permissions and free space in the temp directory.",
            ),
            PhantomError::Serialization(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check JSON/serialization inputs; run with --verbose for details.",
            ),
            PhantomError::InvalidConfiguration(msg) => ErrorPayload::new(
                ErrorCategory::Config,
                msg.to_string(),
                "Check render flags (--paper, --margins, --js-timeout, --js-interval) or the [render] config section.",
            ),
            PhantomError::EngineNotFound { command } => ErrorPayload::new(
                ErrorCategory::Engine,
                self.to_string(),
                format!(
                    "Install PhantomJS and put '{command}' on PATH, or point --engine / PHANTOMJS_BIN at the executable."
                ),
            ),
            PhantomError::Timeout { .. } => ErrorPayload::new(
                ErrorCategory::Timeout,
                self.to_string(),
                "Try increasing --js-timeout, or make sure the page sets window.renderReady = true once it is done.",
            ),
            PhantomError::Render { stderr, .. } => ErrorPayload::new(
                ErrorCategory::Render,
                with_stderr(self.to_string(), stderr),
                "Inspect the engine stderr above; verify the HTML and banner functions load without script errors.",
            ),
            PhantomError::Config(msg) => ErrorPayload::new(
                ErrorCategory::Config,
                msg.to_string(),
                "Check the config file (TOML) and flags such as --engine and --config.",
            ),
        }
    }
}

fn with_stderr(message: String, stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        message
    } else {
        format!("{message}\n{stderr}")
    }
}

pub type Result<T> = std::result::Result<T, PhantomError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Config,
    Engine,
    Timeout,
    Render,
    Io,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
