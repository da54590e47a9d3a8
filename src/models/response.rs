//! Judging response model

use serde::{Deserialize, Serialize};

/// Outcome of comparing produced output with the expected output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Pass,
    Fail,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Pass => write!(f, "pass"),
            Decision::Fail => write!(f, "fail"),
        }
    }
}

/// Response returned to the caller.
///
/// `stdout` and `stderr` are only filled for single ad-hoc runs; bulk judging
/// leaves them empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: Decision,
    #[serde(default)]
    pub details: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl Response {
    pub fn pass(details: impl Into<String>) -> Self {
        Self {
            status: Decision::Pass,
            details: details.into(),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn fail(details: impl Into<String>) -> Self {
        Self {
            status: Decision::Fail,
            details: details.into(),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Attach captured program output
    pub fn with_output(mut self, stdout: String, stderr: String) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    pub fn is_pass(&self) -> bool {
        self.status == Decision::Pass
    }
}
