//! Error types for the judging engine
//!
//! Every failure a test case can end with is a [`JudgeError`]. The orchestrator
//! does not inspect messages; it asks [`JudgeError::class`] whether an outcome is
//! a plain failed test, an absorbed cancellation, or a fault that must stop the
//! sibling runs.

/// Judging error type
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    // Per-case preparation
    #[error("Staging error: {0}")]
    Staging(String),

    // Sandbox runtime
    #[error("Transport error: {0}")]
    Transport(String),

    // Business outcomes
    #[error("Mismatch at line {line}: expected {}, got {}", show_line(.expected), show_line(.actual))]
    Mismatch {
        line: usize,
        expected: Option<String>,
        actual: Option<String>,
    },

    #[error("Time limit exceeded ({0} ms)")]
    TimedOut(u64),

    #[error("Context cancelled")]
    Cancelled,

    // Oracle mode
    #[error("Reference solution failed: {0}")]
    ReferenceFailure(String),

    // Problem store
    #[error("Problem store error: {0}")]
    ProblemStore(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// How the orchestrator treats an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The test case failed; siblings keep running
    Failure,
    /// The run was preempted; absorbed unless it is the only signal
    Cancelled,
    /// A system fault; siblings are cancelled
    Fault,
}

impl JudgeError {
    /// Classify this error for the orchestration policy
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Mismatch { .. } | Self::TimedOut(_) | Self::Staging(_) => ErrorClass::Failure,
            Self::Cancelled => ErrorClass::Cancelled,
            Self::Transport(_)
            | Self::ReferenceFailure(_)
            | Self::ProblemStore(_)
            | Self::Internal(_) => ErrorClass::Fault,
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Staging(_) => "STAGING_ERROR",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Mismatch { .. } => "MISMATCH",
            Self::TimedOut(_) => "TIME_LIMIT_EXCEEDED",
            Self::Cancelled => "CANCELLED",
            Self::ReferenceFailure(_) => "REFERENCE_FAILURE",
            Self::ProblemStore(_) => "PROBLEM_STORE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Build a mismatch from raw line bytes
    pub(crate) fn mismatch(line: usize, expected: Option<&[u8]>, actual: Option<&[u8]>) -> Self {
        Self::Mismatch {
            line,
            expected: expected.map(|l| String::from_utf8_lossy(l).into_owned()),
            actual: actual.map(|l| String::from_utf8_lossy(l).into_owned()),
        }
    }
}

fn show_line(line: &Option<String>) -> String {
    match line {
        Some(l) => format!("{:?}", l),
        None => "end of output".to_string(),
    }
}

impl From<bollard::errors::Error> for JudgeError {
    fn from(err: bollard::errors::Error) -> Self {
        JudgeError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for JudgeError {
    fn from(err: serde_json::Error) -> Self {
        JudgeError::ProblemStore(err.to_string())
    }
}

/// Result type alias using JudgeError
pub type AppResult<T> = Result<T, JudgeError>;
