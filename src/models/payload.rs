//! Judging request model

use serde::{Deserialize, Serialize};

use crate::error::{AppResult, JudgeError};

/// Reference to the problem a payload is judged against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemRef {
    pub id: String,
}

/// A named source file held in memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryFile {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Content")]
    pub content: String,
}

/// A judging request: problem reference, language, files and stdin.
///
/// Stored reference solutions use the same shape without a `problem` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<ProblemRef>,
    pub language: String,
    #[serde(default)]
    pub stdin: String,
    #[serde(default)]
    pub files: Vec<InMemoryFile>,
}

impl Payload {
    /// Create an empty payload for a problem
    pub fn new(problem_id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            problem: Some(ProblemRef {
                id: problem_id.into(),
            }),
            language: language.into(),
            ..Default::default()
        }
    }

    /// Add a file, replacing the content of an existing file with the same
    /// name in place so names stay unique and order is preserved
    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        let content = content.into();
        match self.files.iter_mut().find(|f| f.name == name) {
            Some(file) => file.content = content,
            None => self.files.push(InMemoryFile { name, content }),
        }
        self
    }

    /// Clone this payload with `stdin` replaced.
    ///
    /// The file list is deep-copied: the returned payload owns its files and
    /// shares nothing with `self`.
    pub fn with_stdin(&self, stdin: impl Into<String>) -> Self {
        Self {
            problem: self.problem.clone(),
            language: self.language.clone(),
            stdin: stdin.into(),
            files: self.files.clone(),
        }
    }

    /// The referenced problem id
    pub fn problem_id(&self) -> AppResult<&str> {
        self.problem
            .as_ref()
            .map(|p| p.id.as_str())
            .ok_or_else(|| JudgeError::ProblemStore("payload does not reference a problem".into()))
    }
}
