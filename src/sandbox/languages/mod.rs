//! Language-specific build and run settings

pub mod c;
pub mod cpp;
pub mod go;
pub mod python;
pub mod rust;

use std::collections::HashMap;
use std::path::Path;

use crate::{
    constants,
    error::{AppResult, JudgeError},
};

/// Image, command and source extensions of one language
#[derive(Debug, Clone)]
pub struct LanguageHandler {
    language: &'static str,
    image: &'static str,
    extensions: &'static [&'static str],
    command: &'static str,
}

impl LanguageHandler {
    /// Get handler for a specific language
    pub fn for_language(language: &str) -> AppResult<Self> {
        match language {
            constants::languages::C => Ok(c::handler()),
            constants::languages::CPP => Ok(cpp::handler()),
            constants::languages::PYTHON => Ok(python::handler()),
            constants::languages::GO => Ok(go::handler()),
            constants::languages::RUST => Ok(rust::handler()),
            _ => Err(JudgeError::Staging(format!(
                "Unsupported language: {}",
                language
            ))),
        }
    }

    pub fn language(&self) -> &'static str {
        self.language
    }

    /// Image to run, honoring configured overrides
    pub fn image(&self, overrides: &HashMap<String, String>) -> String {
        overrides
            .get(self.language)
            .cloned()
            .unwrap_or_else(|| self.image.to_string())
    }

    /// Shell command that builds and runs the staged sources
    pub fn command(&self) -> &'static str {
        self.command
    }

    /// Whether a file belongs to a solution in this language
    pub fn matches_file(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext))
    }
}
