//! Python language handler

use super::LanguageHandler;
use crate::constants::{container_images, languages};

/// Get handler for Python
pub fn handler() -> LanguageHandler {
    LanguageHandler {
        language: languages::PYTHON,
        image: container_images::PYTHON,
        extensions: &["py"],
        command: "python main.py",
    }
}
