//! Go language handler

use super::LanguageHandler;
use crate::constants::{container_images, languages};

/// Get handler for Go
pub fn handler() -> LanguageHandler {
    LanguageHandler {
        language: languages::GO,
        image: container_images::GO,
        extensions: &["go"],
        command: "go run main.go",
    }
}
