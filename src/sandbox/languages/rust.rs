//! Rust language handler

use super::LanguageHandler;
use crate::constants::{container_images, languages};

/// Get handler for Rust
pub fn handler() -> LanguageHandler {
    LanguageHandler {
        language: languages::RUST,
        image: container_images::RUST,
        extensions: &["rs"],
        command: "rustc -O main.rs -o binary.exe && ./binary.exe",
    }
}
