//! C language handler

use super::LanguageHandler;
use crate::constants::{container_images, languages};

/// Get handler for C
pub fn handler() -> LanguageHandler {
    LanguageHandler {
        language: languages::C,
        image: container_images::C,
        extensions: &["c", "h"],
        command: "gcc main.c -o binary.exe && ./binary.exe",
    }
}
