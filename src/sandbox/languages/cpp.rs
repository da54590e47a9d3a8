//! C++ language handler

use super::LanguageHandler;
use crate::constants::{container_images, languages};

/// Get handler for C++
pub fn handler() -> LanguageHandler {
    LanguageHandler {
        language: languages::CPP,
        image: container_images::CPP,
        extensions: &["cpp", "cc", "h", "hpp"],
        command: "g++ -std=c++11 main.cpp -o binary.exe && ./binary.exe",
    }
}
