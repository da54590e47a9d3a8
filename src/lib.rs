//! Arbiter - Sandboxed Judging Engine
//!
//! This library runs untrusted submissions in isolated sandboxes and judges
//! their output line by line.
//!
//! # Features
//!
//! - Multi-language support (C, C++, Python, Go, Rust)
//! - Isolated Docker container execution per test case
//! - Concurrent judging with a bounded worker pool and cancel-on-fault
//! - Ad-hoc runs judged against a live reference solution
//!
//! # Architecture
//!
//! - **Judge**: single-case judging, orchestration and the oracle runner
//! - **Sandbox**: the execution capability and its Docker adapter
//! - **Store**: test fixtures and reference solutions
//! - **Models**: payloads, responses and problem definitions

pub mod config;
pub mod constants;
pub mod error;
pub mod judge;
pub mod models;
pub mod sandbox;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppResult, JudgeError};
pub use judge::Judge;
