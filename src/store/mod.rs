//! Problem stores
//!
//! A [`ProblemStore`] hands the judge a problem's test cases and its trusted
//! reference solution. [`DirProblemStore`] reads them from a problems
//! directory; [`Catalog`] serves them from memory, typically after loading a
//! [`ProblemCache`].

pub mod cache;
pub mod catalog;
pub mod directory;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{Payload, TestCase},
};

pub use cache::ProblemCache;
pub use catalog::Catalog;
pub use directory::DirProblemStore;

/// Source of test fixtures and reference solutions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProblemStore: Send + Sync {
    /// Every test case of the problem, ordered by input name
    async fn test_cases(&self, problem_id: &str) -> AppResult<Vec<TestCase>>;

    /// The problem's reference solution
    async fn reference_solution(&self, problem_id: &str) -> AppResult<Payload>;
}
