//! In-memory problem catalog

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppResult, JudgeError},
    models::{JudgeData, Payload, TestCase},
};

use super::ProblemStore;

/// Problem definitions keyed by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    problems: HashMap<String, JudgeData>,
}

impl Catalog {
    /// Insert a problem, replacing any previous definition with the same id
    pub fn insert(&mut self, problem: JudgeData) -> Option<JudgeData> {
        self.problems.insert(problem.id.clone(), problem)
    }

    pub fn get(&self, problem_id: &str) -> Option<&JudgeData> {
        self.problems.get(problem_id)
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JudgeData> {
        self.problems.values()
    }

    /// Merge `other` into this catalog; its definitions win
    pub fn extend(&mut self, other: Catalog) {
        self.problems.extend(other.problems);
    }

    fn problem(&self, problem_id: &str) -> AppResult<&JudgeData> {
        self.get(problem_id)
            .ok_or_else(|| JudgeError::ProblemStore(format!("unknown problem: {}", problem_id)))
    }
}

#[async_trait]
impl ProblemStore for Catalog {
    async fn test_cases(&self, problem_id: &str) -> AppResult<Vec<TestCase>> {
        let problem = self.problem(problem_id)?;
        Ok(problem
            .io
            .iter()
            .enumerate()
            .map(|(i, example)| {
                TestCase::from_strings(
                    format!("input{:02}", i + 1),
                    example.input.clone(),
                    example.output.clone(),
                )
            })
            .collect())
    }

    async fn reference_solution(&self, problem_id: &str) -> AppResult<Payload> {
        self.problem(problem_id)?.solution.clone().ok_or_else(|| {
            JudgeError::ProblemStore(format!("no reference solution for {}", problem_id))
        })
    }
}
