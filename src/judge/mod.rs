//! Judging engine
//!
//! The engine has three entry points, all on [`Judge`]:
//!
//! 1. **Single case** (`single.rs`): stage a submission, run it in a sandbox,
//!    stream one test case's input in and compare its stdout line by line.
//! 2. **Orchestrator** (`orchestrator.rs`): run every test case of a problem
//!    concurrently under one cancellation token and aggregate a verdict.
//! 3. **Oracle** (`oracle.rs`): judge an ad-hoc run against the live output of
//!    the problem's reference solution.

pub mod compare;
pub mod orchestrator;
pub mod oracle;
pub mod single;
pub mod staging;

#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    error::{AppResult, JudgeError},
    sandbox::SandboxProvider,
    store::ProblemStore,
};

pub use compare::OutputCapture;
pub use orchestrator::JudgeSummary;
pub use staging::StagingDir;

/// The judging engine.
///
/// Cloning is cheap; every clone shares the same sandbox provider, problem
/// store and configuration.
#[derive(Clone)]
pub struct Judge {
    sandbox: Arc<dyn SandboxProvider>,
    store: Arc<dyn ProblemStore>,
    config: Arc<Config>,
}

impl Judge {
    pub fn new(
        sandbox: Arc<dyn SandboxProvider>,
        store: Arc<dyn ProblemStore>,
        config: Config,
    ) -> Self {
        Self {
            sandbox,
            store,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Run `fut` unless `token` is cancelled first
pub(crate) async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(JudgeError::Cancelled),
        result = fut => result,
    }
}
