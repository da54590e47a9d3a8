//! Single test case judging

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

use crate::{
    constants::SANDBOX_WORKDIR,
    error::{AppResult, JudgeError},
    models::{CaseStream, Payload, TestCase},
    sandbox::{
        LanguageHandler, OutputStream, RunSpec, SandboxHandle, SandboxProvider, StdinWriter,
        deliver_stdin,
    },
};

use super::{
    Judge, cancellable,
    compare::{OutputCapture, compare_lines, stdout_reader},
    staging::StagingDir,
};

/// A started sandbox together with the staged files it mounts
pub(crate) struct Execution<'a> {
    sandbox: &'a dyn SandboxProvider,
    handle: SandboxHandle,
    staging: StagingDir,
}

impl<'a> Execution<'a> {
    /// Stage the payload's files and start it in a sandbox.
    ///
    /// Starting is not interrupted by cancellation, so a created instance is
    /// always known to the caller and can be removed.
    pub(crate) async fn launch(
        judge: &'a Judge,
        payload: &Payload,
        token: &CancellationToken,
    ) -> AppResult<Self> {
        if token.is_cancelled() {
            return Err(JudgeError::Cancelled);
        }

        let language = LanguageHandler::for_language(&payload.language)?;
        let staging =
            StagingDir::create(&judge.config.storage.workspace_dir, &payload.files).await?;

        let spec = RunSpec {
            image: language.image(&judge.config.docker.images),
            command: language.command().to_string(),
            bind_path: staging.path().to_path_buf(),
            working_dir: SANDBOX_WORKDIR.to_string(),
        };
        let handle = judge.sandbox.run(&spec).await?;

        Ok(Self {
            sandbox: judge.sandbox.as_ref(),
            handle,
            staging,
        })
    }

    pub(crate) async fn stdin(&self) -> AppResult<StdinWriter> {
        self.sandbox.stdin(&self.handle).await
    }

    pub(crate) async fn output(&self) -> AppResult<OutputStream> {
        self.sandbox.output(&self.handle).await
    }

    pub(crate) async fn wait(&self) -> AppResult<i64> {
        self.sandbox.wait(&self.handle).await
    }

    /// Remove the sandbox instance, then the staging directory
    pub(crate) async fn teardown(self) {
        if let Err(e) = self.sandbox.remove(&self.handle).await {
            tracing::warn!(container = %self.handle.id, "Failed to remove sandbox: {}", e);
        }
        tracing::debug!(
            container = %self.handle.id,
            path = %self.staging.path().display(),
            "Execution torn down"
        );
    }
}

/// Apply the wall-clock limit of one run
pub(crate) async fn with_time_limit<T>(
    limit: Duration,
    fut: impl Future<Output = AppResult<T>>,
) -> AppResult<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(JudgeError::TimedOut(limit.as_millis() as u64)),
    }
}

impl Judge {
    /// Judge one test case.
    ///
    /// `payload` is cloned with the case's input as stdin; the submission's
    /// stdout is compared line by line with the case's expected output. The
    /// sandbox and the staging directory are removed whatever the outcome.
    pub async fn judge_test_case(
        &self,
        payload: &Payload,
        mut test_case: TestCase,
        capture: Option<Arc<OutputCapture>>,
        token: &CancellationToken,
    ) -> AppResult<()> {
        let input = test_case.read_input().await.map_err(|e| {
            JudgeError::ProblemStore(format!("reading input of {}: {}", test_case.id, e))
        })?;
        let TestCase { id, expected, .. } = test_case;
        let case_payload = payload.with_stdin(input);

        let execution = Execution::launch(self, &case_payload, token).await?;
        let outcome = cancellable(
            token,
            with_time_limit(
                self.config.judge.run_timeout,
                check_output(&execution, &case_payload.stdin, expected, capture),
            ),
        )
        .await;
        execution.teardown().await;

        match &outcome {
            Ok(()) => tracing::debug!(case = %id, "Output matched"),
            Err(e) => tracing::debug!(case = %id, code = e.error_code(), "Test case did not pass: {}", e),
        }
        outcome
    }
}

/// Feed stdin while comparing stdout with the expected stream.
///
/// Stdin is delivered concurrently so a program that writes before it has
/// read all of its input cannot stall the run. Once the comparison concludes
/// it decides the outcome; stdin errors are only logged.
async fn check_output(
    execution: &Execution<'_>,
    stdin: &str,
    expected: CaseStream,
    capture: Option<Arc<OutputCapture>>,
) -> AppResult<()> {
    let mut writer = execution.stdin().await?;
    let output = execution.output().await?;

    let feed = deliver_stdin(&mut writer, stdin.as_bytes());
    let compare = compare_lines(stdout_reader(output, capture), BufReader::new(expected));
    tokio::pin!(feed, compare);

    let mut feeding = true;
    loop {
        tokio::select! {
            delivered = &mut feed, if feeding => {
                feeding = false;
                match delivered {
                    Ok(bytes) => tracing::trace!(bytes, "Stdin delivered"),
                    Err(e) => tracing::warn!(container = %execution.handle.id, "Stdin delivery failed: {}", e),
                }
            }
            verdict = &mut compare => return verdict,
        }
    }
}
