//! Ad-hoc runs judged against the live output of a reference solution

use std::io::Cursor;
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio_util::sync::CancellationToken;

use crate::{
    constants::RUN_PASS_DETAILS,
    error::{AppResult, JudgeError},
    models::{Payload, Response, TestCase},
    sandbox::{OutputFrame, deliver_stdin},
};

use super::{
    Judge, cancellable,
    compare::OutputCapture,
    single::{Execution, with_time_limit},
};

/// Buffer between the reference's stdout and the comparison
const PIPE_CAPACITY: usize = 64 * 1024;

const ADHOC_CASE_ID: &str = "stdin";

impl Judge {
    /// Run `payload` on its own stdin and judge it against the problem's
    /// reference solution run on the same stdin.
    ///
    /// The reference's stdout is piped straight into the comparison as the
    /// expected stream. Submission output is recorded into `capture`.
    pub async fn run_and_judge(
        &self,
        payload: &Payload,
        capture: Arc<OutputCapture>,
        parent: &CancellationToken,
    ) -> AppResult<()> {
        let problem_id = payload.problem_id()?;
        let reference = self
            .store
            .reference_solution(problem_id)
            .await
            .map_err(|e| JudgeError::ReferenceFailure(format!("loading reference solution: {}", e)))?
            .with_stdin(payload.stdin.clone());

        let token = parent.child_token();
        let _cancel_on_drop = token.clone().drop_guard();
        let (sink, expected) = tokio::io::duplex(PIPE_CAPACITY);

        let reference_task = {
            let judge = self.clone();
            let token = token.clone();
            tokio::spawn(async move {
                let outcome = judge.pipe_reference(&reference, sink, &token).await;
                if let Err(e) = &outcome {
                    if !e.is_cancelled() {
                        token.cancel();
                    }
                }
                outcome
            })
        };

        let test_case = TestCase::new(
            ADHOC_CASE_ID,
            Cursor::new(payload.stdin.clone().into_bytes()),
            expected,
        );
        let verdict = self
            .judge_test_case(payload, test_case, Some(capture), &token)
            .await;
        if verdict.is_err() {
            token.cancel();
        }

        let reference_outcome = reference_task.await.unwrap_or_else(|e| {
            Err(JudgeError::Internal(anyhow::anyhow!(
                "reference task failed: {}",
                e
            )))
        });
        match reference_outcome {
            Err(e) if !e.is_cancelled() => {
                tracing::warn!(problem = %problem_id, "Reference solution failed: {}", e);
                Err(as_reference_failure(e))
            }
            _ => verdict,
        }
    }

    /// Run a payload against its reference solution and fold the outcome into
    /// a response carrying the captured output
    pub async fn run_default(&self, payload: &Payload, token: &CancellationToken) -> Response {
        let capture = Arc::new(OutputCapture::default());
        let response = match self.run_and_judge(payload, capture.clone(), token).await {
            Ok(()) => Response::pass(RUN_PASS_DETAILS),
            Err(e) => Response::fail(e.to_string()),
        };
        response.with_output(capture.stdout(), capture.stderr())
    }

    async fn pipe_reference(
        &self,
        reference: &Payload,
        sink: DuplexStream,
        token: &CancellationToken,
    ) -> AppResult<()> {
        let execution = Execution::launch(self, reference, token)
            .await
            .map_err(as_reference_failure)?;

        let outcome = cancellable(
            token,
            with_time_limit(
                self.config.judge.run_timeout,
                pump(&execution, &reference.stdin, sink),
            ),
        )
        .await;
        execution.teardown().await;

        outcome.map_err(as_reference_failure)
    }
}

/// Copy the reference's stdout into `sink` while feeding its stdin.
///
/// Owns the sink so the comparison sees end of stream as soon as the
/// reference exits. A closed reader means the comparison already concluded.
/// A reference exiting non-zero is a reference failure carrying its stderr.
async fn pump(execution: &Execution<'_>, stdin: &str, mut sink: DuplexStream) -> AppResult<()> {
    let mut writer = execution.stdin().await?;
    let mut output = execution.output().await?;
    let mut stderr = Vec::new();

    let feed = deliver_stdin(&mut writer, stdin.as_bytes());
    tokio::pin!(feed);

    let mut feeding = true;
    loop {
        tokio::select! {
            delivered = &mut feed, if feeding => {
                feeding = false;
                if let Err(e) = delivered {
                    tracing::warn!("Reference stdin delivery failed: {}", e);
                }
            }
            frame = output.next() => match frame {
                Some(Ok(OutputFrame::Stdout(bytes))) => {
                    if sink.write_all(&bytes).await.is_err() {
                        tracing::debug!("Comparison finished before the reference");
                        return Ok(());
                    }
                }
                Some(Ok(OutputFrame::Stderr(bytes))) => stderr.extend_from_slice(&bytes),
                Some(Err(e)) => return Err(e),
                None => break,
            },
        }
    }

    let status = execution.wait().await?;
    if status != 0 {
        return Err(JudgeError::ReferenceFailure(format!(
            "exited with status {}: {}",
            status,
            String::from_utf8_lossy(&stderr).trim()
        )));
    }

    // EOF for the comparison; a reader that already left is fine
    let _ = sink.shutdown().await;
    Ok(())
}

fn as_reference_failure(e: JudgeError) -> JudgeError {
    match e {
        JudgeError::Cancelled | JudgeError::ReferenceFailure(_) => e,
        other => JudgeError::ReferenceFailure(other.to_string()),
    }
}
