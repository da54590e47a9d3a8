//! Concurrent judging of every test case of a problem

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{AppResult, ErrorClass, JudgeError},
    models::{Decision, Payload, Response, TestCase},
};

use super::{Judge, cancellable};

/// Aggregated outcome of judging all test cases
#[derive(Debug)]
pub struct JudgeSummary {
    pub decision: Decision,
    /// The last non-absorbed error observed, or a cancellation if that was
    /// the only signal
    pub error: Option<JudgeError>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl From<JudgeSummary> for Response {
    fn from(summary: JudgeSummary) -> Self {
        match (summary.decision, summary.error) {
            (Decision::Pass, _) => Response::pass(""),
            (Decision::Fail, Some(err)) => Response::fail(err.to_string()),
            (Decision::Fail, None) => Response::fail(format!(
                "{} of {} test cases passed",
                summary.passed, summary.total
            )),
        }
    }
}

/// Completion message of one test case task
struct CaseReport {
    case_id: String,
    outcome: AppResult<()>,
}

impl Judge {
    /// Judge `payload` against every test case of its problem.
    ///
    /// One task is spawned per test case, gated by a worker pool of
    /// `max_concurrency` permits. A fault in any case cancels the others;
    /// failed cases (mismatch, time limit, staging) do not, unless
    /// `cancel_on_mismatch` is set. Every case runs under a child of `parent`.
    pub async fn judge_all(
        &self,
        payload: &Payload,
        parent: &CancellationToken,
    ) -> AppResult<JudgeSummary> {
        let problem_id = payload.problem_id()?.to_string();
        let test_cases = self.store.test_cases(&problem_id).await?;
        let total = test_cases.len();
        if total == 0 {
            tracing::warn!(problem = %problem_id, "Problem has no test cases");
        }

        let token = parent.child_token();
        // Dropping this future abandons every case still running
        let _cancel_on_drop = token.clone().drop_guard();
        let permits = match self.config.judge.max_concurrency {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };
        let payload = Arc::new(payload.clone());
        let (tx, mut rx) = mpsc::channel(total.max(1));

        let mut tasks = JoinSet::new();
        for test_case in test_cases {
            let judge = self.clone();
            let payload = payload.clone();
            let permits = permits.clone();
            let token = token.clone();
            let tx = tx.clone();

            tasks.spawn(async move {
                let case_id = test_case.id.clone();
                let outcome = judge.judge_pooled(&payload, test_case, permits, &token).await;
                // The collector only stops after every sender is gone
                let _ = tx.send(CaseReport { case_id, outcome }).await;
            });
        }

        // Supervisor: join every task, then drop the last sender so the
        // collecting loop below ends once all reports are in
        tokio::spawn(async move {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    tracing::error!("Test case task failed: {}", e);
                    let report = CaseReport {
                        case_id: "<unknown>".to_string(),
                        outcome: Err(JudgeError::Internal(anyhow::anyhow!(
                            "test case task failed: {}",
                            e
                        ))),
                    };
                    let _ = tx.send(report).await;
                }
            }
        });

        let cancel_on_mismatch = self.config.judge.cancel_on_mismatch;
        let mut reported: Option<JudgeError> = None;
        let mut absorbed: Option<JudgeError> = None;
        let (mut passed, mut failed, mut cancelled) = (0, 0, 0);

        while let Some(CaseReport { case_id, outcome }) = rx.recv().await {
            let err = match outcome {
                Ok(()) => {
                    passed += 1;
                    tracing::debug!(case = %case_id, "Test case passed");
                    continue;
                }
                Err(err) => err,
            };

            match err.class() {
                ErrorClass::Cancelled => {
                    cancelled += 1;
                    absorbed = Some(err);
                }
                class => {
                    failed += 1;
                    tracing::info!(case = %case_id, code = err.error_code(), "Test case failed: {}", err);
                    if (class == ErrorClass::Fault || cancel_on_mismatch) && !token.is_cancelled() {
                        tracing::info!(case = %case_id, "Cancelling remaining test cases");
                        token.cancel();
                    }
                    // Concurrent faults race here; the last one seen is reported
                    reported = Some(err);
                }
            }
        }

        tracing::info!(
            problem = %problem_id,
            total,
            passed,
            failed,
            cancelled,
            "Judging finished"
        );

        let error = reported.or(absorbed);
        let decision = if error.is_none() && passed == total {
            Decision::Pass
        } else {
            Decision::Fail
        };

        Ok(JudgeSummary {
            decision,
            error,
            total,
            passed,
            failed,
            cancelled,
        })
    }

    /// Judge all test cases and fold the outcome into a response
    pub async fn judge_default(&self, payload: &Payload, token: &CancellationToken) -> Response {
        match self.judge_all(payload, token).await {
            Ok(summary) => summary.into(),
            Err(e) => Response::fail(e.to_string()),
        }
    }

    /// Wait for a worker slot, then judge the case
    async fn judge_pooled(
        &self,
        payload: &Payload,
        test_case: TestCase,
        permits: Option<Arc<Semaphore>>,
        token: &CancellationToken,
    ) -> AppResult<()> {
        let _permit = match permits {
            Some(permits) => Some(
                cancellable(token, async {
                    permits
                        .acquire_owned()
                        .await
                        .map_err(|e| JudgeError::Internal(e.into()))
                })
                .await?,
            ),
            None => None,
        };

        self.judge_test_case(payload, test_case, None, token).await
    }
}
