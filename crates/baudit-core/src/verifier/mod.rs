//! Bounded-concurrency verification pool.
//!
//! Every task is spawned up front into a `JoinSet`; a shared semaphore caps
//! how many object streams are open at once. Each task runs its attempts
//! through the retry layer and re-acquires a slot per attempt, so a task
//! sleeping in backoff does not hold one.

mod report;
mod worker;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::bucket::ObjectStore;
use crate::checksum::{DigestAlgorithm, DEFAULT_CHUNK_SIZE};
use crate::config::AuditConfig;
use crate::planner::VerificationTask;
use crate::record_db::RecordStore;
use crate::retry::{self, ErrorKind, FailureClass, RetryPolicy};

pub use report::{RunReport, TaskFailure};
pub use worker::hash_object;

use worker::AttemptOutcome;

/// Pool settings, usually taken from `AuditConfig`.
#[derive(Debug, Clone, Copy)]
pub struct VerifySettings {
    /// Maximum object streams open at once.
    pub concurrency: usize,
    pub chunk_size: usize,
    pub algorithm: DigestAlgorithm,
    pub dry_run: bool,
    pub retry: RetryPolicy,
}

impl Default for VerifySettings {
    fn default() -> Self {
        Self {
            concurrency: 5,
            chunk_size: DEFAULT_CHUNK_SIZE,
            algorithm: DigestAlgorithm::default(),
            dry_run: false,
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&AuditConfig> for VerifySettings {
    fn from(cfg: &AuditConfig) -> Self {
        Self {
            concurrency: cfg.concurrency,
            chunk_size: cfg.chunk_size,
            algorithm: cfg.digest,
            dry_run: cfg.dry_run,
            retry: cfg.retry_policy(),
        }
    }
}

/// Per-task result sent back to the collector.
struct TaskResult {
    key: String,
    outcome: Result<AttemptOutcome, retry::Exhausted>,
    suppressed: usize,
}

/// Verification worker pool over a storage backend and a record store.
pub struct VerifyPool<S, R> {
    storage: Arc<S>,
    records: Arc<R>,
    settings: VerifySettings,
}

impl<S: ObjectStore, R: RecordStore> VerifyPool<S, R> {
    pub fn new(storage: Arc<S>, records: Arc<R>, settings: VerifySettings) -> Self {
        Self {
            storage,
            records,
            settings,
        }
    }

    pub fn settings(&self) -> &VerifySettings {
        &self.settings
    }

    /// Run every task to completion (success, fatal error, or exhausted retries).
    /// Individual failures are collected in the report, never returned as errors.
    pub async fn run(&self, tasks: Vec<VerificationTask>) -> RunReport {
        let mut report = RunReport {
            selected: tasks.len(),
            ..RunReport::default()
        };
        let gate = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut join_set = tokio::task::JoinSet::new();
        // Keys of tasks still running, so a panicked task can still be named.
        let mut running: HashMap<tokio::task::Id, String> = HashMap::with_capacity(tasks.len());

        for task in tasks {
            let storage = Arc::clone(&self.storage);
            let records = Arc::clone(&self.records);
            let gate = Arc::clone(&gate);
            let settings = self.settings;
            let key = task.key.clone();
            let handle = join_set.spawn(async move {
                verify_one(&*storage, &*records, &gate, &settings, task).await
            });
            running.insert(handle.id(), key);
        }

        while let Some(joined) = join_set.join_next_with_id().await {
            let res = match joined {
                Ok((id, r)) => {
                    running.remove(&id);
                    r
                }
                Err(e) => {
                    let key = running.remove(&e.id()).unwrap_or_default();
                    tracing::error!(key = %key, "verification task aborted: {}", e);
                    report.aborted += 1;
                    report.failed.push(TaskFailure {
                        key,
                        attempts: 0,
                        kind: ErrorKind::Other,
                        error: format!("worker aborted: {}", e),
                    });
                    continue;
                }
            };
            report.suppressed_transport_errors += res.suppressed;
            match res.outcome {
                Ok(AttemptOutcome::Verified(_)) => report.verified += 1,
                Ok(AttemptOutcome::Touched) => report.touched += 1,
                Err(exhausted) => {
                    tracing::warn!(
                        key = %res.key,
                        attempts = exhausted.attempts,
                        "giving up on object: {}",
                        exhausted.error
                    );
                    report.failed.push(TaskFailure {
                        key: res.key,
                        attempts: exhausted.attempts,
                        kind: exhausted.kind,
                        error: exhausted.error.to_string(),
                    });
                }
            }
        }

        report
    }
}

async fn verify_one<S: ObjectStore, R: RecordStore>(
    storage: &S,
    records: &R,
    gate: &Arc<Semaphore>,
    settings: &VerifySettings,
    task: VerificationTask,
) -> TaskResult {
    let mut suppressed = 0usize;
    let current = &task;
    let outcome = retry::run_with_retry(
        &settings.retry,
        move |_| worker::attempt(storage, records, gate, settings, current),
        |b| match b.kind.class() {
            FailureClass::Suppressed => {
                suppressed += 1;
                tracing::debug!(
                    key = %task.key,
                    tries = b.tries,
                    "suppressed transport error: {}",
                    b.error
                );
            }
            _ => tracing::info!(
                key = %task.key,
                "backing off {:.1} seconds after {} tries: {}",
                b.wait.as_secs_f64(),
                b.tries,
                b.error
            ),
        },
    )
    .await;
    if let Err(e) = &outcome {
        if e.kind == ErrorKind::TlsVerification {
            suppressed += 1;
        }
    }
    TaskResult {
        key: task.key,
        outcome,
        suppressed,
    }
}
