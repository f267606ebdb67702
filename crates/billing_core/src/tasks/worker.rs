//! Task worker draining the in-process queue.
//!
//! # Responsibility
//! - Run queued `RecalcTask`s against a migrated connection.
//! - Log task outcomes; never propagate task failures to producers.
//!
//! # Invariants
//! - `spawn` opens its own connection; SQLite handles are not shared
//!   across threads.
//! - The background loop ends once every `ChannelTaskQueue` is dropped.

use super::handlers::{set_comment, set_price};
use super::{RecalcTask, TaskError};
use crate::cache::TotalSumCache;
use crate::db::open_db;
use crate::repo::{RepoResult, SqliteBillingRepository, SubscriptionRepository};
use log::{error, info, warn};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

const WORKER_THREAD_NAME: &str = "billing-task-worker";

/// Outcome counters for a batch of executed tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub processed: usize,
    pub failed: usize,
}

impl DrainReport {
    fn record(&mut self, outcome: &Result<(), TaskError>) {
        self.processed += 1;
        if outcome.is_err() {
            self.failed += 1;
        }
    }
}

/// Consumer side of the task queue.
pub struct TaskWorker {
    receiver: Receiver<RecalcTask>,
    cache: Arc<TotalSumCache>,
}

impl TaskWorker {
    pub fn new(receiver: Receiver<RecalcTask>, cache: Arc<TotalSumCache>) -> Self {
        Self { receiver, cache }
    }

    /// Runs every task queued so far on `conn`, then returns.
    ///
    /// # Errors
    /// - Returns an error only when `conn` is not a migrated billing
    ///   connection; individual task failures are counted in the report.
    pub fn drain(&self, conn: &Connection) -> RepoResult<DrainReport> {
        let repo = SqliteBillingRepository::try_new(conn)?;
        let mut report = DrainReport::default();
        for task in self.receiver.try_iter() {
            let outcome = run_task(&repo, &self.cache, task);
            report.record(&outcome);
        }
        Ok(report)
    }

    /// Moves the worker onto a background thread bound to `db_path`.
    ///
    /// The thread exits when all queue handles are dropped and returns the
    /// accumulated report.
    pub fn spawn(self, db_path: PathBuf) -> std::io::Result<JoinHandle<DrainReport>> {
        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || self.run_until_closed(db_path))
    }

    fn run_until_closed(self, db_path: PathBuf) -> DrainReport {
        let mut report = DrainReport::default();
        let conn = match open_db(&db_path) {
            Ok(conn) => conn,
            Err(err) => {
                error!(
                    "event=worker_start module=tasks status=error error_code=db_open_failed error={err}"
                );
                return report;
            }
        };
        let repo = match SqliteBillingRepository::try_new(&conn) {
            Ok(repo) => repo,
            Err(err) => {
                error!(
                    "event=worker_start module=tasks status=error error_code=repo_init_failed error={err}"
                );
                return report;
            }
        };

        info!("event=worker_start module=tasks status=ok");
        for task in self.receiver.iter() {
            let outcome = run_task(&repo, &self.cache, task);
            report.record(&outcome);
        }
        info!(
            "event=worker_stop module=tasks status=ok processed={} failed={}",
            report.processed, report.failed
        );
        report
    }
}

fn run_task<R: SubscriptionRepository>(
    repo: &R,
    cache: &TotalSumCache,
    task: RecalcTask,
) -> Result<(), TaskError> {
    let started_at = Instant::now();
    let outcome = match task {
        RecalcTask::SetPrice(id) => set_price(repo, cache, id).map(|_| ()),
        RecalcTask::SetComment(id) => set_comment(repo, id).map(|_| ()),
    };

    match &outcome {
        Ok(()) => info!(
            "event=task_run module=tasks status=ok task={} subscription_id={} duration_ms={}",
            task.name(),
            task.subscription_id(),
            started_at.elapsed().as_millis()
        ),
        Err(TaskError::SubscriptionNotFound(_)) => warn!(
            "event=task_run module=tasks status=skipped task={} subscription_id={} error_code=subscription_missing",
            task.name(),
            task.subscription_id()
        ),
        Err(err) => error!(
            "event=task_run module=tasks status=error task={} subscription_id={} error={}",
            task.name(),
            task.subscription_id(),
            err
        ),
    }
    outcome
}
