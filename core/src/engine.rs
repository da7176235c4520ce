//! Scan engine - runs queued targets through the adapter with a bounded
//! number of concurrent subprocesses.
//!
//! The engine stands in for the daemon's worker pool. Every target becomes
//! its own job with its own process. A failing target only ever produces a
//! failed outcome for itself.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::{JobOutcome, Outcome, ScanAdapter, ScanJob, StatusBoard};
use crate::domain::{FailureKind, ReportItem, ScanFailure, ScanStatus, ScanTarget};
use crate::ports::{KeyscanTool, ReportSink};

/// Concurrency used when none is configured.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Queue of scan jobs plus the status table the daemon polls.
pub struct ScanEngine<T: KeyscanTool + 'static> {
    adapter: Arc<ScanAdapter<T>>,
    board: Arc<StatusBoard>,
    max_concurrency: usize,
    queue: Mutex<Vec<ScanJob>>,
}

impl<T: KeyscanTool + 'static> ScanEngine<T> {
    /// Create an engine. A concurrency of zero is treated as one.
    pub fn new(adapter: ScanAdapter<T>, max_concurrency: usize) -> Self {
        Self {
            adapter: Arc::new(adapter),
            board: Arc::new(StatusBoard::new()),
            max_concurrency: max_concurrency.max(1),
            queue: Mutex::new(Vec::new()),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn adapter(&self) -> &ScanAdapter<T> {
        &self.adapter
    }

    /// Queue a target and return its scan id.
    pub fn submit(&self, target: ScanTarget) -> Uuid {
        let id = Uuid::new_v4();
        let job = ScanJob::with_board(id, target, Arc::clone(&self.board));
        self.queue.lock().push(job);
        id
    }

    /// Queue several targets, returning ids in the same order.
    pub fn submit_all(&self, targets: impl IntoIterator<Item = ScanTarget>) -> Vec<Uuid> {
        targets.into_iter().map(|t| self.submit(t)).collect()
    }

    /// Number of jobs waiting for the next `run`.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn status(&self, id: Uuid) -> Option<ScanStatus> {
        self.board.get(id)
    }

    pub fn statuses(&self) -> HashMap<Uuid, ScanStatus> {
        self.board.snapshot()
    }

    /// Forget every scan that has reached a terminal state.
    pub fn clear_finished(&self) -> usize {
        self.board.clear_finished()
    }

    /// Run every queued job and return outcomes in submission order.
    ///
    /// Dropping the returned future aborts the in-flight jobs, which kills
    /// their subprocesses.
    pub async fn run(&self, sink: Arc<dyn ReportSink>) -> Vec<JobOutcome> {
        let jobs = std::mem::take(&mut *self.queue.lock());
        if jobs.is_empty() {
            return Vec::new();
        }

        debug!(
            jobs = jobs.len(),
            max_concurrency = self.max_concurrency,
            "starting scan run"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut meta: Vec<(Uuid, ScanTarget)> = Vec::with_capacity(jobs.len());
        let mut set = JoinSet::new();

        for (index, job) in jobs.into_iter().enumerate() {
            meta.push((job.id(), job.target().clone()));

            let adapter = Arc::clone(&self.adapter);
            let sink = Arc::clone(&sink);
            let semaphore = Arc::clone(&semaphore);

            set.spawn(async move {
                // Held until the job (and its subprocess) is done
                let _permit = semaphore.acquire_owned().await;
                (index, job.execute(adapter.as_ref(), sink.as_ref()).await)
            });
        }

        let mut slots: Vec<Option<JobOutcome>> = meta.iter().map(|_| None).collect();

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, Ok(outcome))) => slots[index] = Some(outcome),
                Ok((index, Err(e))) => {
                    let (id, target) = meta[index].clone();
                    warn!(%id, error = %e, "scan job rejected");
                    slots[index] = Some(aborted(id, target, e.to_string()));
                }
                Err(e) => warn!(error = %e, "scan task ended abnormally"),
            }
        }

        slots
            .into_iter()
            .zip(meta)
            .map(|(slot, (id, target))| {
                slot.unwrap_or_else(|| {
                    let message = "scan task ended without an outcome".to_string();
                    if self.board.advance(id, ScanStatus::Failed).is_ok() {
                        sink.report(id, ReportItem::error(target.host(), message.clone()));
                    }
                    aborted(id, target, message)
                })
            })
            .collect()
    }
}

fn aborted(id: Uuid, target: ScanTarget, message: String) -> JobOutcome {
    let failure = ScanFailure::new(FailureKind::Aborted, target.host(), message);
    JobOutcome {
        id,
        target,
        status: ScanStatus::Failed,
        outcome: Outcome::Failure(failure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::adapters::MemoryReporter;
    use crate::domain::ReportKind;
    use crate::ports::{ToolError, ToolOutput};

    const ED25519: &str = "AAAAC3NzaC1lZDI1NTE5AAAAIOMqqnkVzrm0SdG6UOoqKLsabgH5C9okWi0dh2l9GKJl";

    /// Mock tool that records how many runs overlap.
    #[derive(Default)]
    struct MockTool {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl KeyscanTool for MockTool {
        async fn run(
            &self,
            args: &[String],
            _timeout: Duration,
        ) -> std::result::Result<ToolOutput, ToolError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let host = args.last().cloned().unwrap_or_default();
            if host.starts_with("panic") {
                panic!("keyscan tool crashed for {}", host);
            }
            if host.starts_with("bad") {
                return Ok(ToolOutput {
                    exit_code: Some(1),
                    stderr: format!("{}: no route", host),
                    ..ToolOutput::default()
                });
            }

            Ok(ToolOutput {
                exit_code: Some(0),
                stdout: format!("{} ssh-ed25519 {}\n", host, ED25519),
                ..ToolOutput::default()
            })
        }
    }

    fn hosts(names: &[&str]) -> Vec<ScanTarget> {
        names.iter().map(|n| ScanTarget::new(*n)).collect()
    }

    #[tokio::test]
    async fn test_outcomes_in_submission_order() {
        let engine = ScanEngine::new(ScanAdapter::new(MockTool::default()), 3);
        let ids = engine.submit_all(hosts(&["a.example", "b.example", "c.example"]));
        assert_eq!(engine.pending(), 3);
        assert_eq!(engine.status(ids[0]), Some(ScanStatus::Queued));

        let sink = Arc::new(MemoryReporter::new());
        let outcomes = engine.run(sink.clone()).await;

        assert_eq!(engine.pending(), 0);
        let returned: Vec<Uuid> = outcomes.iter().map(|o| o.id).collect();
        assert_eq!(returned, ids);
        for (outcome, host) in outcomes.iter().zip(["a.example", "b.example", "c.example"]) {
            assert_eq!(outcome.status, ScanStatus::Finished);
            assert_eq!(outcome.result().unwrap().keys[0].host, host);
            assert_eq!(engine.status(outcome.id), Some(ScanStatus::Finished));
        }
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let engine = ScanEngine::new(ScanAdapter::new(MockTool::default()), 2);
        engine.submit_all(hosts(&["h1", "h2", "h3", "h4", "h5", "h6"]));

        let outcomes = engine.run(Arc::new(MemoryReporter::new())).await;
        assert_eq!(outcomes.len(), 6);
        assert!(engine.adapter().tool().peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_zero_concurrency_means_one() {
        let engine = ScanEngine::new(ScanAdapter::new(MockTool::default()), 0);
        assert_eq!(engine.max_concurrency(), 1);
        engine.submit_all(hosts(&["h1", "h2", "h3"]));
        engine.run(Arc::new(MemoryReporter::new())).await;
        assert_eq!(engine.adapter().tool().peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let engine = ScanEngine::new(ScanAdapter::new(MockTool::default()), 4);
        let ids = engine.submit_all(hosts(&["good.example", "bad.example", "fine.example"]));

        let sink = Arc::new(MemoryReporter::new());
        let outcomes = engine.run(sink.clone()).await;

        assert_eq!(outcomes[0].status, ScanStatus::Finished);
        assert_eq!(outcomes[1].status, ScanStatus::Failed);
        assert_eq!(outcomes[1].failure().unwrap().kind, FailureKind::Tool);
        assert_eq!(outcomes[2].status, ScanStatus::Finished);

        assert_eq!(sink.items_of_kind(ids[1], ReportKind::Error).len(), 1);
        assert!(sink.items_of_kind(ids[0], ReportKind::Error).is_empty());
        assert!(sink
            .items_for(ids[0])
            .iter()
            .all(|item| !item.host.contains("bad")));
    }

    #[tokio::test]
    async fn test_panicking_job_is_aborted() {
        let engine = ScanEngine::new(ScanAdapter::new(MockTool::default()), 2);
        let ids = engine.submit_all(hosts(&["a.example", "panic.example", "c.example"]));

        let sink = Arc::new(MemoryReporter::new());
        let outcomes = engine.run(sink.clone()).await;

        let returned: Vec<Uuid> = outcomes.iter().map(|o| o.id).collect();
        assert_eq!(returned, ids);
        assert_eq!(outcomes[0].status, ScanStatus::Finished);
        assert_eq!(outcomes[2].status, ScanStatus::Finished);

        let aborted = &outcomes[1];
        assert_eq!(aborted.status, ScanStatus::Failed);
        assert_eq!(aborted.failure().unwrap().kind, FailureKind::Aborted);
        assert_eq!(aborted.target.host(), "panic.example");
        assert_eq!(engine.status(ids[1]), Some(ScanStatus::Failed));

        let items = sink.items_for(ids[1]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ReportKind::Error);
        assert_eq!(items[0].host, "panic.example");
    }

    #[tokio::test]
    async fn test_rejected_transition_is_aborted() {
        let engine = ScanEngine::new(ScanAdapter::new(MockTool::default()), 1);
        let ids = engine.submit_all(hosts(&["a.example", "b.example"]));
        // Failed before it ever ran, so it cannot move to Running
        engine.board.advance(ids[0], ScanStatus::Failed).unwrap();

        let sink = Arc::new(MemoryReporter::new());
        let outcomes = engine.run(sink.clone()).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].id, ids[0]);
        assert_eq!(outcomes[0].failure().unwrap().kind, FailureKind::Aborted);
        assert_eq!(engine.status(ids[0]), Some(ScanStatus::Failed));
        assert!(sink.items_for(ids[0]).is_empty());
        assert_eq!(outcomes[1].status, ScanStatus::Finished);
    }

    #[tokio::test]
    async fn test_run_with_empty_queue() {
        let engine = ScanEngine::new(ScanAdapter::new(MockTool::default()), 1);
        assert!(engine.run(Arc::new(MemoryReporter::new())).await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_finished() {
        let engine = ScanEngine::new(ScanAdapter::new(MockTool::default()), 1);
        engine.submit_all(hosts(&["h1", "h2"]));
        engine.run(Arc::new(MemoryReporter::new())).await;

        assert_eq!(engine.statuses().len(), 2);
        assert_eq!(engine.clear_finished(), 2);
        assert!(engine.statuses().is_empty());
    }
}
