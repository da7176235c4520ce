//! One target's scan as the daemon sees it: status changes plus reported
//! results.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{ScanAdapter, StatusBoard};
use crate::domain::{
    ReportItem, ScanFailure, ScanResult, ScanStatus, ScanTarget, StatusError, KEY_DUMP_LOG,
    SSH_KEY_DETAIL, SUMMARY_LOG,
};
use crate::ports::{KeyscanTool, ReportSink};

/// Final state of a job.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub id: Uuid,
    pub target: ScanTarget,
    pub status: ScanStatus,
    /// Exactly one of result or failure, never both.
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Serializable wrapper over the scan result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Result(ScanResult),
    Failure(ScanFailure),
}

impl JobOutcome {
    pub fn result(&self) -> Option<&ScanResult> {
        match &self.outcome {
            Outcome::Result(r) => Some(r),
            Outcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ScanFailure> {
        match &self.outcome {
            Outcome::Result(_) => None,
            Outcome::Failure(f) => Some(f),
        }
    }
}

/// A queued scan of one target.
pub struct ScanJob {
    id: Uuid,
    target: ScanTarget,
    board: Arc<StatusBoard>,
}

impl ScanJob {
    /// Create a job tracked on its own private board.
    pub fn new(target: ScanTarget) -> Self {
        Self::with_board(Uuid::new_v4(), target, Arc::new(StatusBoard::new()))
    }

    /// Create a job tracked on a shared board. Registers it as queued.
    pub fn with_board(id: Uuid, target: ScanTarget, board: Arc<StatusBoard>) -> Self {
        board.register(id);
        Self { id, target, board }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn target(&self) -> &ScanTarget {
        &self.target
    }

    pub fn status(&self) -> Option<ScanStatus> {
        self.board.get(self.id)
    }

    /// Run the scan and report its results to `sink`.
    ///
    /// On success every key becomes an `ssh-key` host detail, followed by a
    /// summary log. The summary is always sent, even with zero keys, because
    /// the daemon only stores host details for hosts that have a result.
    /// On failure a single error item carries the diagnostics.
    pub async fn execute<T, S>(
        self,
        adapter: &ScanAdapter<T>,
        sink: &S,
    ) -> Result<JobOutcome, StatusError>
    where
        T: KeyscanTool,
        S: ReportSink + ?Sized,
    {
        self.board.advance(self.id, ScanStatus::Running)?;

        match adapter.run_scan(&self.target).await {
            Ok(result) => {
                self.report_result(&result, sink);
                self.board.advance(self.id, ScanStatus::Finished)?;
                info!(
                    host = self.target.host(),
                    port = self.target.port(),
                    keys = result.keys.len(),
                    "scan finished"
                );
                Ok(self.into_outcome(ScanStatus::Finished, Outcome::Result(result)))
            }
            Err(failure) => {
                sink.report(
                    self.id,
                    ReportItem::error(self.target.host(), failure.diagnostic()),
                );
                self.board.advance(self.id, ScanStatus::Failed)?;
                info!(
                    host = self.target.host(),
                    kind = %failure.kind,
                    "scan failed"
                );
                Ok(self.into_outcome(ScanStatus::Failed, Outcome::Failure(failure)))
            }
        }
    }

    fn report_result<S: ReportSink + ?Sized>(&self, result: &ScanResult, sink: &S) {
        let port = self.target.port();

        for key in &result.keys {
            sink.report(
                self.id,
                ReportItem::host_detail(
                    &key.host,
                    SSH_KEY_DETAIL,
                    format!("{} {} {}", port, key.key_type, key.key),
                ),
            );
        }

        sink.report(
            self.id,
            ReportItem::log(
                self.target.host(),
                SUMMARY_LOG,
                format!(
                    "Via ssh-keyscan {} public ssh keys were found at port {}.",
                    result.keys.len(),
                    port
                ),
            ),
        );

        if self.target.options().keys_as_log {
            let lines: Vec<String> = result.keys.iter().map(|k| k.known_hosts_line()).collect();
            sink.report(
                self.id,
                ReportItem::log(
                    self.target.host(),
                    KEY_DUMP_LOG,
                    format!("Via ssh-keyscan found keys:\n\n{}", lines.join("\n")),
                ),
            );
        }
    }

    fn into_outcome(self, status: ScanStatus, outcome: Outcome) -> JobOutcome {
        JobOutcome {
            id: self.id,
            target: self.target,
            status,
            outcome,
        }
    }
}
