//! Per-target scan status.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatusError {
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition { from: ScanStatus, to: ScanStatus },

    #[error("unknown scan {0}")]
    UnknownScan(Uuid),
}

/// Progress of one target's scan.
///
/// Moves forward only: `Queued -> Running -> Finished | Failed`.
/// A target may also fail straight from `Queued`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScanStatus {
    #[default]
    Queued,
    Running,
    Finished,
    Failed,
}

impl ScanStatus {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Finished | ScanStatus::Failed)
    }

    pub fn can_transition_to(&self, next: ScanStatus) -> bool {
        matches!(
            (self, next),
            (ScanStatus::Queued, ScanStatus::Running)
                | (ScanStatus::Queued, ScanStatus::Failed)
                | (ScanStatus::Running, ScanStatus::Finished)
                | (ScanStatus::Running, ScanStatus::Failed)
        )
    }

    /// Move to `next`, or leave the status untouched and report why not.
    pub fn advance(&mut self, next: ScanStatus) -> std::result::Result<(), StatusError> {
        if !self.can_transition_to(next) {
            return Err(StatusError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Queued => "QUEUED",
            ScanStatus::Running => "RUNNING",
            ScanStatus::Finished => "FINISHED",
            ScanStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        let mut status = ScanStatus::default();
        assert_eq!(status, ScanStatus::Queued);
        status.advance(ScanStatus::Running).unwrap();
        status.advance(ScanStatus::Finished).unwrap();
        assert!(status.is_terminal());
    }

    #[test]
    fn test_queued_can_fail_directly() {
        let mut status = ScanStatus::Queued;
        status.advance(ScanStatus::Failed).unwrap();
        assert_eq!(status, ScanStatus::Failed);
    }

    #[test]
    fn test_no_regression_from_terminal_states() {
        for terminal in [ScanStatus::Finished, ScanStatus::Failed] {
            for next in [
                ScanStatus::Queued,
                ScanStatus::Running,
                ScanStatus::Finished,
                ScanStatus::Failed,
            ] {
                let mut status = terminal;
                assert!(status.advance(next).is_err());
                assert_eq!(status, terminal);
            }
        }
    }

    #[test]
    fn test_running_cannot_requeue() {
        let mut status = ScanStatus::Running;
        let err = status.advance(ScanStatus::Queued).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid status transition from RUNNING to QUEUED"
        );
    }
}
