//! Shared status table for in-flight scans.

use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::{ScanStatus, StatusError};

/// Tracks the [`ScanStatus`] of every registered scan.
///
/// Transitions go through [`ScanStatus::advance`], so an entry can never
/// move backwards.
#[derive(Debug, Default)]
pub struct StatusBoard {
    statuses: RwLock<HashMap<Uuid, ScanStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scan as queued. Re-registering an existing id is a no-op.
    pub fn register(&self, id: Uuid) {
        self.statuses.write().entry(id).or_default();
    }

    pub fn advance(&self, id: Uuid, next: ScanStatus) -> Result<(), StatusError> {
        let mut statuses = self.statuses.write();
        let status = statuses.get_mut(&id).ok_or(StatusError::UnknownScan(id))?;
        status.advance(next)
    }

    pub fn get(&self, id: Uuid) -> Option<ScanStatus> {
        self.statuses.read().get(&id).copied()
    }

    pub fn snapshot(&self) -> HashMap<Uuid, ScanStatus> {
        self.statuses.read().clone()
    }

    /// Drop all entries in a terminal state and return how many were removed.
    pub fn clear_finished(&self) -> usize {
        let mut statuses = self.statuses.write();
        let before = statuses.len();
        statuses.retain(|_, status| !status.is_terminal());
        before - statuses.len()
    }
}
