//! In-memory result collection.

use parking_lot::Mutex;
use uuid::Uuid;

use crate::domain::{ReportItem, ReportKind};
use crate::ports::ReportSink;

/// Collects report items in arrival order.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    items: Mutex<Vec<(Uuid, ReportItem)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All items received so far.
    pub fn items(&self) -> Vec<(Uuid, ReportItem)> {
        self.items.lock().clone()
    }

    /// Items belonging to one scan.
    pub fn items_for(&self, scan_id: Uuid) -> Vec<ReportItem> {
        self.items
            .lock()
            .iter()
            .filter(|(id, _)| *id == scan_id)
            .map(|(_, item)| item.clone())
            .collect()
    }

    /// Items of one kind belonging to one scan.
    pub fn items_of_kind(&self, scan_id: Uuid, kind: ReportKind) -> Vec<ReportItem> {
        self.items_for(scan_id)
            .into_iter()
            .filter(|item| item.kind == kind)
            .collect()
    }

    /// Remove and return everything collected.
    pub fn take(&self) -> Vec<(Uuid, ReportItem)> {
        std::mem::take(&mut *self.items.lock())
    }
}

impl ReportSink for MemoryReporter {
    fn report(&self, scan_id: Uuid, item: ReportItem) {
        self.items.lock().push((scan_id, item));
    }
}
