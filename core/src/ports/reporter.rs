//! Result reporting port (interface).

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::ReportItem;

/// Port for the daemon's reporting channel.
///
/// Results for different scans may arrive interleaved from concurrent jobs;
/// `scan_id` tells them apart.
pub trait ReportSink: Send + Sync {
    fn report(&self, scan_id: Uuid, item: ReportItem);
}

impl<S: ReportSink + ?Sized> ReportSink for Arc<S> {
    fn report(&self, scan_id: Uuid, item: ReportItem) {
        (**self).report(scan_id, item)
    }
}
