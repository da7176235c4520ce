//! Domain layer - Pure data models for a keyscan run.
//!
//! These types have no I/O dependencies and can be tested in isolation.

mod key;
pub mod params;
mod report;
mod scan;
mod status;
mod target;

pub use key::{fingerprint, HostKey};
pub use params::{ScanParams, ScannerInfo, ScannerParam};
pub use report::{ReportItem, ReportKind, KEY_DUMP_LOG, SSH_KEY_DETAIL, SUMMARY_LOG};
pub use scan::{FailureKind, ScanFailure, ScanResult};
pub use status::{ScanStatus, StatusError};
pub use target::{AddressFamily, ScanOptions, ScanTarget, DEFAULT_SCAN_TIMEOUT, DEFAULT_SSH_PORT};
