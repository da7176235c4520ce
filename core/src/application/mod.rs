//! Application layer - Use case services.
//!
//! Services are thin orchestrators that:
//! - Accept domain types as inputs
//! - Use ports (traits) for external dependencies
//! - Return domain types as outputs

mod scan_adapter;
mod scan_job;
mod status_board;

pub use scan_adapter::ScanAdapter;
pub use scan_job::{JobOutcome, Outcome, ScanJob};
pub use status_board::StatusBoard;
