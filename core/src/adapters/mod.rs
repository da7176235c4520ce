//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter handles communication with external systems.

pub mod discovery;
pub mod keyscan;
pub mod reporter;

// Re-export main types for convenience
pub use discovery::ToolLocator;
pub use keyscan::{keyscan_args, parse_keyscan_output, SshKeyscan};
pub use reporter::MemoryReporter;
