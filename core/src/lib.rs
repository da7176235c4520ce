//! Keyscan Core Library
//!
//! Scanner backend that collects SSH host keys by running `ssh-keyscan`.
//! Provides functionality to:
//! - Run one keyscan per target and parse its output into host keys
//! - Kill and reap the subprocess when a scan exceeds its timeout
//! - Track per-target scan status and report results to a sink
//! - Run many targets with bounded concurrency
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure business logic and data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services
//!
//! # Platform Support
//! - Linux and macOS: graceful SIGTERM before a hard kill on timeout
//! - Other platforms: hard kill only

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod engine;
pub mod error;

// Re-export domain types (primary API)
pub use domain::{
    AddressFamily, FailureKind, HostKey, ReportItem, ReportKind, ScanFailure, ScanOptions,
    ScanParams, ScanResult, ScanStatus, ScanTarget, ScannerInfo,
};

// Re-export other commonly used types
pub use adapters::{MemoryReporter, SshKeyscan, ToolLocator};
pub use application::{JobOutcome, ScanAdapter, ScanJob, StatusBoard};
pub use config::{Config, ConfigStore};
pub use engine::ScanEngine;
pub use error::{Error, Result};
pub use ports::{KeyscanTool, ReportSink};
