//! Outcome of scanning one target.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::HostKey;

// ============================================================================
// ScanResult
// ============================================================================

/// Keys collected from one target, in the order ssh-keyscan printed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Host that was scanned, as given by the caller.
    pub target: String,
    /// Port that was scanned.
    pub port: u16,
    /// Collected keys. Empty when the host offered none or was unreachable.
    pub keys: Vec<HostKey>,
    /// Wall-clock time spent in the subprocess, in milliseconds.
    pub duration_ms: u64,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key types in output order.
    pub fn key_types(&self) -> Vec<&str> {
        self.keys.iter().map(|k| k.key_type.as_str()).collect()
    }
}

// ============================================================================
// ScanFailure
// ============================================================================

/// Why a target could not be scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// The tool is missing or could not be executed.
    Spawn,
    /// The tool exceeded its timeout and was killed.
    Timeout,
    /// The tool exited unsuccessfully.
    Tool,
    /// The tool printed a line that is not a host key record.
    Parse,
    /// The target was rejected before anything was spawned.
    InvalidTarget,
    /// The scan task ended without producing an outcome.
    Aborted,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Spawn => "spawn",
            FailureKind::Timeout => "timeout",
            FailureKind::Tool => "tool",
            FailureKind::Parse => "parse",
            FailureKind::InvalidTarget => "invalid-target",
            FailureKind::Aborted => "aborted",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-target failure with the diagnostics captured from the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFailure {
    pub kind: FailureKind,
    /// Host that was scanned, as given by the caller.
    pub target: String,
    /// Human-readable summary.
    pub message: String,
    /// Exit code of the tool, if it exited normally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Captured standard error.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    /// Output lines that failed to parse.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected_lines: Vec<String>,
}

impl ScanFailure {
    pub fn new(kind: FailureKind, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            message: message.into(),
            exit_code: None,
            stderr: String::new(),
            rejected_lines: Vec::new(),
        }
    }

    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    pub fn with_rejected_lines(mut self, lines: Vec<String>) -> Self {
        self.rejected_lines = lines;
        self
    }

    /// Full diagnostic text for an error report.
    pub fn diagnostic(&self) -> String {
        let mut text = self.message.clone();
        if !self.rejected_lines.is_empty() {
            text.push_str("\n\n");
            text.push_str(&self.rejected_lines.join("\n"));
        }
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            text.push_str("\n\n");
            text.push_str(stderr);
        }
        text
    }
}

impl fmt::Display for ScanFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.target, self.kind, self.message)
    }
}

impl std::error::Error for ScanFailure {}
