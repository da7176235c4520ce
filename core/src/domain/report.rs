//! Result items handed to the daemon's reporting channel.

use serde::{Deserialize, Serialize};

/// Host detail name used for every collected key.
pub const SSH_KEY_DETAIL: &str = "ssh-key";

/// Log name for the per-target summary.
pub const SUMMARY_LOG: &str = "ssh-keyscan summary";

/// Log name for the optional key dump.
pub const KEY_DUMP_LOG: &str = "ssh-keyscan key dump";

/// OSP result type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportKind {
    HostDetail,
    Log,
    Error,
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReportKind::HostDetail => "Host Detail",
            ReportKind::Log => "Log Message",
            ReportKind::Error => "Error Message",
        };
        f.write_str(s)
    }
}

/// One result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportItem {
    pub kind: ReportKind,
    pub host: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub value: String,
}

impl ReportItem {
    pub fn host_detail(
        host: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            kind: ReportKind::HostDetail,
            host: host.into(),
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn log(host: impl Into<String>, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: ReportKind::Log,
            host: host.into(),
            name: name.into(),
            value: value.into(),
        }
    }

    /// Error rows carry no name.
    pub fn error(host: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: ReportKind::Error,
            host: host.into(),
            name: String::new(),
            value: value.into(),
        }
    }
}
