//! Scanner description and the scan parameters it accepts.
//!
//! The daemon hands parameters over as a loose name/value map. They are
//! checked here and folded into [`ScanOptions`] so nothing downstream has
//! to deal with strings.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{ScanOptions, ScanTarget, DEFAULT_SSH_PORT};
use crate::error::{Error, Result};

/// Parameter id for the SSH port.
pub const SSH_PORT_PARAM: &str = "sshport";

/// Parameter id for the key dump toggle.
pub const KEYS_AS_LOG_PARAM: &str = "sshkeyaslog";

pub const SCANNER_NAME: &str = "ssh-keyscan";

pub const SCANNER_DESCRIPTION: &str = "\
This scanner runs the tool 'ssh-keyscan' to scan the target hosts.
The target port list is ignored, instead the ssh port is given as
an explicit scan configuration parameter.

This tool is available for most operating systems as part of the OpenSSH package.
It gathers the public ssh host keys of a number of hosts.

The keys are collected as host details. Optionally, the keys are additionally
dumped in log results.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Integer,
    Boolean,
}

/// Default value of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(i64),
    Boolean(bool),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Integer(v) => write!(f, "{}", v),
            ParamValue::Boolean(v) => write!(f, "{}", u8::from(*v)),
        }
    }
}

/// Description of one scan parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannerParam {
    pub id: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub default: ParamValue,
    pub mandatory: bool,
    pub description: &'static str,
}

/// All parameters the scanner understands.
pub fn scanner_params() -> Vec<ScannerParam> {
    vec![
        ScannerParam {
            id: SSH_PORT_PARAM,
            name: "SSH Port",
            param_type: ParamType::Integer,
            default: ParamValue::Integer(i64::from(DEFAULT_SSH_PORT)),
            mandatory: true,
            description: "The SSH Port to connect to on the remote hosts.",
        },
        ScannerParam {
            id: KEYS_AS_LOG_PARAM,
            name: "Dump keys as log results",
            param_type: ParamType::Boolean,
            default: ParamValue::Boolean(false),
            mandatory: false,
            description: "Whether to create log results with key details.",
        },
    ]
}

/// What the scanner reports about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannerInfo {
    pub name: &'static str,
    /// Version of the wrapped tool. ssh-keyscan does not report one.
    pub version: Option<String>,
    pub server_version: &'static str,
    pub description: &'static str,
    pub params: Vec<ScannerParam>,
}

impl ScannerInfo {
    pub fn new() -> Self {
        Self {
            name: SCANNER_NAME,
            version: None,
            server_version: env!("CARGO_PKG_VERSION"),
            description: SCANNER_DESCRIPTION,
            params: scanner_params(),
        }
    }

    /// Version string for display.
    pub fn version_display(&self) -> &str {
        self.version.as_deref().unwrap_or("Not available")
    }
}

impl Default for ScannerInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameters of one scan after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanParams {
    pub port: u16,
    pub keys_as_log: bool,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            port: DEFAULT_SSH_PORT,
            keys_as_log: false,
        }
    }
}

impl ScanParams {
    /// Parse the daemon's name/value map. Unknown names are ignored.
    pub fn parse(raw: &BTreeMap<String, String>) -> Result<Self> {
        let mut params = Self::default();

        if let Some(value) = raw.get(SSH_PORT_PARAM) {
            params.port = value
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| invalid(SSH_PORT_PARAM, value))?;
        }

        if let Some(value) = raw.get(KEYS_AS_LOG_PARAM) {
            params.keys_as_log =
                parse_bool(value).ok_or_else(|| invalid(KEYS_AS_LOG_PARAM, value))?;
        }

        Ok(params)
    }

    /// Apply the parameters on top of existing options.
    pub fn apply(&self, options: ScanOptions) -> ScanOptions {
        options.with_keys_as_log(self.keys_as_log)
    }

    /// Build a target for `host` using these parameters.
    pub fn target(&self, host: impl Into<String>, options: ScanOptions) -> ScanTarget {
        ScanTarget::with_options(host, self.port, self.apply(options))
    }
}

/// Accepts `1`/`true`/`yes` and `0`/`false`/`no`/empty, ignoring case.
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" | "" => Some(false),
        _ => None,
    }
}

pub(crate) fn invalid(name: &str, value: &str) -> Error {
    Error::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_when_empty() {
        let params = ScanParams::parse(&BTreeMap::new()).unwrap();
        assert_eq!(params, ScanParams::default());
        assert_eq!(params.port, 22);
        assert!(!params.keys_as_log);
    }

    #[test]
    fn test_parse_values() {
        let params =
            ScanParams::parse(&raw(&[("sshport", "2222"), ("sshkeyaslog", "1")])).unwrap();
        assert_eq!(params.port, 2222);
        assert!(params.keys_as_log);

        let target = params.target("192.0.2.1", ScanOptions::default());
        assert_eq!(target.port(), 2222);
        assert!(target.options().keys_as_log);
    }

    #[test]
    fn test_rejects_out_of_range_port() {
        assert!(ScanParams::parse(&raw(&[("sshport", "0")])).is_err());
        assert!(ScanParams::parse(&raw(&[("sshport", "70000")])).is_err());
        assert!(ScanParams::parse(&raw(&[("sshport", "ssh")])).is_err());
    }

    #[test]
    fn test_rejects_bad_boolean() {
        let err = ScanParams::parse(&raw(&[("sshkeyaslog", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("sshkeyaslog"));
    }

    #[test]
    fn test_scanner_info() {
        let info = ScannerInfo::new();
        assert_eq!(info.name, "ssh-keyscan");
        assert_eq!(info.version_display(), "Not available");
        assert_eq!(info.params.len(), 2);
        assert_eq!(info.params[0].default.to_string(), "22");
        assert_eq!(info.params[1].default.to_string(), "0");
    }
}
