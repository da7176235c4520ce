//! Scan target and per-target options.

use std::time::Duration;

use serde::Serialize;

/// The SSH port used when the daemon does not supply one.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Wall-clock bound on a single ssh-keyscan invocation.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// AddressFamily
// ============================================================================

/// Restricts ssh-keyscan to one IP family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// Let the resolver decide.
    #[default]
    Any,
    /// IPv4 only (`-4`).
    V4,
    /// IPv6 only (`-6`).
    V6,
}

impl AddressFamily {
    /// The ssh-keyscan flag for this family, if any.
    pub fn flag(&self) -> Option<&'static str> {
        match self {
            AddressFamily::Any => None,
            AddressFamily::V4 => Some("-4"),
            AddressFamily::V6 => Some("-6"),
        }
    }
}

// ============================================================================
// ScanOptions
// ============================================================================

/// Recognised options for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanOptions {
    /// Upper bound on the subprocess lifetime.
    pub timeout: Duration,
    /// Connection timeout handed to ssh-keyscan itself (`-T`), in seconds.
    pub connect_timeout: Option<u32>,
    /// Key types to request (`-t`). Empty means the tool's default set.
    pub key_types: Vec<String>,
    /// IP family restriction.
    pub address_family: AddressFamily,
    /// Flags appended verbatim before the host argument.
    pub extra_flags: Vec<String>,
    /// Also dump the collected keys as a log result.
    pub keys_as_log: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_SCAN_TIMEOUT,
            connect_timeout: None,
            key_types: Vec::new(),
            address_family: AddressFamily::Any,
            extra_flags: Vec::new(),
            keys_as_log: false,
        }
    }
}

impl ScanOptions {
    /// Set the subprocess timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the ssh-keyscan connect timeout in seconds.
    pub fn with_connect_timeout(mut self, secs: Option<u32>) -> Self {
        self.connect_timeout = secs;
        self
    }

    /// Set the requested key types.
    pub fn with_key_types(mut self, types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.key_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Set the address family.
    pub fn with_address_family(mut self, family: AddressFamily) -> Self {
        self.address_family = family;
        self
    }

    /// Set the extra flags.
    pub fn with_extra_flags(mut self, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_flags = flags.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable the key dump log.
    pub fn with_keys_as_log(mut self, enabled: bool) -> Self {
        self.keys_as_log = enabled;
        self
    }
}

// ============================================================================
// ScanTarget
// ============================================================================

/// A single host to collect SSH host keys from.
///
/// Fields are private so a target cannot change once a scan has started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanTarget {
    host: String,
    port: u16,
    #[serde(skip)]
    options: ScanOptions,
}

impl ScanTarget {
    /// Create a target on the default SSH port with default options.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            options: ScanOptions::default(),
        }
    }

    /// Create a target with an explicit port and options.
    pub fn with_options(host: impl Into<String>, port: u16, options: ScanOptions) -> Self {
        Self {
            host: host.into(),
            port,
            options,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Check the host and port before anything is spawned.
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.host.is_empty() {
            return Err("host must not be empty".to_string());
        }
        if self.host.starts_with('-') {
            return Err(format!("host '{}' must not start with '-'", self.host));
        }
        if self
            .host
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(format!(
                "host '{}' must not contain whitespace or control characters",
                self.host.escape_default()
            ));
        }
        if self.port == 0 {
            return Err("port must be in 1..=65535".to_string());
        }
        Ok(())
    }
}

impl std::fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
