//! Host key records collected from ssh-keyscan.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One public host key offered by a remote SSH server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostKey {
    /// Host exactly as ssh-keyscan printed it (`host` or `[host]:port`).
    pub host: String,
    /// Key algorithm, e.g. `ssh-ed25519`.
    pub key_type: String,
    /// Base64-encoded public key blob.
    pub key: String,
    /// OpenSSH-style SHA256 fingerprint of the decoded blob, or `None` when
    /// the blob is not valid base64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl HostKey {
    /// Build a record from the three fields of a known_hosts-style line.
    ///
    /// The key is kept verbatim even when it does not decode.
    pub fn new(
        host: impl Into<String>,
        key_type: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        let key = key.into();
        let fingerprint = fingerprint(&key).ok();
        Self {
            host: host.into(),
            key_type: key_type.into(),
            key,
            fingerprint,
        }
    }

    /// Fingerprint for display.
    pub fn fingerprint_display(&self) -> &str {
        self.fingerprint.as_deref().unwrap_or("-")
    }

    /// The record as a known_hosts line.
    pub fn known_hosts_line(&self) -> String {
        format!("{} {} {}", self.host, self.key_type, self.key)
    }
}

impl std::fmt::Display for HostKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.host, self.key_type, self.fingerprint_display())
    }
}

/// Compute `SHA256:<base64 without padding>` over a base64 key blob,
/// matching `ssh-keygen -l`.
pub fn fingerprint(encoded_key: &str) -> std::result::Result<String, base64::DecodeError> {
    let blob = STANDARD.decode(encoded_key)?;
    let digest = Sha256::digest(&blob);
    Ok(format!("SHA256:{}", STANDARD_NO_PAD.encode(digest)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ED25519: &str = "AAAAC3NzaC1lZDI1NTE5AAAAIOMqqnkVzrm0SdG6UOoqKLsabgH5C9okWi0dh2l9GKJl";

    #[test]
    fn test_fingerprint_matches_ssh_keygen_format() {
        assert_eq!(
            fingerprint(ED25519).unwrap(),
            "SHA256:+DiY3wvvV6TuJJhbpZisF/zLDA0zPMSvHdkr4UvCOqU"
        );
    }

    #[test]
    fn test_undecodable_key_has_no_fingerprint() {
        let key = HostKey::new("192.0.2.1", "ssh-ed25519", "AAAA...");
        assert_eq!(key.key, "AAAA...");
        assert_eq!(key.fingerprint, None);
        assert_eq!(key.to_string(), "192.0.2.1 ssh-ed25519 -");

        let json = serde_json::to_value(&key).unwrap();
        assert!(json.get("fingerprint").is_none());
    }

    #[test]
    fn test_valid_key_has_fingerprint() {
        let key = HostKey::new("192.0.2.1", "ssh-ed25519", ED25519);
        assert_eq!(
            key.fingerprint.as_deref(),
            Some("SHA256:+DiY3wvvV6TuJJhbpZisF/zLDA0zPMSvHdkr4UvCOqU")
        );
    }

    #[test]
    fn test_known_hosts_line() {
        let key = HostKey::new("[192.0.2.1]:2222", "ssh-ed25519", ED25519);
        assert_eq!(
            key.known_hosts_line(),
            format!("[192.0.2.1]:2222 ssh-ed25519 {}", ED25519)
        );
    }
}
