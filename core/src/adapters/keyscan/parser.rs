//! Parser for ssh-keyscan's known_hosts-style output.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::HostKey;

/// Exactly three whitespace-separated fields: host, key type, key.
static KEY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+)\s+(\S+)\s+(\S+)\s*$").expect("key line pattern is valid")
});

/// Keys and rejected lines from one run, both in output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOutput {
    pub keys: Vec<HostKey>,
    pub rejected: Vec<String>,
}

/// Parse ssh-keyscan standard output.
///
/// Each data line is `<host> <key type> <key>`. Any line with exactly three
/// fields is a key; the key blob is not validated. Blank lines and `#`
/// comments (the server banners) are skipped.
pub fn parse_keyscan_output(output: &str) -> ParsedOutput {
    let mut parsed = ParsedOutput::default();

    for line in output.lines() {
        let line = line.trim_end_matches('\r');
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match parse_line(trimmed) {
            Some(key) => parsed.keys.push(key),
            None => parsed.rejected.push(line.to_string()),
        }
    }

    parsed
}

fn parse_line(line: &str) -> Option<HostKey> {
    let caps = KEY_LINE.captures(line)?;
    Some(HostKey::new(&caps[1], &caps[2], &caps[3]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ED25519: &str = "AAAAC3NzaC1lZDI1NTE5AAAAIOMqqnkVzrm0SdG6UOoqKLsabgH5C9okWi0dh2l9GKJl";
    const RSA: &str = "AAAAB3NzaC1yc2EAAAADAQABAAAAQQABAgMEBQYHCAkKCwwNDg8QERITFBUWFxgZGhscHR4fICEiIyQlJicoKSorLC0uLzAxMjM0NTY3ODk6Ozw9Pj9A";

    #[test]
    fn test_parse_preserves_order() {
        let output = format!(
            "192.0.2.1 ssh-ed25519 {}\n192.0.2.1 ssh-rsa {}\n",
            ED25519, RSA
        );
        let parsed = parse_keyscan_output(&output);

        assert!(parsed.rejected.is_empty());
        let types: Vec<&str> = parsed.keys.iter().map(|k| k.key_type.as_str()).collect();
        assert_eq!(types, vec!["ssh-ed25519", "ssh-rsa"]);
        assert_eq!(parsed.keys[0].host, "192.0.2.1");
        assert_eq!(
            parsed.keys[1].fingerprint.as_deref(),
            Some("SHA256:s//HZwbEWM97zkprQsx04tAKUD+DIOp672qkRsH721Q")
        );
    }

    #[test]
    fn test_skips_comments_and_blank_lines() {
        let output = format!(
            "# 192.0.2.1:22 SSH-2.0-OpenSSH_9.6\n\n   \n[192.0.2.1]:2222 ssh-ed25519 {}\r\n",
            ED25519
        );
        let parsed = parse_keyscan_output(&output);

        assert!(parsed.rejected.is_empty());
        assert_eq!(parsed.keys.len(), 1);
        assert_eq!(parsed.keys[0].host, "[192.0.2.1]:2222");
    }

    #[test]
    fn test_empty_output() {
        assert_eq!(parse_keyscan_output(""), ParsedOutput::default());
    }

    #[test]
    fn test_rejects_wrong_field_count() {
        let output = format!(
            "192.0.2.1 ssh-ed25519\n192.0.2.1 ssh-ed25519 {} extra\n192.0.2.1 ssh-ed25519 {}\n",
            ED25519, ED25519
        );
        let parsed = parse_keyscan_output(&output);

        assert_eq!(parsed.keys.len(), 1);
        assert_eq!(
            parsed.rejected,
            vec![
                "192.0.2.1 ssh-ed25519".to_string(),
                format!("192.0.2.1 ssh-ed25519 {} extra", ED25519),
            ]
        );
    }

    #[test]
    fn test_three_fields_are_a_key_even_if_blob_is_odd() {
        let output = "192.0.2.1 ssh-ed25519 AAAA...\n192.0.2.1 ssh-rsa AAAA...\n";
        let parsed = parse_keyscan_output(output);

        assert!(parsed.rejected.is_empty());
        let types: Vec<&str> = parsed.keys.iter().map(|k| k.key_type.as_str()).collect();
        assert_eq!(types, vec!["ssh-ed25519", "ssh-rsa"]);
        assert_eq!(parsed.keys[0].key, "AAAA...");
        assert!(parsed.keys.iter().all(|k| k.fingerprint.is_none()));
    }
}
