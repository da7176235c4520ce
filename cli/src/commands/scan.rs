//! Scan command - collect host keys from one or more hosts.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Args;
use keyscan_core::domain::params::{KEYS_AS_LOG_PARAM, SSH_PORT_PARAM};
use keyscan_core::{
    AddressFamily, JobOutcome, MemoryReporter, ReportItem, ReportSink, ScanAdapter, ScanEngine,
    ScanOptions, ScanParams, SshKeyscan,
};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

#[derive(Args)]
pub struct ScanArgs {
    /// Hosts to scan
    #[arg(required = true)]
    hosts: Vec<String>,

    /// SSH port (defaults to the configured port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Kill ssh-keyscan after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Connect timeout passed to ssh-keyscan (-T), in seconds
    #[arg(long)]
    connect_timeout: Option<u32>,

    /// Key types to request, comma separated (e.g. ed25519,rsa)
    #[arg(short = 't', long, value_delimiter = ',')]
    key_types: Vec<String>,

    /// Use IPv4 addresses only
    #[arg(short = '4', conflicts_with = "ipv6")]
    ipv4: bool,

    /// Use IPv6 addresses only
    #[arg(short = '6')]
    ipv6: bool,

    /// Also dump found keys as a log result
    #[arg(long)]
    keys_as_log: bool,

    /// Extra flag passed to ssh-keyscan (repeatable)
    #[arg(long = "extra-flag", allow_hyphen_values = true)]
    extra_flags: Vec<String>,

    /// Number of hosts scanned at once
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Path to the ssh-keyscan binary
    #[arg(long)]
    tool: Option<PathBuf>,

    /// Scanner parameter as NAME=VALUE, e.g. sshport=2222 (repeatable)
    #[arg(long = "param", value_name = "NAME=VALUE")]
    params: Vec<String>,
}

/// Prints each report item as it arrives.
struct ConsoleReporter;

impl ReportSink for ConsoleReporter {
    fn report(&self, _scan_id: Uuid, item: ReportItem) {
        if item.name.is_empty() {
            println!("[{}] {}: {}", item.kind, item.host, item.value);
        } else {
            println!("[{}] {} {}: {}", item.kind, item.host, item.name, item.value);
        }
    }
}

#[derive(Serialize)]
struct JsonReport {
    outcomes: Vec<JobOutcome>,
    reports: Vec<JsonItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonItem {
    scan_id: Uuid,
    #[serde(flatten)]
    item: ReportItem,
}

/// Run the scan. Returns the number of failed targets.
pub async fn run(args: ScanArgs, json: bool) -> Result<usize> {
    let config = super::load_config().await?;

    let params = scan_params(&args, config.default_port, config.keys_as_log)?;
    let options = options_from_args(&args, config.scan_options());
    let tool = SshKeyscan::locate(args.tool.clone().or(config.tool_path.clone()))?;
    let concurrency = args.concurrency.unwrap_or(config.max_concurrency);
    debug!(
        tool = %tool.program().display(),
        port = params.port,
        concurrency,
        hosts = args.hosts.len(),
        "starting scan"
    );

    let engine = ScanEngine::new(ScanAdapter::new(tool), concurrency);
    engine.submit_all(
        args.hosts
            .iter()
            .map(|host| params.target(host.as_str(), options.clone())),
    );

    let (outcomes, collected) = if json {
        let collector = Arc::new(MemoryReporter::new());
        let outcomes = engine.run(collector.clone()).await;
        (outcomes, collector.take())
    } else {
        (engine.run(Arc::new(ConsoleReporter)).await, Vec::new())
    };

    let failed = outcomes.iter().filter(|o| o.failure().is_some()).count();

    if json {
        let report = JsonReport {
            outcomes,
            reports: collected
                .into_iter()
                .map(|(scan_id, item)| JsonItem { scan_id, item })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(failed);
    }

    print_table(&outcomes);
    Ok(failed)
}

/// Fold the port flags and `--param` pairs into validated scan parameters.
/// `--param` entries win over the dedicated flags.
fn scan_params(args: &ScanArgs, default_port: u16, keys_as_log: bool) -> Result<ScanParams> {
    let mut raw = BTreeMap::new();
    raw.insert(
        SSH_PORT_PARAM.to_string(),
        args.port.unwrap_or(default_port).to_string(),
    );
    if args.keys_as_log || keys_as_log {
        raw.insert(KEYS_AS_LOG_PARAM.to_string(), "1".to_string());
    }

    for pair in &args.params {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("expected NAME=VALUE, got '{}'", pair))?;
        raw.insert(name.trim().to_string(), value.to_string());
    }

    Ok(ScanParams::parse(&raw)?)
}

fn options_from_args(args: &ScanArgs, base: ScanOptions) -> ScanOptions {
    let mut options = base;

    if let Some(secs) = args.timeout {
        options = options.with_timeout(Duration::from_secs(secs.max(1)));
    }
    if args.connect_timeout.is_some() {
        options = options.with_connect_timeout(args.connect_timeout);
    }
    if !args.key_types.is_empty() {
        options = options.with_key_types(args.key_types.iter().cloned());
    }
    if args.ipv4 {
        options = options.with_address_family(AddressFamily::V4);
    } else if args.ipv6 {
        options = options.with_address_family(AddressFamily::V6);
    }
    if !args.extra_flags.is_empty() {
        let mut flags = options.extra_flags.clone();
        flags.extend(args.extra_flags.iter().cloned());
        options = options.with_extra_flags(flags);
    }
    options
}

fn print_table(outcomes: &[JobOutcome]) {
    println!();
    println!(
        "{:<28} {:<6} {:<10} {:<5} DETAIL",
        "HOST", "PORT", "STATUS", "KEYS"
    );
    println!("{}", "-".repeat(80));

    for outcome in outcomes {
        let host = truncate(outcome.target.host(), 28);
        match (outcome.result(), outcome.failure()) {
            (Some(result), _) => println!(
                "{:<28} {:<6} {:<10} {:<5} {}",
                host,
                outcome.target.port(),
                outcome.status.as_str(),
                result.keys.len(),
                result.key_types().join(",")
            ),
            (None, Some(failure)) => println!(
                "{:<28} {:<6} {:<10} {:<5} {}: {}",
                host,
                outcome.target.port(),
                outcome.status.as_str(),
                "-",
                failure.kind,
                failure.message
            ),
            (None, None) => {}
        }
    }

    println!("\nTotal: {} hosts", outcomes.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 1).collect();
        format!("{}…", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ScanArgs,
    }

    fn parse(argv: &[&str]) -> ScanArgs {
        TestCli::try_parse_from(std::iter::once("scan").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn test_flags_map_to_options() {
        let args = parse(&[
            "-6",
            "-t",
            "ed25519,rsa",
            "--connect-timeout",
            "4",
            "--timeout",
            "9",
            "--extra-flag",
            "-H",
            "host.example",
        ]);
        let base = ScanOptions::default().with_extra_flags(["-c"]);
        let options = options_from_args(&args, base);

        assert_eq!(options.address_family, AddressFamily::V6);
        assert_eq!(options.key_types, vec!["ed25519", "rsa"]);
        assert_eq!(options.connect_timeout, Some(4));
        assert_eq!(options.timeout, Duration::from_secs(9));
        assert_eq!(options.extra_flags, vec!["-c", "-H"]);
    }

    #[test]
    fn test_ipv4_and_ipv6_conflict() {
        assert!(TestCli::try_parse_from(["scan", "-4", "-6", "host.example"]).is_err());
    }

    #[test]
    fn test_param_overrides_port_flag() {
        let args = parse(&["--port", "2200", "--param", "sshport=2222", "host.example"]);
        let params = scan_params(&args, 22, false).unwrap();
        assert_eq!(params.port, 2222);
        assert!(!params.keys_as_log);
    }

    #[test]
    fn test_configured_keys_as_log_is_kept() {
        let args = parse(&["host.example"]);
        let params = scan_params(&args, 22, true).unwrap();
        assert!(params.keys_as_log);
        assert_eq!(params.port, 22);
    }

    #[test]
    fn test_bad_params_rejected() {
        let args = parse(&["--param", "sshport", "host.example"]);
        assert!(scan_params(&args, 22, false).is_err());

        let args = parse(&["--param", "sshport=0", "host.example"]);
        assert!(scan_params(&args, 22, false).is_err());
    }
}
