//! Example: Collect and display the SSH host keys of one host.
//!
//! Usage:
//!   cargo run --example scan_host <host> [port]

use std::env;

use keyscan_core::{ScanAdapter, ScanOptions, ScanTarget, SshKeyscan};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Vec<String> = env::args().collect();
    let Some(host) = args.get(1) else {
        eprintln!("Usage: scan_host <host> [port]");
        return;
    };
    let port = args.get(2).and_then(|p| p.parse().ok()).unwrap_or(22);

    let tool = match SshKeyscan::locate(None) {
        Ok(tool) => tool,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    println!("Scanning {}:{} with {}...\n", host, port, tool.program().display());

    let adapter = ScanAdapter::new(tool);
    let target = ScanTarget::with_options(host.as_str(), port, ScanOptions::default());

    match adapter.run_scan(&target).await {
        Ok(result) => {
            if result.is_empty() {
                println!("No host keys found.");
                return;
            }

            println!("{:<24} {:<22} FINGERPRINT", "HOST", "TYPE");
            println!("{}", "-".repeat(100));

            for key in &result.keys {
                println!(
                    "{:<24} {:<22} {}",
                    key.host,
                    key.key_type,
                    key.fingerprint_display()
                );
            }

            println!("\nTotal: {} keys in {} ms", result.keys.len(), result.duration_ms);
        }
        Err(failure) => {
            eprintln!("Scan failed: {}", failure.diagnostic());
        }
    }
}
