//! Log setup for the CLI.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set. Otherwise `verbosity` picks the level:
/// 0 is warn, 1 is info, 2 is debug and anything above is trace.
/// Logs go to stderr so stdout stays clean for JSON output.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keyscan_core={level},ospd_keyscan={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity > 1)
        .with_writer(std::io::stderr)
        .init();
}
