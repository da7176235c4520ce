//! The scan adapter: one target in, one result or failure out.

use tracing::{debug, warn};

use crate::adapters::keyscan::{keyscan_args, parse_keyscan_output};
use crate::domain::{FailureKind, ScanFailure, ScanResult, ScanTarget};
use crate::ports::{KeyscanTool, ToolError};

/// Turns a [`ScanTarget`] into a [`ScanResult`] by running the keyscan tool.
///
/// Holds no per-scan state, so a single adapter can serve concurrent calls.
/// Every call spawns its own process through the tool port. Nothing is
/// retried; retry policy belongs to the caller.
pub struct ScanAdapter<T: KeyscanTool> {
    tool: T,
}

impl<T: KeyscanTool> ScanAdapter<T> {
    /// Create a new adapter with the given tool.
    pub fn new(tool: T) -> Self {
        Self { tool }
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Scan one target.
    ///
    /// A host that is unreachable or offers no keys still returns `Ok` with
    /// an empty key list. Keys and failures are never mixed: a single
    /// malformed line fails the whole target.
    pub async fn run_scan(&self, target: &ScanTarget) -> Result<ScanResult, ScanFailure> {
        if let Err(reason) = target.validate() {
            return Err(ScanFailure::new(
                FailureKind::InvalidTarget,
                target.host(),
                reason,
            ));
        }

        let args = keyscan_args(target);
        debug!(host = target.host(), port = target.port(), "dispatching keyscan");

        let output = self
            .tool
            .run(&args, target.options().timeout)
            .await
            .map_err(|e| tool_failure(target, e))?;

        if !output.success() {
            let message = match output.exit_code {
                Some(code) => format!("ssh-keyscan exited with status {}", code),
                None => "ssh-keyscan was terminated by a signal".to_string(),
            };
            warn!(host = target.host(), exit_code = ?output.exit_code, "keyscan failed");
            return Err(ScanFailure::new(FailureKind::Tool, target.host(), message)
                .with_exit_code(output.exit_code)
                .with_stderr(output.stderr));
        }

        let parsed = parse_keyscan_output(&output.stdout);
        if !parsed.rejected.is_empty() {
            warn!(
                host = target.host(),
                rejected = parsed.rejected.len(),
                "unparseable keyscan output"
            );
            return Err(ScanFailure::new(
                FailureKind::Parse,
                target.host(),
                "The following lines caused parse errors:",
            )
            .with_rejected_lines(parsed.rejected)
            .with_stderr(output.stderr));
        }

        Ok(ScanResult {
            target: target.host().to_string(),
            port: target.port(),
            keys: parsed.keys,
            duration_ms: u64::try_from(output.elapsed.as_millis()).unwrap_or(u64::MAX),
        })
    }
}

fn tool_failure(target: &ScanTarget, error: ToolError) -> ScanFailure {
    match error {
        ToolError::Spawn { program, source } => ScanFailure::new(
            FailureKind::Spawn,
            target.host(),
            format!("A problem occurred trying to execute '{}': {}", program, source),
        ),
        ToolError::Timeout { after, stderr } => ScanFailure::new(
            FailureKind::Timeout,
            target.host(),
            format!("ssh-keyscan did not finish within {:?} and was killed", after),
        )
        .with_stderr(stderr),
        ToolError::Io(e) => ScanFailure::new(
            FailureKind::Tool,
            target.host(),
            format!("Lost contact with ssh-keyscan: {}", e),
        ),
    }
}
