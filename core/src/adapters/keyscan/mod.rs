//! ssh-keyscan adapter.
//!
//! Runs the real binary as a child process. Each call owns exactly one child,
//! and that child is killed and reaped before the call returns, whether it
//! exits on its own, times out, or its I/O fails. If the future is dropped
//! mid-run, `kill_on_drop` takes care of the kill.

mod parser;

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::adapters::discovery::ToolLocator;
use crate::domain::ScanTarget;
use crate::error::Result;
use crate::ports::{KeyscanTool, ToolError, ToolOutput};

pub use parser::{parse_keyscan_output, ParsedOutput};

/// Grace period between SIGTERM and SIGKILL.
const KILL_GRACE_PERIOD: Duration = Duration::from_millis(300);

/// How long output is still read after the process has exited.
const PIPE_DRAIN_PERIOD: Duration = Duration::from_millis(200);

/// Build the ssh-keyscan argument list for a target.
///
/// Order: `-p`, `-T`, `-t`, address family, extra flags, host.
pub fn keyscan_args(target: &ScanTarget) -> Vec<String> {
    let options = target.options();
    let mut args = vec!["-p".to_string(), target.port().to_string()];

    if let Some(secs) = options.connect_timeout {
        args.push("-T".to_string());
        args.push(secs.to_string());
    }

    if !options.key_types.is_empty() {
        args.push("-t".to_string());
        args.push(options.key_types.join(","));
    }

    if let Some(flag) = options.address_family.flag() {
        args.push(flag.to_string());
    }

    args.extend(options.extra_flags.iter().cloned());
    args.push(target.host().to_string());
    args
}

/// Runs ssh-keyscan (or a wrapper around it) as a subprocess.
#[derive(Debug, Clone)]
pub struct SshKeyscan {
    program: PathBuf,
    /// Arguments placed before the generated ones, for launchers like `nice`.
    leading_args: Vec<String>,
}

impl SshKeyscan {
    /// Use the binary at `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Locate ssh-keyscan, preferring `configured` when given.
    pub fn locate(configured: Option<PathBuf>) -> Result<Self> {
        let program = ToolLocator::with_path(configured).locate()?;
        Ok(Self::new(program))
    }

    /// Put `args` in front of every generated argument list.
    pub fn with_leading_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl KeyscanTool for SshKeyscan {
    async fn run(
        &self,
        args: &[String],
        timeout: Duration,
    ) -> std::result::Result<ToolOutput, ToolError> {
        let started = Instant::now();

        let mut child = Command::new(&self.program)
            .args(&self.leading_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        debug!(
            pid = child.id(),
            program = %self.program.display(),
            ?args,
            "spawned ssh-keyscan"
        );

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let finished = tokio::time::timeout(timeout, async {
            let reads = async {
                tokio::try_join!(
                    read_all(stdout_pipe.as_mut(), &mut stdout),
                    read_all(stderr_pipe.as_mut(), &mut stderr),
                )
                .map(|_| ())
            };
            tokio::pin!(reads);

            let status: std::io::Result<_> = tokio::select! {
                read = &mut reads => {
                    read?;
                    child.wait().await
                }
                status = child.wait() => {
                    let status = status?;
                    // A grandchild can keep the pipes open after the tool exits
                    if tokio::time::timeout(PIPE_DRAIN_PERIOD, &mut reads).await.is_err() {
                        debug!("output pipes still open after exit, stopped reading");
                    }
                    Ok(status)
                }
            };
            status
        })
        .await;

        match finished {
            Ok(Ok(status)) => Ok(ToolOutput {
                exit_code: status.code(),
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
                elapsed: started.elapsed(),
            }),
            Ok(Err(e)) => {
                warn!(error = %e, "ssh-keyscan I/O failed, terminating");
                terminate(&mut child).await;
                Err(ToolError::Io(e))
            }
            Err(_) => {
                warn!(?timeout, pid = child.id(), "ssh-keyscan timed out, terminating");
                terminate(&mut child).await;
                Err(ToolError::Timeout {
                    after: timeout,
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                })
            }
        }
    }
}

async fn read_all<R>(reader: Option<&mut R>, buf: &mut Vec<u8>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    if let Some(reader) = reader {
        reader.read_to_end(buf).await?;
    }
    Ok(())
}

/// Stop a child and reap it.
///
/// Sends SIGTERM first and waits briefly before SIGKILL.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                && tokio::time::timeout(KILL_GRACE_PERIOD, child.wait())
                    .await
                    .is_ok()
            {
                return;
            }
        }
    }

    // kill() also waits, so the child is reaped either way
    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill ssh-keyscan");
    }
}
