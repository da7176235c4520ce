//! Locating and checking the ssh-keyscan binary.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{Error, Result};

/// Binary name searched for on `PATH`.
const TOOL_NAME: &str = "ssh-keyscan";

/// Locations tried when `PATH` has no match.
const WELL_KNOWN_PATHS: &[&str] = &[
    "/usr/bin/ssh-keyscan",
    "/usr/local/bin/ssh-keyscan",
    "/opt/homebrew/bin/ssh-keyscan", // Apple Silicon
];

/// Timeout for the availability check.
const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves the path of the ssh-keyscan binary.
pub struct ToolLocator {
    configured: Option<PathBuf>,
}

impl ToolLocator {
    /// Search `PATH` and the well-known locations.
    pub fn new() -> Self {
        Self { configured: None }
    }

    /// Prefer an explicitly configured path.
    pub fn with_path(configured: Option<PathBuf>) -> Self {
        Self { configured }
    }

    /// Find the binary.
    ///
    /// A configured path must exist; there is no fallback when it doesn't.
    pub fn locate(&self) -> Result<PathBuf> {
        if let Some(path) = &self.configured {
            if is_executable(path) {
                return Ok(path.clone());
            }
            return Err(Error::ToolNotFound(format!(
                "configured path {} is not an executable file",
                path.display()
            )));
        }

        search_path(TOOL_NAME, std::env::var_os("PATH"))
            .or_else(|| find_executable(WELL_KNOWN_PATHS))
            .ok_or_else(|| {
                Error::ToolNotFound(format!("{} is not on PATH or in a known location", TOOL_NAME))
            })
    }
}

impl Default for ToolLocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that `program` can be executed.
///
/// ssh-keyscan exits non-zero when run without hosts; that still counts as
/// available. Only a failure to start it is an error.
pub async fn check(program: &Path) -> Result<()> {
    let result = timeout(
        CHECK_TIMEOUT,
        Command::new(program)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status(),
    )
    .await;

    match result {
        Ok(Ok(status)) => {
            debug!(program = %program.display(), ?status, "tool check completed");
            Ok(())
        }
        Ok(Err(e))
            if matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
            ) =>
        {
            Err(Error::ToolNotFound(format!("{}: {}", program.display(), e)))
        }
        Ok(Err(e)) => Err(Error::CommandFailed(format!(
            "Failed to run {}: {}",
            program.display(),
            e
        ))),
        Err(_) => Err(Error::CommandFailed(format!(
            "{} did not exit within {:?}",
            program.display(),
            CHECK_TIMEOUT
        ))),
    }
}

/// Look for `name` in each entry of a `PATH`-style variable.
fn search_path(name: &str, path_var: Option<OsString>) -> Option<PathBuf> {
    let path_var = path_var?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

/// Finds an executable in the given paths.
fn find_executable(paths: &[&str]) -> Option<PathBuf> {
    paths
        .iter()
        .map(PathBuf::from)
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_find_executable() {
        // Test with a path that should exist on most systems
        let result = find_executable(&["/nonexistent/path", "/bin/sh"]);
        assert_eq!(result, Some(PathBuf::from("/bin/sh")));

        // Test with a path that shouldn't exist
        let result = find_executable(&["/nonexistent/path"]);
        assert!(result.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_search_path_skips_non_executables() {
        use std::os::unix::fs::PermissionsExt;

        let plain = tempdir().unwrap();
        let exec = tempdir().unwrap();
        std::fs::write(plain.path().join("ssh-keyscan"), "").unwrap();
        let tool = exec.path().join("ssh-keyscan");
        std::fs::write(&tool, "").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let path_var = std::env::join_paths([plain.path(), exec.path()]).unwrap();
        assert_eq!(search_path("ssh-keyscan", Some(path_var)), Some(tool));
        assert_eq!(search_path("ssh-keyscan", None), None);
    }

    #[test]
    fn test_configured_path_must_exist() {
        let locator = ToolLocator::with_path(Some(PathBuf::from("/nonexistent/ssh-keyscan")));
        assert!(matches!(locator.locate(), Err(Error::ToolNotFound(_))));

        let locator = ToolLocator::with_path(Some(PathBuf::from("/bin/sh")));
        assert_eq!(locator.locate().unwrap(), PathBuf::from("/bin/sh"));
    }

    #[tokio::test]
    async fn test_check_accepts_nonzero_exit() {
        // `false` exits 1, like ssh-keyscan without arguments
        let program = find_executable(&["/bin/false", "/usr/bin/false"]).unwrap();
        assert!(check(&program).await.is_ok());
    }

    #[test]
    fn test_check_missing_tool() {
        let result = tokio_test::block_on(check(Path::new("/nonexistent/ssh-keyscan")));
        let err = tokio_test::assert_err!(result);
        assert!(matches!(err, Error::ToolNotFound(_)));
    }
}
