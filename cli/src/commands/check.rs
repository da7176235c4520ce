//! Check command - verify that ssh-keyscan is usable.

use std::path::PathBuf;

use anyhow::Result;
use keyscan_core::adapters::discovery;
use keyscan_core::ToolLocator;
use serde_json::json;
use tracing::debug;

pub async fn run(tool: Option<PathBuf>, json: bool) -> Result<()> {
    let config = super::load_config().await?;
    let program = ToolLocator::with_path(tool.or(config.tool_path)).locate()?;

    debug!(tool = %program.display(), "checking ssh-keyscan");
    discovery::check(&program).await?;

    if json {
        let status = json!({ "tool": program, "available": true });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("ssh-keyscan found at {}", program.display());
    }
    Ok(())
}
