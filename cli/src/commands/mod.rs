//! CLI command implementations.

pub mod check;
pub mod config;
pub mod info;
pub mod scan;

use anyhow::Result;
use keyscan_core::{Config, ConfigStore};

/// Load the stored configuration, or defaults if there is none.
pub async fn load_config() -> Result<Config> {
    let store = ConfigStore::new()?;
    Ok(store.load().await?)
}
