//! Config command - show and change stored defaults.

use anyhow::Result;
use keyscan_core::ConfigStore;

pub async fn show(json: bool) -> Result<()> {
    let store = ConfigStore::new()?;
    let config = store.load().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Config file: {}", store.path().display());
    println!();
    println!(
        "toolPath:           {}",
        config
            .tool_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(search PATH)".to_string())
    );
    println!("defaultPort:        {}", config.default_port);
    println!("timeoutSecs:        {}", config.timeout_secs);
    println!(
        "connectTimeoutSecs: {}",
        config
            .connect_timeout_secs
            .map(|s| s.to_string())
            .unwrap_or_else(|| "(tool default)".to_string())
    );
    println!("maxConcurrency:     {}", config.max_concurrency);
    println!("keysAsLog:          {}", config.keys_as_log);
    if config.extra_flags.is_empty() {
        println!("extraFlags:         (none)");
    } else {
        println!("extraFlags:         {}", config.extra_flags.join(" "));
    }

    Ok(())
}

pub async fn set(key: &str, value: &str) -> Result<()> {
    let store = ConfigStore::new()?;
    let mut config = store.load().await?;
    config.set(key, value)?;
    store.save(&config).await?;
    println!("Set {} = {}", key, value);
    Ok(())
}

pub async fn reset() -> Result<()> {
    let store = ConfigStore::new()?;
    store.reset().await?;
    println!("Configuration reset to defaults");
    Ok(())
}
