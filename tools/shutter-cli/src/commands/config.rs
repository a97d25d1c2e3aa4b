//! Show or initialize the configuration.

use std::path::Path;

use shutter_common::config::AppConfig;

pub fn run(config: &AppConfig, path: &Path, init: bool) -> anyhow::Result<()> {
    if init {
        if path.exists() {
            anyhow::bail!("Config already exists at {}", path.display());
        }
        AppConfig::default()
            .save_to(path)
            .map_err(|e| anyhow::anyhow!("Failed to write config: {e}"))?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
