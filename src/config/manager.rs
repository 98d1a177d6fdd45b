use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use super::engine::EngineConfig;

/// Load a TOML config file, or fall back to defaults when the file is absent.
pub fn load_or_default(path: &str) -> Result<EngineConfig> {
    if !Path::new(path).exists() {
        info!("Config file {} not found, using defaults", path);
        return Ok(EngineConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    let config: EngineConfig =
        toml::from_str(&raw).with_context(|| format!("Failed to parse config file {}", path))?;

    if let Err(errors) = config.validate() {
        anyhow::bail!("Invalid configuration: {}", errors.join(", "));
    }

    info!("Loaded configuration from {}", path);
    Ok(config)
}

/// Write a config out as TOML, creating parent directories as needed.
pub fn save(config: &EngineConfig, path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let raw = toml::to_string_pretty(config)?;
    std::fs::write(path, raw).with_context(|| format!("Failed to write config file {}", path))?;
    info!("Wrote configuration to {}", path);
    Ok(())
}
