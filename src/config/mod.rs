mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = ["./initseg.toml", "~/.config/initseg/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(filter) = &config.logging.filter {
        EnvFilter::try_new(filter)
            .with_context(|| format!("Invalid logging filter: {:?}", filter))?;
    }

    let mut seen = HashSet::new();
    for track in &config.tracks {
        let id = track.id();
        if id == 0 {
            anyhow::bail!("Track id must be non-zero");
        }
        if !seen.insert(id) {
            anyhow::bail!("Track id {} is declared more than once", id);
        }
    }

    // A dry-run encode checks parameter sets and audio configs
    let tracks = config.tracks()?;
    initseg_fmp4::encode_init(&tracks).context("Configured tracks cannot be encoded")?;

    Ok(())
}
