//! YAML configuration loading and saving

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Load configuration from a YAML file
///
/// If the file doesn't exist, returns the default config. If it exists but
/// cannot be read or parsed, logs a warning and returns the default config.
///
/// ```ignore
/// let config: PeaksConfig = load_config(Path::new("config.yaml"));
/// ```
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, using defaults");
        return T::default();
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            log::warn!("load_config: Failed to read {:?}: {}, using defaults", path, e);
            return T::default();
        }
    };

    match serde_yaml::from_str::<T>(&contents) {
        Ok(config) => {
            log::info!("load_config: Loaded config from {:?}", path);
            config
        }
        Err(e) => {
            log::warn!("load_config: Failed to parse {:?}: {}, using defaults", path, e);
            T::default()
        }
    }
}

/// Save configuration to a YAML file, creating parent directories as needed
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    log::info!("save_config: Saving to {:?}", path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PeaksConfig;

    #[test]
    fn test_load_nonexistent_returns_default() {
        let config: PeaksConfig = load_config(Path::new("/nonexistent/peakview/config.yaml"));
        assert_eq!(config, PeaksConfig::default());
    }

    #[test]
    fn test_load_invalid_yaml_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "build: [this is: not, a map").unwrap();

        let config: PeaksConfig = load_config(&path);
        assert_eq!(config, PeaksConfig::default());
    }

    #[test]
    fn test_roundtrip_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("peakview").join("config.yaml");

        let mut config = PeaksConfig::default();
        config.build.scale = 256;
        config.zoom.levels = vec![256, 512, 1024];
        config.zoom.view_width = 640;

        save_config(&config, &path).unwrap();
        let loaded: PeaksConfig = load_config(&path);
        assert_eq!(loaded, config);
    }
}
