//! Standard locations for peakview configuration files

use std::path::PathBuf;

/// Directory holding peakview configuration
///
/// Returns `<config dir>/peakview`, e.g. `~/.config/peakview` on Linux.
/// Falls back to the current directory when no config dir is known.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("peakview")
}

/// Default path of a config file, `<config dir>/peakview/{filename}`
pub fn default_config_path(filename: &str) -> PathBuf {
    default_config_dir().join(filename)
}
