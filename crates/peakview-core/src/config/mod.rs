//! Configuration for peak building and zooming
//!
//! Settings live in a YAML file (by default `<config dir>/peakview/config.yaml`)
//! and are loaded with [`load_config`], which falls back to defaults when the
//! file is missing or unreadable.
//!
//! ```ignore
//! use peakview_core::config::{default_config_path, load_config, PeaksConfig};
//!
//! let config: PeaksConfig = load_config(&default_config_path("config.yaml"));
//! config.validate()?;
//! ```

mod io;
mod paths;
mod peaks;

pub use io::{load_config, save_config};
pub use paths::{default_config_dir, default_config_path};
pub use peaks::{PeaksConfig, ZoomConfig, ZoomMode};
