//! Peak building and zoom settings

use serde::{Deserialize, Serialize};

use crate::builder::BuildOptions;
use crate::error::{PeaksError, PeaksResult};

/// How a change of zoom level is presented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomMode {
    /// Precompute intermediate frames between the two levels
    #[default]
    Animated,
    /// Switch straight to the target level
    Static,
}

/// Zoom levels and transition settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    /// Available scales in samples per block, finest first
    /// Default: [512, 1024, 2048, 4096]
    pub levels: Vec<u32>,

    /// Transition style between levels
    pub mode: ZoomMode,

    /// Number of intermediate frames in an animated transition
    /// Default: 30
    pub animation_frames: usize,

    /// Width in blocks of each animation frame
    /// Default: 1000
    pub view_width: usize,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            levels: vec![512, 1024, 2048, 4096],
            mode: ZoomMode::Animated,
            animation_frames: 30,
            view_width: 1000,
        }
    }
}

impl ZoomConfig {
    /// Check that the level list is non-empty, nonzero and strictly increasing
    pub fn validate(&self) -> PeaksResult<()> {
        if self.levels.is_empty() {
            return Err(PeaksError::InvalidConfig("no zoom levels".to_string()));
        }
        if self.levels.contains(&0) {
            return Err(PeaksError::InvalidConfig("zoom level 0".to_string()));
        }
        if self.levels.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(PeaksError::InvalidConfig(format!(
                "zoom levels {:?} are not strictly increasing",
                self.levels
            )));
        }
        if self.animation_frames == 0 {
            return Err(PeaksError::InvalidConfig("animation_frames 0".to_string()));
        }
        if self.view_width == 0 {
            return Err(PeaksError::InvalidConfig("view_width 0".to_string()));
        }
        Ok(())
    }
}

/// Top-level peakview configuration
///
/// ```yaml
/// build:
///   scale: 512
///   amplitude_scale: 1.0
///   scale_adjuster: 127.0
/// zoom:
///   levels: [512, 1024, 2048, 4096]
///   mode: animated
///   animation_frames: 30
///   view_width: 1000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeaksConfig {
    pub build: BuildOptions,
    pub zoom: ZoomConfig,
}

impl PeaksConfig {
    pub fn validate(&self) -> PeaksResult<()> {
        self.build.validate()?;
        self.zoom.validate()
    }
}
