//! Peakview Core - waveform peak-data engine
//!
//! Holds min/max-per-block peak data for an audio signal and everything a
//! waveform view needs on top of it:
//!
//! - [`format`]: binary (`.dat`) and object (`.json`) layouts behind one
//!   read interface
//! - [`waveform`]: the [`Waveform`] core with its viewing window and
//!   full/partial resampling
//! - [`markers`]: segments and points whose visible extent follows the window
//! - [`zoom`]: per-level resample cache and precomputed zoom animations
//! - [`builder`]: the decode bridge from PCM to peaks
//! - [`config`]: YAML settings

pub mod builder;
pub mod config;
pub mod error;
pub mod format;
pub mod markers;
pub mod waveform;
pub mod zoom;

pub use error::{PeaksError, PeaksResult};
pub use format::{Adapter, Payload, WaveformAdapter};
pub use markers::{MarkerId, Point, PointView, Segment, SegmentView};
pub use waveform::{Resample, ResampleOptions, ResampleTarget, Waveform, Window};
pub use zoom::{ZoomController, ZoomFrame, ZoomTransition};
