//! Zoom levels and animated transitions
//!
//! [`ZoomController`] keeps the root waveform at its native resolution and
//! lazily resamples it once per configured level. Changing level produces a
//! [`ZoomTransition`]: the target waveform windowed around an anchor time,
//! plus (in [`ZoomMode::Animated`]) a precomputed sequence of intermediate
//! frames. Each frame is a partial resample of `view_width` blocks at an
//! interpolated scale. Nothing here is timed; the caller steps through the
//! frames at its own rate.

use std::time::Instant;

use crate::config::{ZoomConfig, ZoomMode};
use crate::error::{PeaksError, PeaksResult};
use crate::waveform::{Resample, Waveform};

/// One precomputed animation step
#[derive(Debug, Clone)]
pub struct ZoomFrame {
    /// Scale of this frame in samples per block
    pub scale: u32,
    /// Index of the first block of `waveform` in the full resample at `scale`
    pub output_index: usize,
    /// At most `view_width` blocks around the anchor
    pub waveform: Waveform,
}

/// Result of a level change
#[derive(Debug, Clone)]
pub struct ZoomTransition {
    pub from_scale: u32,
    pub to_scale: u32,
    /// Intermediate frames, ending at `to_scale`; empty in static mode
    pub frames: Vec<ZoomFrame>,
    /// Full waveform at `to_scale`, windowed around the anchor
    pub target: Waveform,
}

/// Zoom state over a root waveform
#[derive(Debug)]
pub struct ZoomController {
    root: Waveform,
    config: ZoomConfig,
    current: usize,
    cache: Vec<Option<Waveform>>,
}

impl ZoomController {
    /// Start at the finest level
    ///
    /// Fails if the configuration is invalid or any level is finer than the
    /// root waveform's scale.
    pub fn new(root: Waveform, config: &ZoomConfig) -> PeaksResult<Self> {
        config.validate()?;
        if config.levels[0] < root.scale() {
            return Err(PeaksError::ZoomLevelTooLow {
                requested: config.levels[0],
                minimum: root.scale(),
            });
        }

        Ok(Self {
            cache: vec![None; config.levels.len()],
            root,
            config: config.clone(),
            current: 0,
        })
    }

    pub fn root(&self) -> &Waveform {
        &self.root
    }

    pub fn levels(&self) -> &[u32] {
        &self.config.levels
    }

    /// Index of the active level
    pub fn current_level(&self) -> usize {
        self.current
    }

    pub fn current_scale(&self) -> u32 {
        self.config.levels[self.current]
    }

    pub fn is_cached(&self, index: usize) -> bool {
        self.cache.get(index).is_some_and(Option::is_some)
    }

    /// Full waveform at level `index`, resampled on first use
    pub fn level(&mut self, index: usize) -> PeaksResult<&Waveform> {
        let scale = self.level_scale(index)?;
        let waveform = match self.cache[index].take() {
            Some(waveform) => waveform,
            None => {
                log::debug!("Caching zoom level {} (scale {})", index, scale);
                self.root.resample(Resample::scale(scale))?
            }
        };
        Ok(self.cache[index].insert(waveform))
    }

    /// Move one level finer; `None` if already at the finest level
    pub fn zoom_in(&mut self, anchor_time: f64) -> PeaksResult<Option<ZoomTransition>> {
        if self.current == 0 {
            return Ok(None);
        }
        self.set_zoom(self.current - 1, anchor_time)
    }

    /// Move one level coarser; `None` if already at the coarsest level
    pub fn zoom_out(&mut self, anchor_time: f64) -> PeaksResult<Option<ZoomTransition>> {
        if self.current + 1 >= self.config.levels.len() {
            return Ok(None);
        }
        self.set_zoom(self.current + 1, anchor_time)
    }

    /// Switch to level `index`, keeping `anchor_time` (seconds) in view
    ///
    /// Returns `None` when `index` is already active. On error the active
    /// level is unchanged.
    pub fn set_zoom(&mut self, index: usize, anchor_time: f64) -> PeaksResult<Option<ZoomTransition>> {
        let to_scale = self.level_scale(index)?;
        if index == self.current {
            return Ok(None);
        }
        let from_scale = self.current_scale();
        let view_width = self.config.view_width;

        let frames = match self.config.mode {
            ZoomMode::Animated => animation_frames(
                &self.root,
                from_scale,
                to_scale,
                self.config.animation_frames,
                view_width,
                anchor_time,
            )?,
            ZoomMode::Static => Vec::new(),
        };

        let mut target = self.level(index)?.clone();
        if target.length() > 0 {
            let start = anchored_start(target.at_time(anchor_time), view_width, target.length());
            target.set_offset(start, start + view_width)?;
        }

        log::info!(
            "Zoom {} -> {} (level {} -> {}, {} frames)",
            from_scale,
            to_scale,
            self.current,
            index,
            frames.len()
        );
        self.current = index;

        Ok(Some(ZoomTransition {
            from_scale,
            to_scale,
            frames,
            target,
        }))
    }

    fn level_scale(&self, index: usize) -> PeaksResult<u32> {
        self.config.levels.get(index).copied().ok_or_else(|| {
            PeaksError::InvalidConfig(format!(
                "zoom level {} out of range (0..{})",
                index,
                self.config.levels.len()
            ))
        })
    }
}

/// Precompute `frame_count` frames moving from `from_scale` to `to_scale`
///
/// Frame `i` uses scale `round(from + (i + 1) * (to - from) / frame_count)`,
/// so the last frame lands exactly on `to_scale`. Each frame covers up to
/// `view_width` blocks centred on `anchor_time`, shifted to stay within the
/// waveform.
pub fn animation_frames(
    root: &Waveform,
    from_scale: u32,
    to_scale: u32,
    frame_count: usize,
    view_width: usize,
    anchor_time: f64,
) -> PeaksResult<Vec<ZoomFrame>> {
    if frame_count == 0 || view_width == 0 {
        return Err(PeaksError::InvalidConfig(
            "animation needs at least one frame of nonzero width".to_string(),
        ));
    }

    let start_time = Instant::now();
    let source_scale = root.scale();
    let step = (f64::from(to_scale) - f64::from(from_scale)) / frame_count as f64;

    let mut frames = Vec::with_capacity(frame_count);
    for i in 0..frame_count {
        let scale = (f64::from(from_scale) + (i + 1) as f64 * step).round() as u32;
        let scale = scale.max(source_scale).max(1);

        let total = blocks_at_scale(root.length(), source_scale, scale);
        let anchor = (anchor_time.max(0.0) * f64::from(root.sample_rate()) / f64::from(scale)) as usize;
        let output_index = anchored_start(anchor, view_width, total);

        let waveform = root.resample(root.partial(scale, output_index, view_width))?;
        frames.push(ZoomFrame {
            scale,
            output_index,
            waveform,
        });
    }

    log::debug!(
        "Built {} zoom frames ({} -> {}) in {:?}",
        frames.len(),
        from_scale,
        to_scale,
        start_time.elapsed()
    );
    Ok(frames)
}

/// Number of blocks in a full resample of `length` blocks to `target_scale`
fn blocks_at_scale(length: usize, source_scale: u32, target_scale: u32) -> usize {
    let samples = length as u64 * u64::from(source_scale);
    samples.div_ceil(u64::from(target_scale)) as usize
}

/// First block of a `width`-wide view centred on `anchor`, clamped to
/// `[0, total - width]`
fn anchored_start(anchor: usize, width: usize, total: usize) -> usize {
    anchor
        .saturating_sub(width / 2)
        .min(total.saturating_sub(width))
}
