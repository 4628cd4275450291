//! Peak-of-peaks resampling
//!
//! Destination block `x` at scale `S` covers source samples
//! `[x * S, (x + 1) * S)`, i.e. source blocks
//! `[floor(x * S / s), floor((x + 1) * S / s))` at source scale `s`. Each
//! destination pair is the min of the covered minima and the max of the
//! covered maxima. Because `S >= s`, every destination block covers at least
//! one source block.
//!
//! A partial resample produces at most `width` destination blocks starting at
//! `output_index`; chaining partial calls reproduces the full resample block
//! for block.

use crate::error::{PeaksError, PeaksResult};
use crate::format::{Adapter, ObjectAdapter, WaveformAdapter, PEAK_MAX, PEAK_MIN};

use super::Waveform;

/// Target resolution of a full resample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleTarget {
    /// Explicit samples per block
    Scale(u32),
    /// Number of blocks to fit the whole waveform into
    Width(usize),
}

/// A resample request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resample {
    /// Resample the whole waveform
    Full(ResampleTarget),
    /// Produce up to `width` blocks at `scale`, starting from destination
    /// block `output_index` with the source cursor at `input_index`
    Partial {
        scale: u32,
        width: usize,
        input_index: usize,
        output_index: usize,
    },
}

impl Resample {
    /// Full resample to an explicit scale
    pub fn scale(scale: u32) -> Self {
        Resample::Full(ResampleTarget::Scale(scale))
    }

    /// Full resample to fit `width` blocks
    pub fn width(width: usize) -> Self {
        Resample::Full(ResampleTarget::Width(width))
    }

}

/// Loosely-shaped resample options, validated into a [`Resample`]
///
/// Either `scale` or `width` selects a full resample. Supplying
/// `input_index` or `output_index` selects a partial resample, which then
/// needs all four fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResampleOptions {
    pub scale: Option<u32>,
    pub width: Option<usize>,
    pub input_index: Option<usize>,
    pub output_index: Option<usize>,
}

impl TryFrom<ResampleOptions> for Resample {
    type Error = PeaksError;

    fn try_from(options: ResampleOptions) -> PeaksResult<Self> {
        if options.scale == Some(0) {
            return Err(PeaksError::InvalidResample(
                "`scale` must be a positive integer".to_string(),
            ));
        }
        if options.width == Some(0) {
            return Err(PeaksError::InvalidResample(
                "`width` must be a positive integer".to_string(),
            ));
        }

        if options.input_index.is_some() || options.output_index.is_some() {
            return match options {
                ResampleOptions {
                    scale: Some(scale),
                    width: Some(width),
                    input_index: Some(input_index),
                    output_index: Some(output_index),
                } => Ok(Resample::Partial {
                    scale,
                    width,
                    input_index,
                    output_index,
                }),
                _ => Err(PeaksError::InvalidResample(
                    "`scale`, `width`, `input_index` and `output_index` must be provided together for partial resampling"
                        .to_string(),
                )),
            };
        }

        match (options.scale, options.width) {
            (Some(scale), None) => Ok(Resample::scale(scale)),
            (None, Some(width)) => Ok(Resample::width(width)),
            (Some(_), Some(_)) => Err(PeaksError::InvalidResample(
                "provide either `scale` or `width`, not both".to_string(),
            )),
            (None, None) => Err(PeaksError::InvalidResample(
                "you should provide either a `scale` or a `width` option".to_string(),
            )),
        }
    }
}

impl Waveform {
    /// Partial resample request aligned on destination block `output_index`
    ///
    /// The source cursor is placed on the first block of this waveform
    /// covered by `output_index` at `scale`.
    pub fn partial(&self, scale: u32, output_index: usize, width: usize) -> Resample {
        Resample::Partial {
            scale,
            width,
            input_index: first_source_block(output_index, scale, self.scale()),
            output_index,
        }
    }

    /// Re-decimate the full peak data into a new waveform
    ///
    /// The result wraps a fresh object adapter at the target scale, has a full
    /// window and empty marker registries. `self` is left untouched.
    pub fn resample(&self, request: Resample) -> PeaksResult<Waveform> {
        let start_time = std::time::Instant::now();
        let source_scale = self.scale();
        if source_scale == 0 {
            return Err(PeaksError::InvalidHeader("source scale 0".to_string()));
        }

        let (target_scale, limit) = match request {
            Resample::Full(ResampleTarget::Scale(scale)) => (scale, None),
            Resample::Full(ResampleTarget::Width(width)) => {
                if width == 0 {
                    return Err(PeaksError::InvalidResample(
                        "`width` must be a positive integer".to_string(),
                    ));
                }
                let scale = (self.length() as u64 * source_scale as u64) / width as u64;
                (u32::try_from(scale).unwrap_or(u32::MAX), None)
            }
            Resample::Partial {
                scale,
                width,
                input_index,
                output_index,
            } => {
                if width == 0 {
                    return Err(PeaksError::InvalidResample(
                        "`width` must be a positive integer".to_string(),
                    ));
                }
                (scale, Some((width, input_index, output_index)))
            }
        };

        if target_scale < source_scale {
            return Err(PeaksError::ZoomLevelTooLow {
                requested: target_scale,
                minimum: source_scale,
            });
        }

        if let Some((_, input_index, output_index)) = limit {
            let first = first_source_block(output_index, target_scale, source_scale);
            if input_index > first {
                return Err(PeaksError::InvalidResample(format!(
                    "input_index {} is past the first source block {} of output block {}",
                    input_index, first, output_index
                )));
            }
        }

        let peaks = resample_peaks(self.adapter().peaks(), source_scale, target_scale, limit);

        log::debug!(
            "Resampled {} -> {} blocks (scale {} -> {}) in {:?}",
            self.length(),
            peaks.len() / 2,
            source_scale,
            target_scale,
            start_time.elapsed()
        );

        Ok(Waveform::new(Adapter::Object(ObjectAdapter::new(
            self.adapter().version(),
            self.sample_rate(),
            target_scale,
            peaks,
        ))))
    }

    /// Resample from loosely-shaped options
    pub fn resample_with(&self, options: ResampleOptions) -> PeaksResult<Waveform> {
        self.resample(Resample::try_from(options)?)
    }
}

/// First source block covered by destination block `output_index`
fn first_source_block(output_index: usize, target_scale: u32, source_scale: u32) -> usize {
    (output_index as u64 * target_scale as u64)
        .checked_div(source_scale as u64)
        .unwrap_or(0) as usize
}

/// Decimate interleaved min/max `peaks` from `source_scale` to `target_scale`
///
/// `limit` is `(width, input_index, output_index)` for a partial resample.
fn resample_peaks(
    peaks: &[i8],
    source_scale: u32,
    target_scale: u32,
    limit: Option<(usize, usize, usize)>,
) -> Vec<i8> {
    let length = peaks.len() / 2;
    let (width, mut input_index, mut output_index) = match limit {
        Some((width, input_index, output_index)) => (Some(width), input_index, output_index),
        None => (None, 0, 0),
    };

    let mut output: Vec<i8> = Vec::new();
    if input_index >= length {
        return output;
    }

    // Source sample at the left edge of destination block x
    let pixel_sample = |x: usize| x as u64 * target_scale as u64;
    let source_block = |x: usize| (pixel_sample(x) / source_scale as u64) as usize;

    let mut min = peaks[input_index * 2];
    let mut max = peaks[input_index * 2 + 1];
    let mut last_input_index: Option<usize> = None;
    let is_full = |output: &Vec<i8>| width.is_some_and(|w| output.len() / 2 >= w);

    while input_index < length {
        while source_block(output_index) <= input_index {
            if last_input_index.is_some() {
                output.push(min);
                output.push(max);
            }

            last_input_index = Some(input_index);
            output_index += 1;

            if pixel_sample(output_index) != pixel_sample(output_index - 1) {
                min = PEAK_MAX;
                max = PEAK_MIN;
            }
        }

        let stop = source_block(output_index).min(length);

        while input_index < stop {
            min = min.min(peaks[input_index * 2]);
            max = max.max(peaks[input_index * 2 + 1]);
            input_index += 1;
        }

        if is_full(&output) {
            break;
        }
    }

    // Flush the trailing block if any source block fed it
    if !is_full(&output) && last_input_index.is_some_and(|last| last != input_index) {
        output.push(min);
        output.push(max);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::tests::fixture_waveform;

    fn waveform_from(scale: u32, data: Vec<i8>) -> Waveform {
        Waveform::new(Adapter::Object(ObjectAdapter::new(1, 44100, scale, data)))
    }

    /// Reference decimation straight from the block-coverage formula
    fn direct_decimation(source: &Waveform, target_scale: u32) -> Vec<(i8, i8)> {
        let s = source.scale() as usize;
        let big_s = target_scale as usize;
        let n = source.length();
        let mut out = Vec::new();
        let mut x = 0;
        while x * big_s / s < n {
            let first = x * big_s / s;
            let last = ((x + 1) * big_s / s).min(n);
            let min = (first..last).map(|i| source.min_sample(i)).min().unwrap();
            let max = (first..last).map(|i| source.max_sample(i)).max().unwrap();
            out.push((min, max));
            x += 1;
        }
        out
    }

    fn pairs(waveform: &Waveform) -> Vec<(i8, i8)> {
        (0..waveform.length())
            .map(|i| (waveform.min_sample(i), waveform.max_sample(i)))
            .collect()
    }

    #[test]
    fn test_same_scale_is_identity() {
        let source = fixture_waveform();
        let resampled = source.resample(Resample::scale(512)).unwrap();
        assert_eq!(resampled.length(), 150);
        assert_eq!(resampled.min(), source.min());
        assert_eq!(resampled.max(), source.max());
    }

    #[test]
    fn test_double_scale() {
        let source = fixture_waveform();
        let resampled = source.resample(Resample::scale(1024)).unwrap();

        assert_eq!(resampled.length(), 75);
        assert_eq!(resampled.scale(), 1024);
        assert_eq!(resampled.sample_rate(), 44100);

        for x in 0..75 {
            for i in [2 * x, 2 * x + 1] {
                assert!(resampled.min_sample(x) <= source.min_sample(i));
                assert!(resampled.max_sample(x) >= source.max_sample(i));
            }
        }
        assert!((resampled.duration() - source.duration()).abs() < 1e-9);
    }

    #[test]
    fn test_matches_direct_decimation() {
        let source = fixture_waveform();
        for scale in [512, 600, 777, 1024, 1500, 4096, 512 * 150, 512 * 200] {
            let resampled = source.resample(Resample::scale(scale)).unwrap();
            assert_eq!(pairs(&resampled), direct_decimation(&source, scale), "scale {}", scale);
        }
    }

    #[test]
    fn test_hand_computed_example() {
        let source = waveform_from(100, vec![-1, 1, -5, 2, -2, 9, -3, 3, -4, 4]);
        let resampled = source.resample(Resample::scale(200)).unwrap();
        assert_eq!(pairs(&resampled), vec![(-5, 2), (-3, 9), (-4, 4)]);

        let resampled = source.resample(Resample::scale(250)).unwrap();
        // Blocks [0, 2), [2, 5)
        assert_eq!(pairs(&resampled), vec![(-5, 2), (-4, 9)]);
    }

    #[test]
    fn test_monotonic_length() {
        let source = fixture_waveform();
        let mut previous = usize::MAX;
        for scale in (512..8192).step_by(97) {
            let length = source.resample(Resample::scale(scale)).unwrap().length();
            assert!(length <= previous);
            previous = length;
        }
    }

    #[test]
    fn test_values_stay_in_range() {
        let data = (0..200).map(|i| if i % 2 == 0 { -128 } else { 127 }).collect();
        let source = waveform_from(256, data);
        let resampled = source.resample(Resample::scale(1000)).unwrap();
        assert!(resampled.min().iter().all(|&v| v == -128));
        assert!(resampled.max().iter().all(|&v| v == 127));
    }

    #[test]
    fn test_width_target() {
        let source = fixture_waveform();
        // floor(150 * 512 / 50) = 1536 = 3 source blocks per output block
        let resampled = source.resample(Resample::width(50)).unwrap();
        assert_eq!(resampled.scale(), 1536);
        assert_eq!(resampled.length(), 50);

        let err = source.resample(Resample::width(300)).unwrap_err();
        assert!(matches!(err, PeaksError::ZoomLevelTooLow { requested: 256, minimum: 512 }));
    }

    #[test]
    fn test_zoom_level_too_low() {
        let source = fixture_waveform();
        let err = source.resample(Resample::scale(256)).unwrap_err();
        assert_eq!(err.to_string(), "Zoom level 256 too low, minimum: 512");
    }

    #[test]
    fn test_partial_chain_equals_full() {
        let source = fixture_waveform();
        for scale in [512, 700, 1024, 1536, 3000] {
            let full = pairs(&source.resample(Resample::scale(scale)).unwrap());

            for width in [1, 7, 16, 40] {
                let mut chained = Vec::new();
                let mut output_index = 0;
                loop {
                    let part = source
                        .resample(source.partial(scale, output_index, width))
                        .unwrap();
                    if part.length() == 0 {
                        break;
                    }
                    assert!(part.length() <= width);
                    chained.extend(pairs(&part));
                    output_index += part.length();
                }
                assert_eq!(chained, full, "scale {} width {}", scale, width);
            }
        }
    }

    #[test]
    fn test_partial_is_slice_of_full() {
        let source = fixture_waveform();
        let full = pairs(&source.resample(Resample::scale(900)).unwrap());
        let part = source
            .resample(source.partial(900, 10, 20))
            .unwrap();
        assert_eq!(pairs(&part), full[10..30].to_vec());
    }

    #[test]
    fn test_partial_with_early_input_index() {
        let source = fixture_waveform();
        let aligned = source.resample(source.partial(1024, 10, 5)).unwrap();
        let early = source
            .resample(Resample::Partial {
                scale: 1024,
                width: 5,
                input_index: 3,
                output_index: 10,
            })
            .unwrap();
        assert_eq!(pairs(&early), pairs(&aligned));
    }

    #[test]
    fn test_zero_source_scale_is_rejected() {
        let source = waveform_from(0, vec![-1, 1, -2, 2]);
        for request in [Resample::scale(0), Resample::scale(512), source.partial(512, 0, 4)] {
            let err = source.resample(request).unwrap_err();
            assert!(matches!(err, PeaksError::InvalidHeader(_)));
        }
    }

    #[test]
    fn test_partial_rejects_late_input_index() {
        let source = fixture_waveform();
        let err = source
            .resample(Resample::Partial {
                scale: 1024,
                width: 5,
                input_index: 21,
                output_index: 10,
            })
            .unwrap_err();
        assert!(matches!(err, PeaksError::InvalidResample(_)));
    }

    #[test]
    fn test_resample_leaves_source_untouched() {
        let mut source = fixture_waveform();
        source.set_offset(20, 50).unwrap();
        source.set_segment(10, 40, Some("intro")).unwrap();

        let resampled = source.resample(Resample::scale(2048)).unwrap();
        assert_eq!(resampled.offset_start(), 0);
        assert_eq!(resampled.offset_end(), resampled.length());
        assert_eq!(resampled.segments().count(), 0);

        assert_eq!(source.offset_start(), 20);
        assert_eq!(source.segments().count(), 1);
        assert_eq!(source.scale(), 512);
    }

    #[test]
    fn test_empty_source() {
        let source = waveform_from(512, vec![]);
        assert_eq!(source.resample(Resample::scale(1024)).unwrap().length(), 0);
    }

    #[test]
    fn test_options_validation() {
        let ok = Resample::try_from(ResampleOptions {
            scale: Some(1024),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(ok, Resample::scale(1024));

        let ok = Resample::try_from(ResampleOptions {
            width: Some(800),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(ok, Resample::width(800));

        let partial = Resample::try_from(ResampleOptions {
            scale: Some(1024),
            width: Some(100),
            input_index: Some(0),
            output_index: Some(0),
        })
        .unwrap();
        assert!(matches!(partial, Resample::Partial { width: 100, .. }));

        let invalid = [
            ResampleOptions::default(),
            ResampleOptions {
                scale: Some(1024),
                width: Some(100),
                ..Default::default()
            },
            ResampleOptions {
                scale: Some(1024),
                width: Some(100),
                input_index: Some(4),
                output_index: None,
            },
            ResampleOptions {
                scale: None,
                width: None,
                input_index: None,
                output_index: Some(4),
            },
            ResampleOptions {
                scale: Some(0),
                ..Default::default()
            },
        ];
        for options in invalid {
            assert!(matches!(
                Resample::try_from(options),
                Err(PeaksError::InvalidResample(_))
            ));
        }
    }

    #[test]
    fn test_resample_with_options() {
        let source = fixture_waveform();
        let resampled = source
            .resample_with(ResampleOptions {
                scale: Some(2048),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(resampled.scale(), 2048);
        assert!(source.resample_with(ResampleOptions::default()).is_err());
    }
}
