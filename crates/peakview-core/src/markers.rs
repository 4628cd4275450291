//! Segments and points
//!
//! A [`Segment`] is a fixed `[start, end)` block range and a [`Point`] a single
//! block index, both in the block space of the [`Waveform`] that owns them.
//! Neither stores window coordinates: their visible extent is derived from the
//! window passed in (or, through [`SegmentView`] / [`PointView`], from the
//! owning waveform's current window) on every call.

use std::borrow::Borrow;
use std::fmt;

use crate::error::{PeaksError, PeaksResult};
use crate::waveform::{Waveform, Window};

/// Caller-assigned marker identifier
///
/// Registries fall back to [`MarkerId::DEFAULT`] when no identifier (or an
/// empty one) is given.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(String);

impl MarkerId {
    /// Identifier used when none is supplied
    pub const DEFAULT: &'static str = "default";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Resolve an optional identifier, defaulting to `"default"`
    pub fn resolve(id: Option<&str>) -> Self {
        match id {
            Some(id) if !id.is_empty() => Self::new(id),
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MarkerId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for MarkerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MarkerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Fixed block range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    start: usize,
    end: usize,
}

impl Segment {
    /// Create a segment; fails if `end == 0` or `end <= start`
    pub fn new(start: usize, end: usize) -> PeaksResult<Self> {
        if end == 0 || end <= start {
            return Err(PeaksError::InvalidSegment { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Visible start: the window's start if the segment straddles it,
    /// `None` if the segment lies outside the window
    pub fn offset_start(&self, window: Window) -> Option<usize> {
        window.intersect(self.start, self.end).map(|(start, _)| start)
    }

    /// Visible end: the window's end if the segment straddles it,
    /// `None` if the segment lies outside the window
    pub fn offset_end(&self, window: Window) -> Option<usize> {
        window.intersect(self.start, self.end).map(|(_, end)| end)
    }

    /// Number of visible blocks
    pub fn offset_length(&self, window: Window) -> usize {
        window
            .intersect(self.start, self.end)
            .map_or(0, |(start, end)| end - start)
    }

    /// Whether any part of the segment is in view
    pub fn visible(&self, window: Window) -> bool {
        window.intersect(self.start, self.end).is_some()
    }
}

/// Single block index bookmark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    time_stamp: usize,
}

impl Point {
    pub fn new(time_stamp: usize) -> Self {
        Self { time_stamp }
    }

    /// Block index of the point
    pub fn time_stamp(&self) -> usize {
        self.time_stamp
    }

    pub fn visible(&self, window: Window) -> bool {
        window.contains(self.time_stamp)
    }
}

/// A segment seen through its waveform's current window
#[derive(Debug, Clone, Copy)]
pub struct SegmentView<'a> {
    id: &'a MarkerId,
    segment: &'a Segment,
    waveform: &'a Waveform,
}

impl<'a> SegmentView<'a> {
    pub fn id(&self) -> &'a MarkerId {
        self.id
    }

    pub fn segment(&self) -> &'a Segment {
        self.segment
    }

    pub fn offset_start(&self) -> Option<usize> {
        self.segment.offset_start(self.waveform.window())
    }

    pub fn offset_end(&self) -> Option<usize> {
        self.segment.offset_end(self.waveform.window())
    }

    pub fn offset_length(&self) -> usize {
        self.segment.offset_length(self.waveform.window())
    }

    pub fn visible(&self) -> bool {
        self.segment.visible(self.waveform.window())
    }

    /// Minima of the visible part, empty when not visible
    pub fn min(&self) -> Vec<i8> {
        self.values(0)
    }

    /// Maxima of the visible part, empty when not visible
    pub fn max(&self) -> Vec<i8> {
        self.values(1)
    }

    fn values(&self, side: usize) -> Vec<i8> {
        match self.waveform.window().intersect(self.segment.start, self.segment.end) {
            Some((start, end)) => self.waveform.offset_values(start, end, side),
            None => Vec::new(),
        }
    }
}

/// A point seen through its waveform's current window
#[derive(Debug, Clone, Copy)]
pub struct PointView<'a> {
    id: &'a MarkerId,
    point: &'a Point,
    waveform: &'a Waveform,
}

impl<'a> PointView<'a> {
    pub fn id(&self) -> &'a MarkerId {
        self.id
    }

    pub fn point(&self) -> &'a Point {
        self.point
    }

    pub fn time_stamp(&self) -> usize {
        self.point.time_stamp
    }

    /// Position of the point in seconds
    pub fn time(&self) -> f64 {
        self.waveform.time(self.point.time_stamp)
    }

    pub fn visible(&self) -> bool {
        self.point.visible(self.waveform.window())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registries
// ─────────────────────────────────────────────────────────────────────────────

impl Waveform {
    /// Store a segment under `id` (default `"default"`), replacing any
    /// segment with the same identifier
    ///
    /// Overlapping segments are allowed. On error the registry is unchanged.
    pub fn set_segment(&mut self, start: usize, end: usize, id: Option<&str>) -> PeaksResult<Segment> {
        let segment = Segment::new(start, end)?;
        let id = MarkerId::resolve(id);
        log::debug!("Segment '{}' set to [{}, {})", id, start, end);
        self.segments.insert(id, segment);
        Ok(segment)
    }

    /// Segment registered under `id`
    pub fn segment(&self, id: &str) -> Option<SegmentView<'_>> {
        self.segments
            .get_key_value(id)
            .map(|(id, segment)| SegmentView {
                id,
                segment,
                waveform: self,
            })
    }

    /// All segments, ordered by identifier
    pub fn segments(&self) -> impl Iterator<Item = SegmentView<'_>> {
        self.segments.iter().map(move |(id, segment)| SegmentView {
            id,
            segment,
            waveform: self,
        })
    }

    /// Remove one segment; other segments are unaffected
    pub fn remove_segment(&mut self, id: &str) -> Option<Segment> {
        self.segments.remove(id)
    }

    pub fn remove_all_segments(&mut self) {
        self.segments.clear();
    }

    /// Store a point at block `time_stamp` under `id` (default `"default"`)
    pub fn set_point(&mut self, time_stamp: usize, id: Option<&str>) -> Point {
        let id = MarkerId::resolve(id);
        log::debug!("Point '{}' set to {}", id, time_stamp);
        let point = Point::new(time_stamp);
        self.points.insert(id, point);
        point
    }

    /// Store a point at the block containing `seconds`
    ///
    /// Rejects negative and non-finite times.
    pub fn set_point_at_time(&mut self, seconds: f64, id: Option<&str>) -> PeaksResult<Point> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(PeaksError::InvalidPoint(format!(
                "time {} is not a non-negative number of seconds",
                seconds
            )));
        }
        let time_stamp = self.at_time(seconds);
        Ok(self.set_point(time_stamp, id))
    }

    /// Point registered under `id`
    pub fn point(&self, id: &str) -> Option<PointView<'_>> {
        self.points.get_key_value(id).map(|(id, point)| PointView {
            id,
            point,
            waveform: self,
        })
    }

    /// All points, ordered by identifier
    pub fn points(&self) -> impl Iterator<Item = PointView<'_>> {
        self.points.iter().map(move |(id, point)| PointView {
            id,
            point,
            waveform: self,
        })
    }

    pub fn remove_point(&mut self, id: &str) -> Option<Point> {
        self.points.remove(id)
    }

    pub fn remove_all_points(&mut self) {
        self.points.clear();
    }
}
