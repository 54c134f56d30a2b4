//! Marker point detection on a smoothed reflectance curve.
//!
//! The curve is first smoothed (see [`crate::smooth`]), then split into
//! segments of consistent slope direction using a lookahead mean. Each segment
//! whose vertical change is at least `amplitude`, and which contains a
//! sub-segment steeper than `amplitude / range`, is flagged as a monotonic
//! change, and the point closest to its mid-height becomes a marker point.
//!
//! # Known limitation
//! The sub-segment search in [`mark_segment`] is not exhaustive. For each
//! starting index it only tests the gradient of the *first* sub-segment whose
//! vertical change reaches `amplitude` and then moves on to the next start,
//! so a steeper, longer sub-segment from the same start is never tried. This
//! matches the historical marker tool, whose output this crate reproduces.
use std::mem;

use log::{debug, trace};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::curve::{CurveSeries, Sample};
use crate::smooth::{smooth, MovingWindow, SmoothingMethod};

/// Detection parameters for [`CurveMarker`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MarkerParameters {
    /// The minimum change in reflectance, in `(0, 100]`, which counts as a step
    pub amplitude: f64,
    /// The maximum wavelength span over which `amplitude` must be reached
    pub range: f64,
    /// The half-width of the uniform smoothing kernel
    pub smoothing_window: usize,
    /// The number of following points averaged to decide the slope direction
    pub lookahead: usize,
}

impl Default for MarkerParameters {
    fn default() -> Self {
        Self {
            amplitude: 20.0,
            range: 50.0,
            smoothing_window: 10,
            lookahead: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ParameterError {
    #[error("amplitude must be in (0, 100], received {0}")]
    AmplitudeOutOfRange(f64),
    #[error("range must be greater than 0, received {0}")]
    RangeNotPositive(f64),
}

impl MarkerParameters {
    pub fn new(amplitude: f64, range: f64, smoothing_window: usize, lookahead: usize) -> Self {
        Self {
            amplitude,
            range,
            smoothing_window,
            lookahead,
        }
    }

    /// The smallest reflectance change per wavelength unit which qualifies as a step
    #[inline]
    pub fn min_gradient(&self) -> f64 {
        self.amplitude / self.range
    }

    /// Check that `amplitude` and `range` are in the domain the detector expects.
    ///
    /// [`CurveMarker`] does not call this, callers are expected to validate
    /// user-provided values before running an analysis.
    pub fn validate(&self) -> Result<(), ParameterError> {
        if !(self.amplitude > 0.0 && self.amplitude <= 100.0) {
            Err(ParameterError::AmplitudeOutOfRange(self.amplitude))
        } else if !(self.range > 0.0) {
            Err(ParameterError::RangeNotPositive(self.range))
        } else {
            Ok(())
        }
    }
}

/// A builder for configuring [`MarkerParameters`]
#[derive(Debug, Clone, Default)]
pub struct MarkerParametersBuilder {
    parameters: MarkerParameters,
}

impl MarkerParametersBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn amplitude(&mut self, amplitude: f64) -> &mut Self {
        self.parameters.amplitude = amplitude;
        self
    }

    pub fn range(&mut self, range: f64) -> &mut Self {
        self.parameters.range = range;
        self
    }

    pub fn smoothing_window(&mut self, smoothing_window: usize) -> &mut Self {
        self.parameters.smoothing_window = smoothing_window;
        self
    }

    pub fn lookahead(&mut self, lookahead: usize) -> &mut Self {
        self.parameters.lookahead = lookahead;
        self
    }

    pub fn build(&self) -> MarkerParameters {
        self.parameters
    }
}

impl From<MarkerParametersBuilder> for MarkerParameters {
    fn from(value: MarkerParametersBuilder) -> Self {
        value.build()
    }
}

/// A point of the smoothed curve with its detection flags
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnnotatedPoint {
    pub wavelength: f64,
    /// The smoothed reflectance
    pub reflectance: f64,
    /// Whether this point lies in a segment which met the gradient criterion
    pub monotonic_change: bool,
    /// Whether this point is the representative of such a segment
    pub marker_point: bool,
}

impl AnnotatedPoint {
    pub fn reset(&mut self) {
        self.monotonic_change = false;
        self.marker_point = false;
    }
}

impl From<Sample> for AnnotatedPoint {
    fn from(sample: Sample) -> Self {
        Self {
            wavelength: sample.wavelength,
            reflectance: sample.reflectance,
            monotonic_change: false,
            marker_point: false,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SlopeDirection {
    #[default]
    Rising,
    Falling,
}

/// An inclusive run of indices `[begin, end]` sharing one slope direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment {
    pub begin: usize,
    pub end: usize,
    pub direction: SlopeDirection,
}

impl Segment {
    pub fn new(begin: usize, end: usize, direction: SlopeDirection) -> Self {
        Self {
            begin,
            end,
            direction,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.begin + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        self.begin <= index && index <= self.end
    }
}

/// Split `points` into segments of consistent slope direction.
///
/// At each index `i` the reflectance is compared with the mean over
/// `[i, i + lookahead]`: higher means the curve is falling, otherwise it is
/// rising. A segment is closed at the first index whose direction differs
/// from the running direction (that index is included in the closing segment)
/// or at the last evaluable index `N - lookahead - 1`. The next segment starts
/// right after and inherits the direction which closed the previous one.
///
/// The returned segments partition `[0, N - lookahead)`. Indices past that
/// do not have enough lookahead and belong to no segment.
pub fn segment_slopes(points: &[AnnotatedPoint], lookahead: usize) -> Vec<Segment> {
    let n = points.len();
    let stop = n.saturating_sub(lookahead);
    let mut segments = Vec::new();

    if stop == 0 {
        return segments;
    }
    if stop == 1 {
        segments.push(Segment::new(0, 0, SlopeDirection::Rising));
        return segments;
    }

    let reflectance = |idx: usize| points[idx].reflectance;

    let mut window = MovingWindow::new(lookahead + 1, (0..=lookahead).map(reflectance));
    let mut begin = 0;
    let mut direction = SlopeDirection::Rising;
    let mut end = 1;

    while end < stop {
        window.slide(reflectance(end - 1), reflectance(end + lookahead));
        let current_direction = if reflectance(end) > window.average() {
            SlopeDirection::Falling
        } else {
            SlopeDirection::Rising
        };

        let is_last = end == stop - 1;
        if current_direction != direction || is_last {
            segments.push(Segment::new(begin, end, direction));
            if !is_last {
                begin = end + 1;
                end += 1;
                window.slide(reflectance(end - 1), reflectance(end + lookahead));
                direction = current_direction;
                if end == stop - 1 {
                    // No index is left to evaluate, the new segment holds one point
                    segments.push(Segment::new(begin, end, direction));
                }
            }
        }
        end += 1;
    }
    segments
}

/// Find the index in `[begin, end]` whose reflectance is closest to the mid-height
/// of the segment's end points. The first index wins ties.
pub fn select_center_point(points: &[AnnotatedPoint], begin: usize, end: usize) -> Option<usize> {
    let mid_height = (points[begin].reflectance + points[end].reflectance) / 2.0;

    let mut closest_distance = f64::INFINITY;
    let mut closest = None;
    for (offset, point) in points[begin..=end].iter().enumerate() {
        let distance = (point.reflectance - mid_height).abs();
        if distance < closest_distance {
            closest_distance = distance;
            closest = Some(begin + offset);
        }
    }
    closest
}

/// Flag the segment `[begin, end]` if it meets the gradient criterion.
///
/// The segment fails outright when the change between its end points is below
/// `amplitude`. Otherwise sub-segments are visited by increasing start and then
/// increasing end. The first sub-segment from a given start whose vertical change
/// reaches `amplitude` decides for that start: if its gradient is at least
/// `amplitude / range` the whole segment is flagged as a monotonic change and its
/// center point becomes a marker, otherwise the search moves to the next start.
///
/// Returns the index of the marker point, if one was placed.
pub fn mark_segment(
    points: &mut [AnnotatedPoint],
    begin: usize,
    end: usize,
    parameters: &MarkerParameters,
) -> Option<usize> {
    let min_vertical_range = parameters.amplitude;
    let min_gradient = parameters.min_gradient();

    let full_vertical_range = (points[end].reflectance - points[begin].reflectance).abs();
    if full_vertical_range < min_vertical_range {
        return None;
    }

    for sub_begin in begin..end {
        for sub_end in (sub_begin + 1)..=end {
            let vertical_range =
                (points[sub_end].reflectance - points[sub_begin].reflectance).abs();
            if vertical_range < min_vertical_range {
                continue;
            }
            let horizontal_range = points[sub_end].wavelength - points[sub_begin].wavelength;
            let gradient = if horizontal_range == 0.0 {
                0.0
            } else {
                vertical_range / horizontal_range
            };
            if gradient >= min_gradient {
                trace!(
                    "Segment [{begin}, {end}] qualifies through [{sub_begin}, {sub_end}] with gradient {gradient}"
                );
                points[begin..=end]
                    .iter_mut()
                    .for_each(|p| p.monotonic_change = true);
                let center = select_center_point(points, begin, end);
                if let Some(center) = center {
                    points[center].marker_point = true;
                }
                return center;
            }
            break;
        }
    }
    None
}

/// Runs the smoothing and marker detection over one raw curve and owns the result.
///
/// The raw [`CurveSeries`] is kept untouched. The annotated points are recomputed
/// wholesale by [`CurveMarker::analyse`] whenever the parameters change.
#[derive(Debug, Clone)]
pub struct CurveMarker {
    parameters: MarkerParameters,
    method: SmoothingMethod,
    raw: CurveSeries,
    points: Vec<AnnotatedPoint>,
    segments: Vec<Segment>,
}

impl CurveMarker {
    /// Analyse `raw` with `parameters` using the default [`SmoothingMethod`]
    pub fn new(raw: CurveSeries, parameters: MarkerParameters) -> Self {
        Self::with_method(raw, parameters, SmoothingMethod::default())
    }

    pub fn with_method(raw: CurveSeries, parameters: MarkerParameters, method: SmoothingMethod) -> Self {
        let mut inst = Self {
            parameters,
            method,
            raw,
            points: Vec::new(),
            segments: Vec::new(),
        };
        inst.smooth();
        inst.mark_curve();
        inst
    }

    /// Re-run the detection with new `parameters`.
    ///
    /// If the smoothing window changed the curve is smoothed again from the raw
    /// data, otherwise the existing flags are cleared in place. Segmentation and
    /// marking always run again, so calling this twice with the same parameters
    /// produces the same points.
    pub fn analyse(&mut self, parameters: MarkerParameters) {
        let resmooth = parameters.smoothing_window != self.parameters.smoothing_window;
        self.parameters = parameters;
        if resmooth {
            self.smooth();
        } else {
            self.reset();
        }
        self.mark_curve();
    }

    fn smooth(&mut self) {
        self.points = smooth(&self.raw, self.parameters.smoothing_window, self.method)
            .into_iter()
            .map(AnnotatedPoint::from)
            .collect();
    }

    fn reset(&mut self) {
        self.points.iter_mut().for_each(AnnotatedPoint::reset);
    }

    fn mark_curve(&mut self) {
        debug_assert!(self.parameters.validate().is_ok());
        let segments = segment_slopes(&self.points, self.parameters.lookahead);
        let mut marker_count = 0;
        for segment in segments.iter() {
            if mark_segment(&mut self.points, segment.begin, segment.end, &self.parameters).is_some() {
                marker_count += 1;
            }
        }
        debug!(
            "Found {} segments and {} markers over {} points",
            segments.len(),
            marker_count,
            self.points.len()
        );
        self.segments = segments;
    }

    pub fn parameters(&self) -> &MarkerParameters {
        &self.parameters
    }

    pub fn method(&self) -> SmoothingMethod {
        self.method
    }

    pub fn raw(&self) -> &CurveSeries {
        &self.raw
    }

    pub fn points(&self) -> &[AnnotatedPoint] {
        &self.points
    }

    /// The segments found by the last analysis
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn marker_indices(&self) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.marker_point)
            .map(|(i, _)| i)
            .collect()
    }

    /// The wavelengths of all marker points with `start <= wavelength <= end + 1`.
    ///
    /// The upper bound is deliberately one unit past `end`.
    pub fn markers_between(&self, start: f64, end: f64) -> Vec<f64> {
        self.points
            .iter()
            .filter(|p| p.marker_point && p.wavelength >= start && p.wavelength <= end + 1.0)
            .map(|p| p.wavelength)
            .collect()
    }

    pub fn into_raw(self) -> CurveSeries {
        self.raw
    }
}

/// A named raw curve together with its analysis, once one has been run
#[derive(Debug, Clone)]
pub struct Curve {
    pub name: String,
    raw: CurveSeries,
    result: Option<CurveMarker>,
}

impl Curve {
    pub fn new<S: Into<String>>(name: S, raw: CurveSeries) -> Self {
        Self {
            name: name.into(),
            raw,
            result: None,
        }
    }

    pub fn raw(&self) -> &CurveSeries {
        match &self.result {
            Some(marker) => marker.raw(),
            None => &self.raw,
        }
    }

    /// Run the analysis, creating the [`CurveMarker`] on the first call and
    /// re-analysing it in place afterwards.
    pub fn analyse(&mut self, parameters: MarkerParameters) -> &CurveMarker {
        let marker = match self.result.take() {
            Some(mut marker) => {
                marker.analyse(parameters);
                marker
            }
            None => CurveMarker::new(mem::take(&mut self.raw), parameters),
        };
        self.result.insert(marker)
    }

    pub fn result(&self) -> Option<&CurveMarker> {
        self.result.as_ref()
    }
}
