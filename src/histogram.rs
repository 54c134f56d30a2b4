//! Count marker points from many analysed curves into fixed-width wavelength bins.
use log::debug;
use num_traits::ToPrimitive;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::marker::CurveMarker;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum HistogramError {
    #[error("The bin width must be a positive number, received {0}")]
    NonPositiveBinWidth(f64),
    #[error("The interval end {1} is before its start {0}")]
    InvalidInterval(f64, f64),
}

/// A histogram of marker wavelengths over `[start, end]`.
///
/// There are `floor((end - start) / bin_width)` bins. A marker at wavelength `w`
/// falls in bin `floor((w - start) / bin_width)`.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MarkerHistogram {
    pub bin_count: Vec<usize>,
    pub bin_edges: Vec<f64>,
    pub start: f64,
    pub end: f64,
    pub bin_width: f64,
}

impl MarkerHistogram {
    pub fn new(start: f64, end: f64, bin_width: f64) -> Result<Self, HistogramError> {
        if !(bin_width > 0.0 && bin_width.is_finite()) {
            return Err(HistogramError::NonPositiveBinWidth(bin_width));
        }
        if !(end >= start) {
            return Err(HistogramError::InvalidInterval(start, end));
        }
        let bins = ((end - start) / bin_width).floor().to_usize().unwrap_or_default();

        let bin_edges = (0..(bins + 1))
            .map(|i| start + i as f64 * bin_width)
            .collect();
        Ok(Self {
            bin_count: vec![0; bins],
            bin_edges,
            start,
            end,
            bin_width,
        })
    }

    pub fn clear(&mut self) {
        self.bin_count.iter_mut().for_each(|c| *c = 0);
    }

    /// Count one marker at `wavelength`. Returns `false` if it fell outside of every bin.
    ///
    /// When `end - start` is not a multiple of `bin_width`, or a marker sits exactly
    /// on `end`, the computed bin can be one past the last and the marker is dropped.
    pub fn add(&mut self, wavelength: f64) -> bool {
        if !(wavelength >= self.start && wavelength <= self.end) {
            return false;
        }
        let bin = ((wavelength - self.start) / self.bin_width)
            .floor()
            .to_usize();
        match bin.and_then(|i| self.bin_count.get_mut(i)) {
            Some(count) => {
                *count += 1;
                true
            }
            None => {
                debug!("Marker at {wavelength} is past the last bin, dropping it");
                false
            }
        }
    }

    /// Count every marker point of every curve
    pub fn populate<'a, I: IntoIterator<Item = &'a CurveMarker>>(&mut self, curves: I) {
        for curve in curves {
            for point in curve.points().iter().filter(|p| p.marker_point) {
                self.add(point.wavelength);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bin_count.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bin_count.is_empty()
    }

    pub fn total(&self) -> usize {
        self.bin_count.iter().sum()
    }
}

/// Build a [`MarkerHistogram`] over `[start, end]` from the markers of `curves`
pub fn marker_histogram<'a, I: IntoIterator<Item = &'a CurveMarker>>(
    curves: I,
    start: f64,
    end: f64,
    bin_width: f64,
) -> Result<MarkerHistogram, HistogramError> {
    let mut hist = MarkerHistogram::new(start, end, bin_width)?;
    hist.populate(curves);
    Ok(hist)
}
