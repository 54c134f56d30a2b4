//! The raw data container for a reflectance curve.
use std::fmt;
use std::ops::Index;
use std::slice;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single `(wavelength, reflectance)` measurement.
///
/// Reflectance is expected in `[0, 100]` but nothing re-validates it after
/// parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    pub wavelength: f64,
    pub reflectance: f64,
}

impl Sample {
    pub fn new(wavelength: f64, reflectance: f64) -> Self {
        Self {
            wavelength,
            reflectance,
        }
    }
}

impl From<(f64, f64)> for Sample {
    fn from((wavelength, reflectance): (f64, f64)) -> Self {
        Self::new(wavelength, reflectance)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Sample({}, {})", self.wavelength, self.reflectance)
    }
}

/// An ordered, fixed-length sequence of [`Sample`]s.
///
/// Index order is the order the records were read in. Wavelengths are
/// assumed to be non-decreasing but this is not enforced, see
/// [`CurveSeries::is_sorted`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CurveSeries {
    samples: Vec<Sample>,
}

impl CurveSeries {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    #[inline]
    pub fn wavelength(&self, index: usize) -> f64 {
        self.samples[index].wavelength
    }

    #[inline]
    pub fn reflectance(&self, index: usize) -> f64 {
        self.samples[index].reflectance
    }

    pub fn iter(&self) -> slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    /// Check whether the wavelengths are non-decreasing with index
    pub fn is_sorted(&self) -> bool {
        self.samples
            .windows(2)
            .all(|pair| pair[0].wavelength <= pair[1].wavelength)
    }
}

impl Index<usize> for CurveSeries {
    type Output = Sample;

    fn index(&self, index: usize) -> &Self::Output {
        &self.samples[index]
    }
}

impl From<Vec<Sample>> for CurveSeries {
    fn from(samples: Vec<Sample>) -> Self {
        Self::new(samples)
    }
}

impl From<Vec<(f64, f64)>> for CurveSeries {
    fn from(pairs: Vec<(f64, f64)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl<S: Into<Sample>> FromIterator<S> for CurveSeries {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a CurveSeries {
    type Item = &'a Sample;
    type IntoIter = slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_access() {
        let series: CurveSeries = vec![(300.0, 1.0), (301.0, 2.5), (302.0, 4.0)].into();
        assert_eq!(series.len(), 3);
        assert_eq!(series.wavelength(1), 301.0);
        assert_eq!(series.reflectance(2), 4.0);
        assert_eq!(series[0], Sample::new(300.0, 1.0));
        assert!(series.get(3).is_none());
        assert!(series.is_sorted());
    }

    #[test]
    fn test_unsorted_is_kept_in_order() {
        let series: CurveSeries = vec![(400.0, 1.0), (300.0, 2.0)].into();
        assert!(!series.is_sorted());
        let wavelengths: Vec<f64> = series.iter().map(|s| s.wavelength).collect();
        assert_eq!(wavelengths, vec![400.0, 300.0]);
    }
}
