//! Uniform-window smoothing of a reflectance curve.
//!
//! The smoothed value at index `i` is the unweighted mean of the raw reflectance
//! over `[i - H, i + H]`. The first and last `H` points do not have enough
//! neighbours and are set to zero, the wavelength being copied through.
use std::ops::{AddAssign, SubAssign};

use log::trace;
use num_traits::{Float, FromPrimitive};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::curve::{CurveSeries, Sample};

/// A running sum over a window of fixed size which slides one value at a time.
///
/// Used for both the smoothing kernel and the slope lookahead. The sum is
/// updated as `(sum - leaving) + entering`, so after many slides it may drift
/// from a freshly computed sum by a few ULPs.
#[derive(Debug, Clone)]
pub struct MovingWindow<F: Float + AddAssign + SubAssign> {
    running_sum: F,
    divisor: F,
}

impl<F: Float + AddAssign + SubAssign + FromPrimitive> MovingWindow<F> {
    /// Create a window of `size` items, summing `initial` in order.
    pub fn new<I: IntoIterator<Item = F>>(size: usize, initial: I) -> Self {
        let running_sum = initial.into_iter().fold(F::zero(), |acc, val| acc + val);
        let divisor = F::from_usize(size).unwrap_or_else(F::one);
        Self {
            running_sum,
            divisor,
        }
    }

    #[inline]
    pub fn slide(&mut self, leaving: F, entering: F) {
        self.running_sum -= leaving;
        self.running_sum += entering;
    }

    #[inline]
    pub fn sum(&self) -> F {
        self.running_sum
    }

    #[inline]
    pub fn average(&self) -> F {
        self.running_sum / self.divisor
    }
}

/// How the interior of the curve is averaged.
///
/// Both methods compute the same mean, but floating point summation order
/// differs so their results are not bit-identical.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SmoothingMethod {
    /// Maintain a running sum, subtracting the value leaving the window and
    /// adding the one entering it. Linear in the length of the curve.
    #[default]
    RunningSum,
    /// Re-sum the whole window at every index. Reproduces the numbers of the
    /// older reference tool exactly.
    Resum,
}

/// Smooth `series` with a uniform kernel of half-width `half_window`.
///
/// The output has the same length and wavelengths as `series`. Indices in
/// `[0, H)` and `[N - H, N)` get a reflectance of zero. When `N <= 2H` no
/// index is smoothed.
pub fn smooth(series: &CurveSeries, half_window: usize, method: SmoothingMethod) -> Vec<Sample> {
    let n = series.len();
    let window_size = 2 * half_window + 1;

    let mut smoothed: Vec<Sample> = series
        .iter()
        .map(|s| Sample::new(s.wavelength, 0.0))
        .collect();

    if n < window_size {
        trace!(
            "Curve of {n} points is too short for a smoothing window of {window_size}, nothing smoothed"
        );
        return smoothed;
    }

    let start = half_window;
    let stop = n - half_window;

    match method {
        SmoothingMethod::RunningSum => {
            let mut window = MovingWindow::new(
                window_size,
                series.iter().take(window_size).map(|s| s.reflectance),
            );
            smoothed[start].reflectance = window.average();
            for idx in (start + 1)..stop {
                window.slide(
                    series.reflectance(idx - half_window - 1),
                    series.reflectance(idx + half_window),
                );
                smoothed[idx].reflectance = window.average();
            }
        }
        SmoothingMethod::Resum => {
            let divisor = window_size as f64;
            for idx in start..stop {
                let total = ((idx - half_window)..=(idx + half_window))
                    .fold(0.0, |acc, i| acc + series.reflectance(i));
                smoothed[idx].reflectance = total / divisor;
            }
        }
    }
    smoothed
}
