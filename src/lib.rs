//! `reflectance_marker` detects marker points on spectral reflectance curves:
//! wavelengths at which reflectance changes by a large enough amount over a
//! short enough wavelength range. Marker points are used to characterise how
//! the colour of a flower is perceived by pollinators.
//!
//! The pipeline reads comma-delimited records with [`CurveParser`], averaging
//! replicate readings into a [`CurveSeries`], then runs a [`CurveMarker`] over
//! it. The marker smooths the curve with a uniform window, splits it into
//! rising and falling segments using a lookahead mean, and flags segments
//! steeper than `amplitude / range`. Markers from many curves can be binned
//! with [`MarkerHistogram`].
//!
//! # Usage
//! ```
//! use reflectance_marker::{CurveMarker, CurveParser, MarkerParameters, ParsingMode};
//!
//! let content: String = (300..=700)
//!     .map(|w| format!("{w},{},{}\n", if w < 500 { 8 } else { 60 }, if w < 500 { 12 } else { 64 }))
//!     .collect();
//!
//! let parser = CurveParser::new(false, ParsingMode::Auto);
//! let series = parser.parse_str(&content).unwrap();
//! assert_eq!(series.len(), 401);
//!
//! let marker = CurveMarker::new(series, MarkerParameters::default());
//! assert_eq!(marker.markers_between(450.0, 505.0), vec![497.0]);
//!
//! // The zeroed smoothing boundary at the end of the curve is a steep drop too
//! assert_eq!(marker.markers_between(300.0, 700.0).len(), 2);
//! ```
pub mod batch;
pub mod curve;
pub mod histogram;
pub mod marker;
pub mod parser;
pub mod smooth;
pub mod text;

pub use crate::batch::{BatchEntry, BatchError, CurveBatch};
pub use crate::curve::{CurveSeries, Sample};
pub use crate::histogram::{marker_histogram, HistogramError, MarkerHistogram};
pub use crate::marker::{
    AnnotatedPoint, Curve, CurveMarker, MarkerParameters, MarkerParametersBuilder,
    ParameterError, Segment, SlopeDirection,
};
pub use crate::parser::{ColumnLayout, CurveParser, CurveParserBuilder, ParseError, ParsingMode};
pub use crate::smooth::SmoothingMethod;
