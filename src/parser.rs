//! Read comma-delimited reflectance records into a [`CurveSeries`].
//!
//! Each row holds one wavelength and one or more replicate reflectance readings,
//! either as `wavelength, r1, r2, ...` ([`ColumnLayout::Single`]) or as repeated
//! `wavelength, r1, wavelength, r2, ...` pairs ([`ColumnLayout::Multi`]).
//! Replicates outside of `[0, 100]` are discarded before averaging.
use std::io;

use log::{debug, warn};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::curve::{CurveSeries, Sample};

const LOWER_BOUND: f64 = 0.0;
const UPPER_BOUND: f64 = 100.0;

/// How the columns of a file are laid out, as requested by the caller.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ParsingMode {
    /// One wavelength column followed by replicate columns
    #[default]
    Single,
    /// Repeated `wavelength, reflectance` column pairs
    Multi,
    /// Detect the layout from the first data row
    Auto,
}

/// A column layout after [`ParsingMode::Auto`] has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnLayout {
    Single,
    Multi,
}

impl ColumnLayout {
    /// The distance between two replicate fields in a row
    pub const fn stride(&self) -> usize {
        match self {
            ColumnLayout::Single => 1,
            ColumnLayout::Multi => 2,
        }
    }
}

impl ParsingMode {
    /// Resolve this mode into a concrete [`ColumnLayout`] given the first data row.
    ///
    /// [`ParsingMode::Auto`] picks [`ColumnLayout::Multi`] when the row has an even
    /// number of fields and every wavelength slot (fields 0, 2, 4, ...) holds the
    /// same text as the first one. Otherwise it falls back to [`ColumnLayout::Single`].
    pub fn resolve<S: AsRef<str>>(&self, first_row: &[S]) -> ColumnLayout {
        match self {
            ParsingMode::Single => ColumnLayout::Single,
            ParsingMode::Multi => ColumnLayout::Multi,
            ParsingMode::Auto => {
                if first_row.len() % 2 != 0 {
                    return ColumnLayout::Single;
                }
                let reference = first_row.first().map(|f| f.as_ref());
                let repeated = first_row
                    .iter()
                    .step_by(2)
                    .all(|field| Some(field.as_ref()) == reference);
                if repeated {
                    ColumnLayout::Multi
                } else {
                    ColumnLayout::Single
                }
            }
        }
    }
}

fn header_hint_suffix(header_hint: &bool) -> &'static str {
    if *header_hint {
        "\n  ** Consider turning \"Skip Header\" on. **"
    } else {
        ""
    }
}

/// All the ways reading a curve can fail
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Error: can not read a number at line {row}. Found '{text}'{}", header_hint_suffix(.header_hint))]
    NotANumber {
        /// The 1-based data row, counted after the header was skipped
        row: usize,
        text: String,
        /// Set when the failure is on the first row and the header was not skipped
        header_hint: bool,
    },
    #[error("cannot parse file: no parsable rows")]
    Empty,
    #[error("malformed delimited text: {0}")]
    Csv(#[from] csv::Error),
}

/// Accumulate the replicate readings of one row, keeping valid and invalid
/// readings apart.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ReplicateSummary {
    pub valid_count: usize,
    pub valid_sum: f64,
    pub invalid_count: usize,
    pub invalid_sum: f64,
}

impl ReplicateSummary {
    pub fn push(&mut self, value: f64) {
        if (LOWER_BOUND..=UPPER_BOUND).contains(&value) {
            self.valid_count += 1;
            self.valid_sum += value;
        } else {
            self.invalid_count += 1;
            self.invalid_sum += value;
        }
    }

    pub fn is_all_invalid(&self) -> bool {
        self.valid_count == 0 && self.invalid_count > 0
    }

    /// The reflectance for the row.
    ///
    /// The mean of the valid replicates if there are any, zero if there were
    /// no replicates at all, and otherwise the boundary the invalid replicates
    /// violate on average.
    pub fn reflectance(&self) -> f64 {
        if self.valid_count != 0 {
            self.valid_sum / self.valid_count as f64
        } else if self.invalid_count == 0 {
            0.0
        } else if self.invalid_sum / self.invalid_count as f64 > UPPER_BOUND {
            UPPER_BOUND
        } else {
            LOWER_BOUND
        }
    }
}

impl FromIterator<f64> for ReplicateSummary {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        let mut summary = Self::default();
        iter.into_iter().for_each(|v| summary.push(v));
        summary
    }
}

/// Reduce a set of replicate readings to a single reflectance value
pub fn reduce_replicates<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    values.into_iter().collect::<ReplicateSummary>().reflectance()
}

/// Builds a [`CurveSeries`] from delimited text
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CurveParser {
    /// Discard the first row of the input
    pub skip_header: bool,
    pub parsing_mode: ParsingMode,
}

/// A builder for configuring [`CurveParser`]
#[derive(Debug, Default, Clone)]
pub struct CurveParserBuilder {
    skip_header: bool,
    parsing_mode: ParsingMode,
}

impl CurveParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_header(&mut self, skip_header: bool) -> &mut Self {
        self.skip_header = skip_header;
        self
    }

    pub fn parsing_mode(&mut self, parsing_mode: ParsingMode) -> &mut Self {
        self.parsing_mode = parsing_mode;
        self
    }

    pub fn build(&self) -> CurveParser {
        CurveParser::new(self.skip_header, self.parsing_mode)
    }
}

impl From<CurveParserBuilder> for CurveParser {
    fn from(value: CurveParserBuilder) -> Self {
        value.build()
    }
}

impl CurveParser {
    pub fn new(skip_header: bool, parsing_mode: ParsingMode) -> Self {
        Self {
            skip_header,
            parsing_mode,
        }
    }

    /// An empty field reads as zero, as spreadsheet exports pad short rows with them
    fn number_at(&self, row: usize, text: &str) -> Result<f64, ParseError> {
        if text.is_empty() {
            return Ok(0.0);
        }
        match text.parse::<f64>() {
            Ok(value) if !value.is_nan() => Ok(value),
            _ => Err(ParseError::NotANumber {
                row,
                text: text.to_string(),
                header_hint: row == 1 && !self.skip_header,
            }),
        }
    }

    /// Parse a string holding the whole content of a file
    pub fn parse_str(&self, content: &str) -> Result<CurveSeries, ParseError> {
        self.parse(content.as_bytes())
    }

    /// Parse delimited text from `reader` into a [`CurveSeries`], one sample per
    /// data row in row order.
    pub fn parse<R: io::Read>(&self, reader: R) -> Result<CurveSeries, ParseError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(self.skip_header)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let records = reader
            .records()
            .collect::<Result<Vec<csv::StringRecord>, csv::Error>>()?;

        let first = match records.first() {
            Some(first) => first,
            None => return Err(ParseError::Empty),
        };
        let first_fields: Vec<&str> = first.iter().collect();
        let layout = self.parsing_mode.resolve(&first_fields);
        debug!(
            "Reading {} rows with {:?} layout (requested {:?})",
            records.len(),
            layout,
            self.parsing_mode
        );

        let mut samples = Vec::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            let row = idx + 1;
            let wavelength = self.number_at(row, record.get(0).unwrap_or(""))?;

            let mut replicates = ReplicateSummary::default();
            for field in record.iter().skip(1).step_by(layout.stride()) {
                replicates.push(self.number_at(row, field)?);
            }
            if replicates.is_all_invalid() {
                warn!(
                    "Row {row} at wavelength {wavelength} has no replicate in [0, 100], clipping to {}",
                    replicates.reflectance()
                );
            }
            samples.push(Sample::new(wavelength, replicates.reflectance()));
        }

        let series = CurveSeries::new(samples);
        if !series.is_sorted() {
            warn!("Wavelengths are not in ascending order, the curve is analysed in row order");
        }
        Ok(series)
    }
}
