//! Parse and analyse many curves at once.
//!
//! Every input is independent: a file which fails to read or parse is reported
//! in its own [`BatchEntry`] and does not prevent the others from being analysed.
//! With the `parallelism` feature inputs are processed concurrently, one curve
//! per task, and results are returned in input order.
use std::fs;
use std::io;
use std::path::Path;

use log::{debug, warn};
use thiserror::Error;

#[cfg(feature = "parallelism")]
use rayon::prelude::*;

use crate::curve::CurveSeries;
use crate::marker::{CurveMarker, MarkerParameters};
use crate::parser::{CurveParser, ParseError};
use crate::smooth::SmoothingMethod;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Read and parse the file at `path` into a [`CurveSeries`]
pub fn read_curve<P: AsRef<Path>>(path: P, parser: &CurveParser) -> Result<CurveSeries, BatchError> {
    let file = fs::File::open(path)?;
    let series = parser.parse(io::BufReader::new(file))?;
    Ok(series)
}

/// The outcome of processing one input
#[derive(Debug)]
pub struct BatchEntry {
    pub name: String,
    pub result: Result<CurveMarker, BatchError>,
}

impl BatchEntry {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn marker(&self) -> Option<&CurveMarker> {
        self.result.as_ref().ok()
    }
}

/// Shared configuration for processing a batch of curves
#[derive(Debug, Default, Clone, Copy)]
pub struct CurveBatch {
    pub parser: CurveParser,
    pub parameters: MarkerParameters,
    pub method: SmoothingMethod,
}

impl CurveBatch {
    pub fn new(parser: CurveParser, parameters: MarkerParameters, method: SmoothingMethod) -> Self {
        Self {
            parser,
            parameters,
            method,
        }
    }

    fn finish(&self, name: String, series: Result<CurveSeries, BatchError>) -> BatchEntry {
        let result = series.map(|raw| CurveMarker::with_method(raw, self.parameters, self.method));
        match &result {
            Ok(marker) => debug!(
                "{name}: {} points, {} markers",
                marker.len(),
                marker.marker_indices().len()
            ),
            Err(err) => warn!("{name}: {err}"),
        }
        BatchEntry { name, result }
    }

    /// Parse and analyse one named text
    pub fn analyse_text(&self, name: &str, content: &str) -> BatchEntry {
        let series = self.parser.parse_str(content).map_err(BatchError::from);
        self.finish(name.to_string(), series)
    }

    /// Read, parse and analyse one file, named after its path
    pub fn analyse_file<P: AsRef<Path>>(&self, path: P) -> BatchEntry {
        let path = path.as_ref();
        let series = read_curve(path, &self.parser);
        self.finish(path.display().to_string(), series)
    }

    /// Analyse `(name, content)` pairs, returning one entry per input in order
    pub fn analyse_texts<S: AsRef<str> + Sync>(&self, inputs: &[(S, S)]) -> Vec<BatchEntry> {
        map_in_order(inputs, |(name, content)| {
            self.analyse_text(name.as_ref(), content.as_ref())
        })
    }

    /// Analyse every file in `paths`, returning one entry per path in order
    pub fn analyse_files<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Vec<BatchEntry> {
        map_in_order(paths, |path| self.analyse_file(path))
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "parallelism")] {
        fn map_in_order<T: Sync, F: Fn(&T) -> BatchEntry + Sync + Send>(items: &[T], f: F) -> Vec<BatchEntry> {
            items.par_iter().map(f).collect()
        }
    } else {
        fn map_in_order<T: Sync, F: Fn(&T) -> BatchEntry + Sync + Send>(items: &[T], f: F) -> Vec<BatchEntry> {
            items.iter().map(f).collect()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::ParsingMode;

    fn good_curve() -> String {
        (300..=400)
            .map(|w| format!("{w},{}\n", if w < 350 { 10 } else { 70 }))
            .collect()
    }

    #[test_log::test]
    fn test_failure_does_not_stop_batch() {
        let batch = CurveBatch::new(
            CurveParser::new(false, ParsingMode::Auto),
            MarkerParameters::new(20.0, 50.0, 2, 1),
            SmoothingMethod::RunningSum,
        );
        let broken = "300,1\n301,2\n302,3\n303,4\n304,x\n".to_string();
        let inputs = vec![
            ("a.csv".to_string(), good_curve()),
            ("broken.csv".to_string(), broken),
            ("b.csv".to_string(), good_curve()),
        ];
        let entries = batch.analyse_texts(&inputs);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, "a.csv");
        assert!(entries[0].is_ok());
        assert!(entries[2].is_ok());

        let err = entries[1].result.as_ref().unwrap_err();
        assert!(matches!(
            err,
            BatchError::Parse(ParseError::NotANumber { row: 5, .. })
        ));
        assert!(err.to_string().contains("line 5"));

        let found = entries[0].marker().unwrap().markers_between(340.0, 360.0);
        assert_eq!(found.len(), 1, "{found:?}");
    }

    #[test]
    fn test_missing_file() {
        let batch = CurveBatch::default();
        let entries = batch.analyse_files(&["this/file/does/not/exist.csv"]);
        assert_eq!(entries.len(), 1);
        assert!(matches!(entries[0].result, Err(BatchError::Io(_))));
    }
}
