//! Comma-separated rendering of an analysed curve.
use std::io;
use std::io::prelude::*;

use crate::marker::CurveMarker;

/// The wavelength window of the detailed output. This is independent of the
/// smoothing boundaries and kept for compatibility with existing result files.
pub const DISPLAY_START: f64 = 300.0;
pub const DISPLAY_END: f64 = 701.0;

const PRECISION: usize = 20;

/// Which fields [`CurveMarker::format_point`] writes, in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputColumns {
    pub wavelength: bool,
    pub raw: bool,
    pub smoothed: bool,
    /// The smoothed reflectance if the point is part of a monotonic change, else empty
    pub monotonic: bool,
    /// The smoothed reflectance if the point is a marker point, else empty
    pub marker: bool,
}

impl OutputColumns {
    pub const ALL: OutputColumns = OutputColumns {
        wavelength: true,
        raw: true,
        smoothed: true,
        monotonic: true,
        marker: true,
    };
}

impl Default for OutputColumns {
    fn default() -> Self {
        Self::ALL
    }
}

impl CurveMarker {
    /// Render the point at `index` as comma-joined fixed-point fields
    pub fn format_point(&self, index: usize, columns: OutputColumns) -> String {
        let point = &self.points()[index];
        let smoothed = format!("{:.*}", PRECISION, point.reflectance);

        let mut fields: Vec<String> = Vec::with_capacity(5);
        if columns.wavelength {
            fields.push(format!("{:.*}", PRECISION, point.wavelength));
        }
        if columns.raw {
            fields.push(format!("{:.*}", PRECISION, self.raw().reflectance(index)));
        }
        if columns.smoothed {
            fields.push(smoothed.clone());
        }
        if columns.monotonic {
            fields.push(if point.monotonic_change {
                smoothed.clone()
            } else {
                String::new()
            });
        }
        if columns.marker {
            fields.push(if point.marker_point {
                smoothed
            } else {
                String::new()
            });
        }
        fields.join(",")
    }

    /// Indices of the points with a wavelength in `[DISPLAY_START, DISPLAY_END]`
    pub fn displayed_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.points()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.wavelength >= DISPLAY_START && p.wavelength <= DISPLAY_END)
            .map(|(i, _)| i)
    }

    /// Every point with a wavelength in `[DISPLAY_START, DISPLAY_END]`, each
    /// preceded by a newline, with all columns.
    pub fn detailed_output(&self) -> String {
        let mut buffer = String::new();
        for index in self.displayed_indices() {
            buffer.push('\n');
            buffer.push_str(&self.format_point(index, OutputColumns::ALL));
        }
        buffer
    }
}

/// Write the detailed output of `marker` to `writer`
pub fn write_detailed<W: Write>(marker: &CurveMarker, writer: &mut W) -> io::Result<()> {
    for index in marker.displayed_indices() {
        writer.write_all(b"\n")?;
        writer.write_all(marker.format_point(index, OutputColumns::ALL).as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::curve::CurveSeries;
    use crate::marker::MarkerParameters;

    fn marker() -> CurveMarker {
        let raw: CurveSeries = vec![
            (250.0, 0.0),
            (300.0, 0.0),
            (350.0, 50.0),
            (400.0, 100.0),
            (750.0, 100.0),
        ]
        .into();
        CurveMarker::new(raw, MarkerParameters::new(40.0, 100.0, 0, 0))
    }

    #[test]
    fn test_format_point() {
        let marker = marker();
        let idx = marker.marker_indices()[0];
        assert_eq!(marker.points()[idx].wavelength, 350.0);
        assert_eq!(
            marker.format_point(idx, OutputColumns::ALL),
            "350.00000000000000000000,50.00000000000000000000,50.00000000000000000000,50.00000000000000000000,50.00000000000000000000"
        );
        let columns = OutputColumns {
            raw: false,
            smoothed: false,
            ..OutputColumns::ALL
        };
        assert_eq!(
            marker.format_point(4, columns),
            "750.00000000000000000000,100.00000000000000000000,"
        );
    }

    #[test]
    fn test_detailed_window() {
        let marker = marker();
        let output = marker.detailed_output();
        assert!(output.starts_with('\n'));
        let lines: Vec<&str> = output.lines().skip(1).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("300.0"));
        assert!(lines[2].starts_with("400.0"));
        assert!(lines.iter().all(|l| l.split(',').count() == 5));
    }

    #[test]
    fn test_written_output_matches_string() {
        let marker = marker();
        let mut buffer = Vec::new();
        write_detailed(&marker, &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), marker.detailed_output());
        assert_eq!(marker.displayed_indices().collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
