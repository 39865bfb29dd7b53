//! CSV import of measured time series.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Name of the time column, in hours from the start of the series.
pub const HOUR_COLUMN: &str = "hour";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot open \"{path}\": {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing column \"{0}\"")]
    MissingColumn(String),
    #[error("column \"{column}\" has no usable values")]
    Empty { column: String },
    #[error("hours must increase, row {row} has {hour} after {previous}")]
    Unordered { row: usize, hour: f64, previous: f64 },
}

/// Reads `column` from a CSV file and interpolates it onto `times_hr`.
///
/// See [`read_series`] for the accepted format.
///
/// # Errors
///
/// Returns an `ImportError` if the file cannot be read or parsed.
pub fn load_series(path: &Path, column: &str, times_hr: &[f64]) -> Result<Vec<f64>, ImportError> {
    let file = File::open(path).map_err(|source| ImportError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_series(file, column, times_hr)
}

/// Reads `column` from CSV and interpolates it onto `times_hr`.
///
/// The input needs an `hour` column with increasing values. Empty or
/// non-numeric cells are skipped and filled by interpolation between the
/// neighbouring samples. Times outside the sampled range take the nearest
/// endpoint value.
///
/// # Errors
///
/// Returns an `ImportError` if a column is missing, no row has a usable
/// value, or the hours are not increasing.
pub fn read_series(reader: impl Read, column: &str, times_hr: &[f64]) -> Result<Vec<f64>, ImportError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ImportError::MissingColumn(name.to_string()))
    };
    let hour_idx = position(HOUR_COLUMN)?;
    let value_idx = position(column)?;

    let mut hours = Vec::new();
    let mut values = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let parse = |idx: usize| record.get(idx).and_then(|s| s.parse::<f64>().ok()).filter(|v| v.is_finite());
        let (Some(hour), Some(value)) = (parse(hour_idx), parse(value_idx)) else {
            continue;
        };
        if let Some(&previous) = hours.last() {
            if hour <= previous {
                return Err(ImportError::Unordered { row, hour, previous });
            }
        }
        hours.push(hour);
        values.push(value);
    }

    if hours.is_empty() {
        return Err(ImportError::Empty {
            column: column.to_string(),
        });
    }
    Ok(times_hr.iter().map(|&t| interpolate(&hours, &values, t)).collect())
}

/// Piecewise-linear interpolation, clamped to the end values.
fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let last = xs.len() - 1;
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[last] {
        return ys[last];
    }
    let i = xs.partition_point(|&xi| xi <= x);
    let (x0, x1) = (xs[i - 1], xs[i]);
    let (y0, y1) = (ys[i - 1], ys[i]);
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const WEATHER: &str = "hour,outdoor,ghi\n0,-5,0\n1,-6,\n2,-4,0.1\n4,0,0.3\n";

    #[test]
    fn interpolates_onto_grid() {
        let t = [0.0, 0.5, 1.0, 3.0];
        let out = read_series(WEATHER.as_bytes(), "outdoor", &t).ok();
        let out = out.unwrap_or_default();
        assert_eq!(out.len(), 4);
        assert_relative_eq!(out[1], -5.5);
        assert_relative_eq!(out[3], -2.0);
    }

    #[test]
    fn missing_values_are_filled() {
        let out = read_series(WEATHER.as_bytes(), "ghi", &[1.0]).unwrap_or_default();
        assert_relative_eq!(out[0], 0.05);
    }

    #[test]
    fn clamps_outside_range() {
        let out = read_series(WEATHER.as_bytes(), "outdoor", &[-1.0, 10.0]).unwrap_or_default();
        assert_eq!(out, vec![-5.0, 0.0]);
    }

    #[test]
    fn missing_column_is_reported() {
        let err = read_series(WEATHER.as_bytes(), "wind", &[0.0]);
        assert!(matches!(err, Err(ImportError::MissingColumn(c)) if c == "wind"));
    }

    #[test]
    fn unordered_hours_are_rejected() {
        let csv = "hour,x\n0,1\n2,2\n1,3\n";
        assert!(matches!(
            read_series(csv.as_bytes(), "x", &[0.0]),
            Err(ImportError::Unordered { row: 2, .. })
        ));
    }

    #[test]
    fn all_blank_column_is_empty() {
        let csv = "hour,x\n0,\n1,nan\n";
        assert!(matches!(
            read_series(csv.as_bytes(), "x", &[0.0]),
            Err(ImportError::Empty { .. })
        ));
    }

    #[test]
    fn missing_file() {
        let err = load_series(Path::new("/nonexistent/weather.csv"), "x", &[0.0]);
        assert!(matches!(err, Err(ImportError::Open { .. })));
    }
}
