//! Point file ingestion.
//!
//! A points file is plain text with one `lat lon value` row per line, separated by
//! whitespace. Blank lines and `#` comments are skipped. Either the whole file turns
//! into a collection or nothing does.

use crate::error::InputError;
use crate::model::{GeoPoint, GeoPointFeatureCollection};
use std::path::Path;

const EXPECTED_COLUMNS: usize = 3;
const SHAPE_HINT: &str = "points file must contain three columns: lat lon value";

/// Read and validate a points file.
pub fn read_points_file(path: &Path) -> Result<GeoPointFeatureCollection, InputError> {
    let text = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let points = parse_points(&text)?;
    tracing::info!(path = %path.display(), count = points.len(), "loaded points file");
    Ok(points)
}

/// Parse points text. Shape problems are reported before any coordinate is checked.
pub fn parse_points(text: &str) -> Result<GeoPointFeatureCollection, InputError> {
    let mut rows: Vec<[f64; EXPECTED_COLUMNS]> = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let data = line.split('#').next().unwrap_or_default().trim();
        if data.is_empty() {
            continue;
        }
        let cols: Vec<&str> = data.split_whitespace().collect();
        if cols.len() != EXPECTED_COLUMNS {
            return Err(InputError::Format(format!(
                "{SHAPE_HINT} (line {} has {} columns)",
                line_no + 1,
                cols.len()
            )));
        }
        let mut row = [0.0; EXPECTED_COLUMNS];
        for (slot, col) in row.iter_mut().zip(&cols) {
            *slot = col.parse::<f64>().map_err(|_| {
                InputError::Format(format!(
                    "line {}: could not convert {col:?} to a number",
                    line_no + 1
                ))
            })?;
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(InputError::Format(format!("{SHAPE_HINT} (file has no rows)")));
    }

    let points = rows
        .iter()
        .enumerate()
        .map(|(index, &[lat, lon, value])| {
            GeoPoint::new(lon, lat, value).map_err(|e| InputError::Validation {
                index,
                message: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GeoPointFeatureCollection::from_points(points))
}
