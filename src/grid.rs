//! Grid parameter editor: six text inputs in, a [`GeoGrid`] out.

use crate::error::{Axis, InputError};
use crate::model::{GeoGrid, GridAxis};

/// Smallest accepted sampling step, in degrees.
pub const MIN_STEP: f64 = 0.1;

/// Text contents of the grid inputs, `[start, stop, step]` per axis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridForm {
    pub lat: [String; 3],
    pub lon: [String; 3],
}

impl GridForm {
    /// Build a form from `start:stop:step` strings, as given on the command line.
    pub fn from_triples(lat: &str, lon: &str) -> Self {
        Self {
            lat: split_triple(lat),
            lon: split_triple(lon),
        }
    }

    /// Validate all six inputs. Latitude is checked before longitude.
    pub fn validate(&self) -> Result<GeoGrid, InputError> {
        if self.lat.iter().any(|t| t.trim().is_empty()) {
            return Err(InputError::MissingField(Axis::Latitude));
        }
        if self.lon.iter().any(|t| t.trim().is_empty()) {
            return Err(InputError::MissingField(Axis::Longitude));
        }
        let lat = parse_axis(Axis::Latitude, &self.lat)?;
        let lon = parse_axis(Axis::Longitude, &self.lon)?;
        Ok(GeoGrid { lat, lon })
    }

    /// Write a grid back into the inputs.
    pub fn set_grid(&mut self, grid: &GeoGrid) {
        self.lat = format_axis(&grid.lat);
        self.lon = format_axis(&grid.lon);
    }
}

/// Check one axis against its geographic bound and the step constraints.
pub fn validate_axis(axis: Axis, range: GridAxis) -> Result<GridAxis, InputError> {
    let limit = axis.limit();
    let GridAxis { start, stop, step } = range;
    let ok = start < stop
        && (-limit..=limit).contains(&start)
        && (-limit..=limit).contains(&stop)
        && step >= MIN_STEP
        && step <= stop - start;
    if ok {
        Ok(range)
    } else {
        Err(InputError::Range(axis))
    }
}

fn parse_axis(axis: Axis, texts: &[String; 3]) -> Result<GridAxis, InputError> {
    let mut values = [0.0; 3];
    for (slot, text) in values.iter_mut().zip(texts) {
        *slot = parse_number(text).ok_or(InputError::Range(axis))?;
    }
    validate_axis(axis, GridAxis::from(values))
}

/// Parse a decimal accepting either `.` or `,` as the separator.
pub fn parse_number(text: &str) -> Option<f64> {
    let normalized = text.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Shortest text that parses back to exactly `v`.
pub fn format_number(v: f64) -> String {
    format!("{v}")
}

fn format_axis(axis: &GridAxis) -> [String; 3] {
    [
        format_number(axis.start),
        format_number(axis.stop),
        format_number(axis.step),
    ]
}

fn split_triple(text: &str) -> [String; 3] {
    let mut parts = text.split(':').map(|s| s.trim().to_string());
    [
        parts.next().unwrap_or_default(),
        parts.next().unwrap_or_default(),
        parts.next().unwrap_or_default(),
    ]
}
