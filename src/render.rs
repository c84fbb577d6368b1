//! Turns a result collection plus its grid into a value lattice and colours.
//!
//! The lattice is rebuilt from the grid axes and every cell is looked up by its exact
//! `(lat, lon)` pair. Drawing is left to the presentation layer.

use crate::model::{GeoGrid, GeoPointFeatureCollection};
use std::collections::HashMap;
use thiserror::Error;

/// Number of filled bands between the observed minimum and maximum.
pub const BANDS: usize = 49;

const COOL: (u8, u8, u8) = (59, 76, 192);
const MID: (u8, u8, u8) = (221, 221, 221);
const WARM: (u8, u8, u8) = (180, 4, 38);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("result has no point at lat {lat}, lon {lon}")]
    MissingCell { lat: f64, lon: f64 },
    #[error("grid has no cells")]
    EmptyGrid,
}

/// Values laid out row-major, one row per latitude sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    lats: Vec<f64>,
    lons: Vec<f64>,
    values: Vec<f64>,
    min: f64,
    max: f64,
}

fn key(lat: f64, lon: f64) -> (u64, u64) {
    // Adding zero folds -0.0 into 0.0.
    ((lat + 0.0).to_bits(), (lon + 0.0).to_bits())
}

impl Heatmap {
    pub fn build(result: &GeoPointFeatureCollection, grid: &GeoGrid) -> Result<Self, RenderError> {
        let lats = grid.lat.samples();
        let lons = grid.lon.samples();
        if lats.is_empty() || lons.is_empty() {
            return Err(RenderError::EmptyGrid);
        }

        let lookup: HashMap<(u64, u64), f64> = result
            .points()
            .map(|p| (key(p.lat(), p.lon()), p.value()))
            .collect();

        let mut values = Vec::with_capacity(lats.len() * lons.len());
        for &lat in &lats {
            for &lon in &lons {
                let v = lookup
                    .get(&key(lat, lon))
                    .copied()
                    .ok_or(RenderError::MissingCell { lat, lon })?;
                values.push(v);
            }
        }

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        Ok(Self {
            lats,
            lons,
            values,
            min,
            max,
        })
    }

    pub fn rows(&self) -> usize {
        self.lats.len()
    }

    pub fn cols(&self) -> usize {
        self.lons.len()
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows() || col >= self.cols() {
            return None;
        }
        self.values.get(row * self.cols() + col).copied()
    }

    /// Position of `v` within `[min, max]`, snapped to the centre of its band.
    /// A flat field sits at the midpoint.
    pub fn scale(&self, v: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 || !span.is_finite() {
            return 0.5;
        }
        let t = ((v - self.min) / span).clamp(0.0, 1.0);
        let band = ((t * BANDS as f64) as usize).min(BANDS - 1);
        (band as f64 + 0.5) / BANDS as f64
    }

    pub fn color_at(&self, row: usize, col: usize) -> Option<(u8, u8, u8)> {
        self.value(row, col).map(|v| diverging_color(self.scale(v)))
    }
}

/// Cool to warm diverging colour for `t` in `[0, 1]`.
pub fn diverging_color(t: f64) -> (u8, u8, u8) {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    if t < 0.5 {
        lerp(COOL, MID, t * 2.0)
    } else {
        lerp(MID, WARM, (t - 0.5) * 2.0)
    }
}

fn lerp(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}
