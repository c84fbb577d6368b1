use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Status string the service reports once a process has finished.
pub const STATUS_SUCCESS: &str = "success";

pub const LON_LIMIT: f64 = 180.0;
pub const LAT_LIMIT: f64 = 90.0;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

/// Reasons a coordinate pair cannot become a [`GeoPoint`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("longitude must be between -180 and 180 (got {0})")]
    Longitude(f64),
    #[error("latitude must be between -90 and 90 (got {0})")]
    Latitude(f64),
    #[error("value must be a finite number (got {0})")]
    Value(f64),
}

/// A measured value at a geographic position.
///
/// Serialized the way the kriging service expects a point geometry:
/// `{"type": "Point", "coordinates": [lon, lat], "properties": {"value": v}}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PointGeometry", into = "PointGeometry")]
pub struct GeoPoint {
    lon: f64,
    lat: f64,
    value: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64, value: f64) -> Result<Self, CoordinateError> {
        if !(-LON_LIMIT..=LON_LIMIT).contains(&lon) {
            return Err(CoordinateError::Longitude(lon));
        }
        if !(-LAT_LIMIT..=LAT_LIMIT).contains(&lat) {
            return Err(CoordinateError::Latitude(lat));
        }
        if !value.is_finite() {
            return Err(CoordinateError::Value(value));
        }
        Ok(Self { lon, lat, value })
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
enum PointTag {
    #[default]
    Point,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
enum FeatureTag {
    #[default]
    Feature,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
enum CollectionTag {
    #[default]
    FeatureCollection,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PointProperties {
    value: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PointGeometry {
    #[serde(rename = "type", default)]
    kind: PointTag,
    coordinates: [f64; 2],
    properties: PointProperties,
}

impl TryFrom<PointGeometry> for GeoPoint {
    type Error = CoordinateError;

    fn try_from(raw: PointGeometry) -> Result<Self, Self::Error> {
        let [lon, lat] = raw.coordinates;
        GeoPoint::new(lon, lat, raw.properties.value)
    }
}

impl From<GeoPoint> for PointGeometry {
    fn from(p: GeoPoint) -> Self {
        Self {
            kind: PointTag::Point,
            coordinates: [p.lon, p.lat],
            properties: PointProperties { value: p.value },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPointFeature {
    #[serde(rename = "type", default)]
    kind: FeatureTag,
    pub geometry: GeoPoint,
}

impl From<GeoPoint> for GeoPointFeature {
    fn from(geometry: GeoPoint) -> Self {
        Self {
            kind: FeatureTag::Feature,
            geometry,
        }
    }
}

/// Ordered point set, used both for job input and for interpolation results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPointFeatureCollection {
    #[serde(rename = "type", default)]
    kind: CollectionTag,
    pub features: Vec<GeoPointFeature>,
}

impl GeoPointFeatureCollection {
    pub fn from_points(points: impl IntoIterator<Item = GeoPoint>) -> Self {
        Self {
            kind: CollectionTag::FeatureCollection,
            features: points.into_iter().map(GeoPointFeature::from).collect(),
        }
    }

    pub fn points(&self) -> impl Iterator<Item = &GeoPoint> + '_ {
        self.features.iter().map(|f| &f.geometry)
    }

    pub fn values(&self) -> Vec<f64> {
        self.points().map(GeoPoint::value).collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// One axis of the sampling grid, the half-open range `[start, stop)` walked at `step`.
///
/// On the wire an axis is a three element array `[start, stop, step]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct GridAxis {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl GridAxis {
    pub fn new(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step }
    }

    /// Sample positions below `stop`, bit-for-bit as the service generates them.
    ///
    /// The count is `ceil((stop - start) / step)`. The first two samples are `start`
    /// and `start + step`; later ones are `start + i * delta` where
    /// `delta = (start + step) - start`, not `start + i * step`. Result coordinates
    /// are matched exactly, so the two must agree in the last bit.
    pub fn samples(&self) -> Vec<f64> {
        if !(self.step > 0.0) || !(self.stop > self.start) {
            return Vec::new();
        }
        let n = ((self.stop - self.start) / self.step).ceil() as usize;
        let second = self.start + self.step;
        let delta = second - self.start;
        (0..n)
            .map(|i| match i {
                0 => self.start,
                1 => second,
                _ => self.start + i as f64 * delta,
            })
            .collect()
    }
}

impl From<[f64; 3]> for GridAxis {
    fn from([start, stop, step]: [f64; 3]) -> Self {
        Self { start, stop, step }
    }
}

impl From<GridAxis> for [f64; 3] {
    fn from(a: GridAxis) -> Self {
        [a.start, a.stop, a.step]
    }
}

/// Latitude/longitude lattice the service evaluates the field on.
///
/// This is a plain carrier; range checks live in the grid editor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoGrid {
    pub lat: GridAxis,
    pub lon: GridAxis,
}

impl GeoGrid {
    pub fn cell_count(&self) -> usize {
        self.lat.samples().len() * self.lon.samples().len()
    }
}

impl fmt::Display for GeoGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lat {}..{} step {}, lon {}..{} step {}",
            self.lat.start, self.lat.stop, self.lat.step, self.lon.start, self.lon.stop, self.lon.step
        )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Variogram {
    Gaussian,
    Exponential,
    Spherical,
}

impl Variogram {
    pub const ALL: [Variogram; 3] = [
        Variogram::Gaussian,
        Variogram::Exponential,
        Variogram::Spherical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Variogram::Gaussian => "gaussian",
            Variogram::Exponential => "exponential",
            Variogram::Spherical => "spherical",
        }
    }
}

impl fmt::Display for Variogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum KrigingMethod {
    Simple,
    Ordinary,
    Universal,
}

impl KrigingMethod {
    pub const ALL: [KrigingMethod; 3] = [
        KrigingMethod::Simple,
        KrigingMethod::Ordinary,
        KrigingMethod::Universal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            KrigingMethod::Simple => "simple",
            KrigingMethod::Ordinary => "ordinary",
            KrigingMethod::Universal => "universal",
        }
    }
}

impl fmt::Display for KrigingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full description of a remote interpolation job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoKrigingJob {
    pub points_id: Uuid,
    pub grid: GeoGrid,
    pub vario: Variogram,
    pub kriging: KrigingMethod,
}

/// A finished job as shown by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedJob {
    pub process_id: Uuid,
    pub variogram: Variogram,
    pub method: KrigingMethod,
    pub grid: GeoGrid,
    pub result: GeoPointFeatureCollection,
}

/// Lifecycle of the orchestrator. Only one job is ever in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    InputsPending,
    Submitted(Uuid),
    Polling(Uuid),
    Resolving(Uuid),
    Rendered(Uuid),
}

impl JobState {
    /// A job is being created, polled or resolved; new work must wait.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            JobState::Submitted(_) | JobState::Polling(_) | JobState::Resolving(_)
        )
    }

    pub fn process_id(self) -> Option<Uuid> {
        match self {
            JobState::Idle | JobState::InputsPending => None,
            JobState::Submitted(id)
            | JobState::Polling(id)
            | JobState::Resolving(id)
            | JobState::Rendered(id) => Some(id),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::InputsPending => "inputs pending",
            JobState::Submitted(_) => "submitted",
            JobState::Polling(_) => "polling",
            JobState::Resolving(_) => "resolving",
            JobState::Rendered(_) => "rendered",
        }
    }
}

/// Events published by the orchestrator to presentation layers.
#[derive(Debug, Clone)]
pub enum JobEvent {
    StateChanged(JobState),
    PointsLoaded {
        path: PathBuf,
        count: usize,
    },
    JobSubmitted {
        process_id: Uuid,
    },
    /// A job found by identifier; carries its original inputs so the input side can echo them.
    JobResolved {
        process_id: Uuid,
        job: GeoKrigingJob,
        points: Box<GeoPointFeatureCollection>,
    },
    ResultReady(Box<RenderedJob>),
    Info(String),
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn point_rejects_out_of_range_coordinates() {
        assert_eq!(
            GeoPoint::new(180.5, 0.0, 1.0),
            Err(CoordinateError::Longitude(180.5))
        );
        assert_eq!(
            GeoPoint::new(-181.0, 0.0, 1.0),
            Err(CoordinateError::Longitude(-181.0))
        );
        assert_eq!(
            GeoPoint::new(0.0, 90.01, 1.0),
            Err(CoordinateError::Latitude(90.01))
        );
        assert!(GeoPoint::new(0.0, f64::NAN, 1.0).is_err());
        assert!(GeoPoint::new(180.0, -90.0, 1.0).is_ok());
    }

    #[test]
    fn point_rejects_non_finite_value() {
        assert!(matches!(
            GeoPoint::new(5.0, 47.0, f64::NAN),
            Err(CoordinateError::Value(v)) if v.is_nan()
        ));
        assert_eq!(
            GeoPoint::new(5.0, 47.0, f64::INFINITY),
            Err(CoordinateError::Value(f64::INFINITY))
        );
    }

    #[test]
    fn collection_matches_service_schema() {
        let c = GeoPointFeatureCollection::from_points([GeoPoint::new(5.0, 47.0, 1.2).unwrap()]);
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(
            v,
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {
                        "type": "Point",
                        "coordinates": [5.0, 47.0],
                        "properties": {"value": 1.2}
                    }
                }]
            })
        );
        let back: GeoPointFeatureCollection = serde_json::from_value(v).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn deserializing_invalid_point_fails() {
        let v = json!({
            "features": [{"geometry": {"coordinates": [200.0, 0.0], "properties": {"value": 0.0}}}]
        });
        let err = serde_json::from_value::<GeoPointFeatureCollection>(v).unwrap_err();
        assert!(err.to_string().contains("longitude"));
    }

    #[test]
    fn job_uses_service_field_names() {
        let job = GeoKrigingJob {
            points_id: Uuid::nil(),
            grid: GeoGrid {
                lat: GridAxis::new(47.0, 56.1, 0.1),
                lon: GridAxis::new(5.0, 16.1, 0.1),
            },
            vario: Variogram::Gaussian,
            kriging: KrigingMethod::Ordinary,
        };
        assert_eq!(
            serde_json::to_value(job).unwrap(),
            json!({
                "points_id": "00000000-0000-0000-0000-000000000000",
                "grid": {"lat": [47.0, 56.1, 0.1], "lon": [5.0, 16.1, 0.1]},
                "vario": "gaussian",
                "kriging": "ordinary"
            })
        );
    }

    #[test]
    fn axis_samples_are_half_open() {
        assert_eq!(GridAxis::new(0.0, 1.0, 0.5).samples(), vec![0.0, 0.5]);
        assert_eq!(GridAxis::new(0.0, 1.1, 0.5).samples(), vec![0.0, 0.5, 1.0]);
        assert!(GridAxis::new(1.0, 1.0, 0.5).samples().is_empty());
        assert_eq!(GridAxis::new(-1.0, 1.0, 0.25).samples().len(), 8);
    }

    #[test]
    fn decimal_steps_follow_the_service_fill_rule() {
        let lat = GridAxis::new(47.0, 56.1, 0.1).samples();
        assert_eq!(lat.len(), 92);
        assert_eq!(lat[0], 47.0);
        assert_eq!(lat[1], 47.1);
        assert_eq!(lat[90], 56.00000000000013);

        let lon = GridAxis::new(5.0, 16.1, 0.1).samples();
        assert_eq!(lon.len(), 112);
        assert_eq!(lon[2], 5.199999999999999);
        assert_ne!(lon[2], 5.0 + 2.0 * 0.1);
        assert_eq!(lon[111], 16.09999999999996);
    }

    #[test]
    fn busy_states() {
        let id = Uuid::nil();
        assert!(!JobState::Idle.is_busy());
        assert!(!JobState::Rendered(id).is_busy());
        assert!(JobState::Polling(id).is_busy());
        assert!(JobState::Submitted(id).is_busy());
        assert!(JobState::Resolving(id).is_busy());
    }
}
