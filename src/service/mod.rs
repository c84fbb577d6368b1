//! Access to the remote kriging service.
//!
//! [`KrigingApi`] is the seam the orchestrator is written against; [`KrigingClient`]
//! is the HTTP implementation.

mod client;
#[cfg(test)]
pub(crate) mod fake;

use crate::error::ServiceError;
use crate::model::{GeoGrid, GeoKrigingJob, GeoPointFeatureCollection, KrigingMethod, Variogram};
use uuid::Uuid;

pub(crate) use client::KrigingClient;

/// One call per remote capability. Calls are not retried.
pub(crate) trait KrigingApi {
    async fn save_points(&self, points: &GeoPointFeatureCollection) -> Result<Uuid, ServiceError>;

    async fn get_points(&self, points_id: Uuid) -> Result<GeoPointFeatureCollection, ServiceError>;

    async fn create_process(
        &self,
        points_id: Uuid,
        grid: &GeoGrid,
        variogram: Variogram,
        method: KrigingMethod,
    ) -> Result<Uuid, ServiceError>;

    /// Raw status string; `"success"` is the only terminal value.
    async fn get_process_status(&self, process_id: Uuid) -> Result<String, ServiceError>;

    async fn get_process_result(
        &self,
        process_id: Uuid,
    ) -> Result<GeoPointFeatureCollection, ServiceError>;

    async fn get_process_data(&self, process_id: Uuid) -> Result<GeoKrigingJob, ServiceError>;
}
