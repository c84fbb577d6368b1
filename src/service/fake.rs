//! Scripted in-memory [`KrigingApi`] for orchestrator tests.

use super::KrigingApi;
use crate::error::ServiceError;
use crate::model::{GeoGrid, GeoKrigingJob, GeoPointFeatureCollection, KrigingMethod, Variogram};
use std::collections::VecDeque;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Call {
    SavePoints,
    GetPoints,
    CreateProcess,
    Status,
    Result,
    Data,
}

#[derive(Default)]
struct Script {
    calls: Vec<Call>,
    saved: Option<GeoPointFeatureCollection>,
    points_id: Option<Result<Uuid, ServiceError>>,
    process_id: Option<Result<Uuid, ServiceError>>,
    statuses: VecDeque<Result<String, ServiceError>>,
    result: Option<Result<GeoPointFeatureCollection, ServiceError>>,
    data: Option<Result<GeoKrigingJob, ServiceError>>,
    points: Option<Result<GeoPointFeatureCollection, ServiceError>>,
}

/// Answers come from the script; anything unscripted is an internal error.
/// The last scripted status repeats once the queue has a single entry left.
#[derive(Default)]
pub(crate) struct FakeApi {
    script: Mutex<Script>,
}

fn unscripted<T>(what: &str) -> Result<T, ServiceError> {
    Err(ServiceError::Internal(format!("unscripted call: {what}")))
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_points_id(self, r: Result<Uuid, ServiceError>) -> Self {
        self.script.lock().unwrap().points_id = Some(r);
        self
    }

    pub fn with_process_id(self, r: Result<Uuid, ServiceError>) -> Self {
        self.script.lock().unwrap().process_id = Some(r);
        self
    }

    pub fn with_statuses<I>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = Result<String, ServiceError>>,
    {
        self.script.lock().unwrap().statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_result(self, r: Result<GeoPointFeatureCollection, ServiceError>) -> Self {
        self.script.lock().unwrap().result = Some(r);
        self
    }

    pub fn with_data(self, r: Result<GeoKrigingJob, ServiceError>) -> Self {
        self.script.lock().unwrap().data = Some(r);
        self
    }

    pub fn with_points(self, r: Result<GeoPointFeatureCollection, ServiceError>) -> Self {
        self.script.lock().unwrap().points = Some(r);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls().into_iter().filter(|c| *c == call).count()
    }

    pub fn saved(&self) -> Option<GeoPointFeatureCollection> {
        self.script.lock().unwrap().saved.clone()
    }

    fn record(&self, call: Call) -> std::sync::MutexGuard<'_, Script> {
        let mut s = self.script.lock().unwrap();
        s.calls.push(call);
        s
    }
}

impl KrigingApi for FakeApi {
    async fn save_points(&self, points: &GeoPointFeatureCollection) -> Result<Uuid, ServiceError> {
        let mut s = self.record(Call::SavePoints);
        s.saved = Some(points.clone());
        s.points_id.clone().unwrap_or_else(|| unscripted("save_points"))
    }

    async fn get_points(&self, _points_id: Uuid) -> Result<GeoPointFeatureCollection, ServiceError> {
        let s = self.record(Call::GetPoints);
        s.points.clone().unwrap_or_else(|| unscripted("get_points"))
    }

    async fn create_process(
        &self,
        _points_id: Uuid,
        _grid: &GeoGrid,
        _variogram: Variogram,
        _method: KrigingMethod,
    ) -> Result<Uuid, ServiceError> {
        let s = self.record(Call::CreateProcess);
        s.process_id.clone().unwrap_or_else(|| unscripted("create_process"))
    }

    async fn get_process_status(&self, _process_id: Uuid) -> Result<String, ServiceError> {
        let mut s = self.record(Call::Status);
        if s.statuses.len() > 1 {
            s.statuses.pop_front().unwrap_or_else(|| unscripted("status"))
        } else {
            s.statuses.front().cloned().unwrap_or_else(|| unscripted("status"))
        }
    }

    async fn get_process_result(
        &self,
        _process_id: Uuid,
    ) -> Result<GeoPointFeatureCollection, ServiceError> {
        let s = self.record(Call::Result);
        s.result.clone().unwrap_or_else(|| unscripted("result"))
    }

    async fn get_process_data(&self, _process_id: Uuid) -> Result<GeoKrigingJob, ServiceError> {
        let s = self.record(Call::Data);
        s.data.clone().unwrap_or_else(|| unscripted("data"))
    }
}
