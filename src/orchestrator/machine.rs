//! Job lifecycle state machine.
//!
//! Owns the loaded points, the active process id and the displayed result. Every
//! failure is reported as a [`JobEvent::Failed`] message and leaves the machine in
//! the stable state it was in before the attempt.

use crate::error::{InputError, JobError, Selection, ServiceError};
use crate::grid::GridForm;
use crate::ingest;
use crate::model::{
    GeoGrid, GeoPointFeatureCollection, JobEvent, JobState, KrigingMethod, RenderedJob, Variogram,
    STATUS_SUCCESS,
};
use crate::service::KrigingApi;
use std::path::Path;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Input-side selections at the moment the user asks for a new job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitRequest {
    pub variogram: Option<Variogram>,
    pub method: Option<KrigingMethod>,
    pub grid: GridForm,
}

/// Parameters of the job being polled.
#[derive(Debug, Clone, Copy)]
struct ActiveJob {
    process_id: Uuid,
    variogram: Variogram,
    method: KrigingMethod,
    grid: GeoGrid,
    /// State to fall back to if polling fails.
    fallback: JobState,
}

pub(crate) struct Orchestrator<A> {
    api: A,
    event_tx: UnboundedSender<JobEvent>,
    state: JobState,
    points: Option<GeoPointFeatureCollection>,
    active: Option<ActiveJob>,
    rendered: Option<RenderedJob>,
}

impl<A: KrigingApi> Orchestrator<A> {
    pub fn new(api: A, event_tx: UnboundedSender<JobEvent>) -> Self {
        Self {
            api,
            event_tx,
            state: JobState::Idle,
            points: None,
            active: None,
            rendered: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_polling(&self) -> bool {
        matches!(self.state, JobState::Polling(_))
    }

    #[cfg(test)]
    pub fn points(&self) -> Option<&GeoPointFeatureCollection> {
        self.points.as_ref()
    }

    pub fn rendered(&self) -> Option<&RenderedJob> {
        self.rendered.as_ref()
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Replace the input points with the contents of a file.
    pub fn load_points(&mut self, path: &Path) {
        match ingest::read_points_file(path) {
            Ok(points) => {
                let count = points.len();
                self.points = Some(points);
                self.emit(JobEvent::PointsLoaded {
                    path: path.to_path_buf(),
                    count,
                });
                if !self.state.is_busy() {
                    self.set_state(JobState::InputsPending);
                }
            }
            Err(e) => self.report(e.into()),
        }
    }

    /// Save the points, create a process and start polling it.
    pub async fn submit(&mut self, request: SubmitRequest) {
        if let Err(e) = self.try_submit(request).await {
            self.report(e);
        }
    }

    async fn try_submit(&mut self, request: SubmitRequest) -> Result<(), JobError> {
        if self.state.is_busy() {
            return Err(JobError::Busy);
        }
        let variogram = request
            .variogram
            .ok_or(InputError::MissingSelection(Selection::Variogram))?;
        let method = request
            .method
            .ok_or(InputError::MissingSelection(Selection::Method))?;
        let points = self
            .points
            .as_ref()
            .filter(|p| !p.is_empty())
            .ok_or(InputError::MissingSelection(Selection::Points))?;
        let grid = request.grid.validate()?;

        let points_id = self.api.save_points(points).await?;
        info!(%points_id, "points saved");
        let process_id = self
            .api
            .create_process(points_id, &grid, variogram, method)
            .await?;
        info!(%process_id, %variogram, %method, "process created");

        self.active = Some(ActiveJob {
            process_id,
            variogram,
            method,
            grid,
            fallback: self.state,
        });
        self.set_state(JobState::Submitted(process_id));
        self.emit(JobEvent::JobSubmitted { process_id });
        self.set_state(JobState::Polling(process_id));
        Ok(())
    }

    /// One poll of the active process. Does nothing unless polling.
    ///
    /// A pending status changes nothing; `"success"` fetches the result once and
    /// publishes it.
    pub async fn poll(&mut self) {
        let Some(job) = self.active else {
            return;
        };
        if self.state != JobState::Polling(job.process_id) {
            return;
        }
        match self.poll_once(job).await {
            Ok(None) => {}
            Ok(Some(result)) => {
                self.active = None;
                self.publish(RenderedJob {
                    process_id: job.process_id,
                    variogram: job.variogram,
                    method: job.method,
                    grid: job.grid,
                    result,
                });
            }
            Err(e) => {
                self.active = None;
                self.set_state(job.fallback);
                self.report(e);
                self.emit(JobEvent::Info(format!(
                    "Polling stopped; search for {} to resume",
                    job.process_id
                )));
            }
        }
    }

    async fn poll_once(
        &self,
        job: ActiveJob,
    ) -> Result<Option<GeoPointFeatureCollection>, JobError> {
        let status = self.api.get_process_status(job.process_id).await?;
        if status != STATUS_SUCCESS {
            debug!(process_id = %job.process_id, %status, "process still running");
            return Ok(None);
        }
        let result = self.api.get_process_result(job.process_id).await?;
        Ok(Some(result))
    }

    /// Resolve an existing job by identifier and show it.
    pub async fn search(&mut self, text: &str) {
        if self.state.is_busy() {
            self.report(JobError::Busy);
            return;
        }
        let prior = self.state;
        let process_id = match parse_identifier(text) {
            Ok(id) => id,
            Err(e) => {
                self.report(e.into());
                return;
            }
        };
        self.set_state(JobState::Resolving(process_id));
        match self.try_resolve(process_id).await {
            Ok(()) => {}
            Err(JobError::NotFinished(id)) => {
                self.set_state(prior);
                self.emit(JobEvent::Info(
                    JobError::NotFinished(id).user_message(),
                ));
            }
            Err(e) => {
                self.set_state(prior);
                self.report(e);
            }
        }
    }

    async fn try_resolve(&mut self, process_id: Uuid) -> Result<(), JobError> {
        let not_found = |e: ServiceError| match e {
            ServiceError::NotFound => JobError::JobNotFound(process_id),
            other => JobError::Service(other),
        };

        let status = self
            .api
            .get_process_status(process_id)
            .await
            .map_err(not_found)?;
        if status != STATUS_SUCCESS {
            return Err(JobError::NotFinished(process_id));
        }
        let job = self
            .api
            .get_process_data(process_id)
            .await
            .map_err(not_found)?;
        let result = self
            .api
            .get_process_result(process_id)
            .await
            .map_err(not_found)?;
        let points = self
            .api
            .get_points(job.points_id)
            .await
            .map_err(not_found)?;
        info!(%process_id, points = points.len(), "job resolved");

        self.points = Some(points.clone());
        self.emit(JobEvent::JobResolved {
            process_id,
            job,
            points: Box::new(points),
        });
        self.publish(RenderedJob {
            process_id,
            variogram: job.vario,
            method: job.kriging,
            grid: job.grid,
            result,
        });
        Ok(())
    }

    fn publish(&mut self, rendered: RenderedJob) {
        let process_id = rendered.process_id;
        self.rendered = Some(rendered.clone());
        self.set_state(JobState::Rendered(process_id));
        self.emit(JobEvent::ResultReady(Box::new(rendered)));
    }

    fn set_state(&mut self, next: JobState) {
        if self.state != next {
            info!(from = self.state.label(), to = next.label(), "job state");
            self.state = next;
            self.emit(JobEvent::StateChanged(next));
        }
    }

    fn report(&self, e: JobError) {
        warn!(error = %e, "job operation failed");
        self.emit(JobEvent::Failed(e.user_message()));
    }

    fn emit(&self, ev: JobEvent) {
        let _ = self.event_tx.send(ev);
    }
}

/// Parse a user-typed job identifier; embedded spaces are ignored.
pub fn parse_identifier(text: &str) -> Result<Uuid, InputError> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    Uuid::parse_str(&compact).map_err(|_| InputError::InvalidIdentifier(text.trim().to_string()))
}
