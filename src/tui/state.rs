use crate::grid::GridForm;
use crate::model::{JobEvent, JobState, KrigingMethod, RenderedJob, Variogram};
use crate::orchestrator::SubmitRequest;
use crate::render::Heatmap;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Focusable input widgets, in Tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Variogram,
    Method,
    LatStart,
    LatStop,
    LatStep,
    LonStart,
    LonStop,
    LonStep,
    PointsPath,
    Search,
}

impl Focus {
    const ORDER: [Focus; 10] = [
        Focus::Variogram,
        Focus::Method,
        Focus::LatStart,
        Focus::LatStop,
        Focus::LatStep,
        Focus::LonStart,
        Focus::LonStop,
        Focus::LonStep,
        Focus::PointsPath,
        Focus::Search,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let n = Self::ORDER.len();
        Self::ORDER[(self.index() + n - 1) % n]
    }

    pub fn is_selector(self) -> bool {
        matches!(self, Focus::Variogram | Focus::Method)
    }
}

pub struct UiState {
    pub focus: Focus,
    pub show_help: bool,
    pub info: String,
    pub info_is_error: bool,

    pub variogram: Option<Variogram>,
    pub method: Option<KrigingMethod>,
    pub grid: GridForm,
    pub points_path: String,
    pub points_count: Option<usize>,
    pub search: String,

    pub job_state: JobState,
    pub rendered: Option<RenderedJob>,
    pub heatmap: Option<Heatmap>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            focus: Focus::Variogram,
            show_help: false,
            info: "Load a points file, pick the parameters and press Ctrl-S".into(),
            info_is_error: false,
            variogram: None,
            method: None,
            grid: GridForm::default(),
            points_path: String::new(),
            points_count: None,
            search: String::new(),
            job_state: JobState::Idle,
            rendered: None,
            heatmap: None,
        }
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: Option<T>, forward: bool) -> Option<T> {
    let n = all.len();
    if n == 0 {
        return None;
    }
    let next = match current.and_then(|c| all.iter().position(|x| *x == c)) {
        None if forward => 0,
        None => n - 1,
        Some(i) if forward => (i + 1) % n,
        Some(i) => (i + n - 1) % n,
    };
    Some(all[next])
}

impl UiState {
    pub fn set_info(&mut self, msg: impl Into<String>) {
        self.info = msg.into();
        self.info_is_error = false;
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.info = msg.into();
        self.info_is_error = true;
    }

    /// Submission is disabled while a job is in flight.
    pub fn submit_enabled(&self) -> bool {
        !self.job_state.is_busy()
    }

    pub fn submit_request(&self) -> SubmitRequest {
        SubmitRequest {
            variogram: self.variogram,
            method: self.method,
            grid: self.grid.clone(),
        }
    }

    /// Process id worth copying: the job in flight, else the one on screen.
    pub fn current_process_id(&self) -> Option<uuid::Uuid> {
        self.job_state
            .process_id()
            .or_else(|| self.rendered.as_ref().map(|r| r.process_id))
    }

    /// Text buffer behind the focused field, if it is a text field.
    pub fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::Variogram | Focus::Method => None,
            Focus::LatStart => Some(&mut self.grid.lat[0]),
            Focus::LatStop => Some(&mut self.grid.lat[1]),
            Focus::LatStep => Some(&mut self.grid.lat[2]),
            Focus::LonStart => Some(&mut self.grid.lon[0]),
            Focus::LonStop => Some(&mut self.grid.lon[1]),
            Focus::LonStep => Some(&mut self.grid.lon[2]),
            Focus::PointsPath => Some(&mut self.points_path),
            Focus::Search => Some(&mut self.search),
        }
    }

    pub fn cycle_selector(&mut self, forward: bool) {
        match self.focus {
            Focus::Variogram => self.variogram = cycle(&Variogram::ALL, self.variogram, forward),
            Focus::Method => self.method = cycle(&KrigingMethod::ALL, self.method, forward),
            _ => {}
        }
    }

    /// Apply an orchestrator event. Results are handled by the caller, which also
    /// owns exports.
    pub fn apply_event(&mut self, ev: JobEvent) {
        match ev {
            JobEvent::StateChanged(s) => {
                self.job_state = s;
                match s {
                    JobState::Submitted(id) => self.set_info(format!("Submitted job {id}")),
                    JobState::Polling(id) => self.set_info(format!("Waiting for job {id}…")),
                    JobState::Resolving(id) => self.set_info(format!("Looking up job {id}…")),
                    _ => {}
                }
            }
            JobEvent::PointsLoaded { path, count } => {
                self.points_count = Some(count);
                self.set_info(format!("Loaded {count} points from {}", path.display()));
            }
            JobEvent::JobSubmitted { process_id } => {
                self.search = process_id.to_string();
            }
            JobEvent::JobResolved {
                process_id,
                job,
                points,
            } => {
                self.variogram = Some(job.vario);
                self.method = Some(job.kriging);
                self.grid.set_grid(&job.grid);
                self.points_count = Some(points.len());
                self.points_path.clear();
                self.search = process_id.to_string();
            }
            JobEvent::ResultReady(job) => {
                self.set_info(format!("Job {} finished", job.process_id));
                self.rendered = Some(*job);
            }
            JobEvent::Info(msg) => self.set_info(msg),
            JobEvent::Failed(msg) => self.set_error(msg),
        }
    }

    pub fn status_line(&self) -> Line<'static> {
        let state_style = if self.job_state.is_busy() {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Green)
        };
        let info_style = if self.info_is_error {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::styled(format!("[{}] ", self.job_state.label()), state_style),
            Span::styled(self.info.clone(), info_style),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GeoGrid, GeoKrigingJob, GeoPointFeatureCollection, GridAxis};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    #[test]
    fn focus_wraps_both_ways() {
        assert_eq!(Focus::Search.next(), Focus::Variogram);
        assert_eq!(Focus::Variogram.prev(), Focus::Search);
        assert_eq!(Focus::LatStep.next(), Focus::LonStart);
    }

    #[test]
    fn selectors_cycle_from_unset() {
        let mut s = UiState::default();
        s.cycle_selector(true);
        assert_eq!(s.variogram, Some(Variogram::Gaussian));
        s.cycle_selector(false);
        assert_eq!(s.variogram, Some(Variogram::Spherical));
        s.focus = Focus::Method;
        s.cycle_selector(false);
        assert_eq!(s.method, Some(KrigingMethod::Universal));
        s.focus = Focus::LatStart;
        s.cycle_selector(true);
        assert_eq!(s.method, Some(KrigingMethod::Universal));
    }

    #[test]
    fn text_fields_map_to_grid_cells() {
        let mut s = UiState::default();
        s.focus = Focus::LonStep;
        s.focused_text_mut().unwrap().push_str("0,5");
        assert_eq!(s.grid.lon[2], "0,5");
        s.focus = Focus::Method;
        assert!(s.focused_text_mut().is_none());
    }

    #[test]
    fn busy_state_disables_submit() {
        let mut s = UiState::default();
        assert!(s.submit_enabled());
        s.apply_event(JobEvent::StateChanged(JobState::Polling(Uuid::nil())));
        assert!(!s.submit_enabled());
        assert_eq!(s.current_process_id(), Some(Uuid::nil()));
        s.apply_event(JobEvent::StateChanged(JobState::InputsPending));
        assert!(s.submit_enabled());
    }

    #[test]
    fn resolved_job_echoes_inputs() {
        let mut s = UiState::default();
        let grid = GeoGrid {
            lat: GridAxis::new(47.0, 56.1, 0.1),
            lon: GridAxis::new(5.0, 16.1, 0.1),
        };
        let id = Uuid::new_v4();
        s.apply_event(JobEvent::JobResolved {
            process_id: id,
            job: GeoKrigingJob {
                points_id: Uuid::new_v4(),
                grid,
                vario: Variogram::Exponential,
                kriging: KrigingMethod::Simple,
            },
            points: Box::new(GeoPointFeatureCollection::default()),
        });
        assert_eq!(s.variogram, Some(Variogram::Exponential));
        assert_eq!(s.method, Some(KrigingMethod::Simple));
        assert_eq!(s.grid.validate().unwrap(), grid);
        assert_eq!(s.points_count, Some(0));
        assert_eq!(s.search, id.to_string());
    }

    #[test]
    fn failures_are_flagged_as_errors() {
        let mut s = UiState::default();
        s.apply_event(JobEvent::Failed("Variogram not selected".into()));
        assert!(s.info_is_error);
        s.apply_event(JobEvent::Info("ok".into()));
        assert!(!s.info_is_error);
    }
}
