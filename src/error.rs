//! Error types shared by ingestion, the grid editor, the service client and the orchestrator.
//!
//! Everything is a closed enum with structured fields. Conversion to the text shown
//! to the user happens once, in [`JobError::user_message`].

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    /// Geographic bound on either side of zero.
    pub fn limit(self) -> f64 {
        match self {
            Axis::Latitude => crate::model::LAT_LIMIT,
            Axis::Longitude => crate::model::LON_LIMIT,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::Latitude => "latitude",
            Axis::Longitude => "longitude",
        })
    }
}

/// Inputs that must be chosen before a job can be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Variogram,
    Method,
    Points,
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Selection::Variogram => "variogram",
            Selection::Method => "kriging method",
            Selection::Points => "points file",
        })
    }
}

/// Problems with local input, detected before any request is made.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("point {index}: {message}")]
    Validation { index: usize, message: String },
    #[error("{0}")]
    Format(String),
    #[error("enter all {0} values")]
    MissingField(Axis),
    #[error("invalid {0} values")]
    Range(Axis),
    #[error("{0} not selected")]
    MissingSelection(Selection),
    #[error("invalid job identifier {0:?}")]
    InvalidIdentifier(String),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One entry of the `detail` list in a 422 response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldIssue {
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    pub msg: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loc = self
            .loc
            .iter()
            .map(|part| match part {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".");
        if loc.is_empty() {
            f.write_str(&self.msg)
        } else {
            write!(f, "{loc}: {}", self.msg)
        }
    }
}

/// Outcome of a failed call to the kriging service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("internal error: {0}")]
    Internal(String),
    #[error("requested object not found")]
    NotFound,
    #[error("incorrect input data: {}", join_issues(.0))]
    IncorrectData(Vec<FieldIssue>),
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Everything the orchestrator can fail with.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("a job is already running")]
    Busy,
    #[error("job {0} not finished")]
    NotFinished(Uuid),
    #[error("job {0} not found")]
    JobNotFound(Uuid),
}

impl JobError {
    /// Text for the status line.
    pub fn user_message(&self) -> String {
        match self {
            JobError::Input(InputError::Validation { index, message }) => {
                format!("Invalid point at index {index}: {message}")
            }
            JobError::Input(InputError::MissingSelection(sel)) => {
                format!("{} not selected", capitalize(&sel.to_string()))
            }
            JobError::Input(e) => capitalize(&e.to_string()),
            JobError::Service(ServiceError::Internal(_)) => {
                "Internal error while talking to the kriging service".into()
            }
            JobError::Service(ServiceError::NotFound) => "Requested object not found".into(),
            JobError::Service(ServiceError::IncorrectData(issues)) => {
                format!("Incorrect input data: {}", join_issues(issues))
            }
            JobError::Busy => "A job is already running; wait for it to finish".into(),
            JobError::NotFinished(id) => format!("Job {id} not finished yet"),
            JobError::JobNotFound(id) => format!("Job {id} not found"),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_issue_formats_location() {
        let issue: FieldIssue = serde_json::from_value(json!({
            "loc": ["body", "grid", "lat", 2],
            "msg": "value is not a valid float"
        }))
        .unwrap();
        assert_eq!(issue.to_string(), "body.grid.lat.2: value is not a valid float");
    }

    #[test]
    fn user_messages_name_the_missing_input() {
        let e = JobError::from(InputError::MissingSelection(Selection::Variogram));
        assert_eq!(e.user_message(), "Variogram not selected");
        let e = JobError::from(InputError::Range(Axis::Longitude));
        assert_eq!(e.user_message(), "Invalid longitude values");
    }

    #[test]
    fn internal_detail_stays_out_of_user_message() {
        let e = JobError::from(ServiceError::Internal("connection refused".into()));
        assert!(!e.user_message().contains("refused"));
        assert!(e.to_string().contains("refused"));
    }
}
