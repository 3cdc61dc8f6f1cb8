//! Extraction task records.
//!
//! A task's payload depends on where it is in its lifecycle, so the state is
//! a tagged enum rather than one struct full of optional fields: a pending
//! task cannot carry an error, and a failed task always does.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filter::Filterable;

/// Lifecycle state of a task, tagged by the upstream `status` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum TaskState {
    #[serde(rename = "PENDING")]
    Pending,

    #[serde(rename = "PROCESSING")]
    Processing {
        /// Completion fraction in [0, 1]
        #[serde(default)]
        progress: f64,
    },

    #[serde(rename = "SUCCESS")]
    Completed {
        #[serde(default)]
        completed_at: Option<DateTime<Utc>>,
        #[serde(default)]
        records_extracted: u64,
    },

    #[serde(rename = "FAILURE")]
    Failed { error: String },
}

impl TaskState {
    /// Status label as served upstream.
    pub fn label(&self) -> &'static str {
        match self {
            TaskState::Pending => "PENDING",
            TaskState::Processing { .. } => "PROCESSING",
            TaskState::Completed { .. } => "SUCCESS",
            TaskState::Failed { .. } => "FAILURE",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed { .. } | TaskState::Failed { .. })
    }
}

/// One background task as listed by the task monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub task_type: String,
    #[serde(default)]
    pub property_code: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub state: TaskState,
}

impl Task {
    pub fn new(task_id: impl Into<String>, task_type: impl Into<String>, state: TaskState) -> Self {
        Self {
            task_id: task_id.into(),
            name: None,
            task_type: task_type.into(),
            property_code: None,
            created_at: None,
            state,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_property(mut self, property_code: impl Into<String>) -> Self {
        self.property_code = Some(property_code.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

impl Filterable for Task {
    fn record_type(&self) -> Option<&str> {
        Some(&self.task_type)
    }

    fn status(&self) -> Option<&str> {
        Some(self.state.label())
    }

    fn property(&self) -> Option<&str> {
        self.property_code.as_deref()
    }

    fn id(&self) -> &str {
        &self.task_id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn timestamp(&self) -> Option<NaiveDateTime> {
        self.created_at.map(|at| at.naive_utc())
    }
}
