//! Graph build cycle: concurrent population, edge inference, persistence.

mod lock;
mod orchestrator;

pub use lock::{
    cleanup_pid_file, inspect_pid_file, is_process_running, terminate, BuildLock, LockError,
    PidStatus,
};
pub use orchestrator::GraphBuildOrchestrator;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::knowledge::{GraphStats, InferenceStats, KnowledgeError};
use crate::plugins::PopulateError;

/// Errors that fail a whole build. Nothing is persisted after any of these.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Populator failed: {0}")]
    Populator(#[from] PopulateError),

    #[error("Populator '{plugin}' panicked: {message}")]
    PopulatorPanicked { plugin: String, message: String },

    #[error("Build exceeded timeout of {0:?}")]
    Timeout(Duration),

    #[error("Build cancelled")]
    Cancelled,

    #[error("Failed to persist graph: {0}")]
    Persist(#[source] KnowledgeError),
}

/// Outcome of one successful build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub build_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// Names of the populators that ran.
    pub populators: Vec<String>,
    pub inference: InferenceStats,
    pub stats: GraphStats,
}
