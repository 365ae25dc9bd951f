use crate::client::Tracking;
use crate::indicator::CoordinatorMetrics;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shape of a request burst against the recipe API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Total operations to issue
    pub operations: usize,
    /// Maximum operations in flight at once
    pub concurrency: usize,
    /// Gap between consecutive launches
    #[serde(with = "humantime_serde")]
    pub stagger: Duration,
    /// API paths cycled through, relative to the base URL
    pub endpoints: Vec<String>,
    /// Every n-th operation bypasses the indicator; 0 disables
    pub silent_every: usize,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            operations: 24,
            concurrency: 6,
            stagger: Duration::from_millis(40),
            endpoints: vec![
                "/api/recipes".to_string(),
                "/api/recipes/summary".to_string(),
                "/api/materials".to_string(),
                "/api/furnaces".to_string(),
            ],
            silent_every: 0,
        }
    }
}

/// One request the workload driver issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: usize,
    pub path: String,
    pub tracking: Tracking,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub id: usize,
    pub path: String,
    pub tracking: Tracking,
    pub ok: bool,
    pub elapsed_ms: u64,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkloadEvent {
    OperationStarted {
        id: usize,
        path: String,
        tracking: Tracking,
    },
    OperationFinished(OperationOutcome),
    Info(InfoEvent),
    RunCompleted {
        // Box to keep WorkloadEvent small; the report is large.
        report: Box<SessionReport>,
    },
}

/// Structured info events emitted by the driver and consumed by UI/CLI layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    Message(String),
    Cancelling { in_flight: usize },
    Settling,
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::Cancelling { in_flight } => {
                format!("Cancelling {} in-flight operation(s)…", in_flight)
            }
            InfoEvent::Settling => "Waiting for the indicator to settle…".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub samples: u64,
    pub min_ms: Option<u64>,
    pub mean_ms: Option<f64>,
    pub p50_ms: Option<u64>,
    pub p90_ms: Option<u64>,
    pub p99_ms: Option<u64>,
    pub max_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    #[serde(default)]
    pub timestamp_utc: String,
    /// Base URL, or "simulated"
    pub target: String,
    pub planned: usize,
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub silent: usize,
    pub cancelled: bool,
    pub latency: LatencySummary,
    pub indicator: CoordinatorMetrics,
}
