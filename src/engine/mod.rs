mod simulated;

pub use simulated::{SimulatedBackend, SimulationConfig};

use crate::client::{RecipeClient, Tracking};
use crate::model::{Operation, OperationOutcome, WorkloadConfig};
use anyhow::Result;
use std::time::Duration;
use tokio::time::Instant;

/// Where operations are sent.
#[derive(Debug, Clone)]
pub enum Backend {
    /// Real requests against the recipe API
    Http(RecipeClient),
    /// Timed sleeps, for demos and offline runs
    Simulated(SimulatedBackend),
}

impl Backend {
    /// Short label for reports.
    pub fn target(&self) -> String {
        match self {
            Backend::Http(client) => client.base_url().to_string(),
            Backend::Simulated(_) => "simulated".to_string(),
        }
    }

    /// Run one operation. Failures are reported in the outcome, never propagated.
    pub async fn perform(&self, op: &Operation) -> OperationOutcome {
        let start = Instant::now();
        let res: Result<()> = match self {
            Backend::Http(client) => client
                .get_json::<serde_json::Value>(&op.path, op.tracking)
                .await
                .map(|_| ())
                .map_err(anyhow::Error::from),
            Backend::Simulated(sim) => sim.perform(op).await,
        };
        OperationOutcome {
            id: op.id,
            path: op.path.clone(),
            tracking: op.tracking,
            ok: res.is_ok(),
            elapsed_ms: millis(start.elapsed()),
            error: res.err().map(|e| format!("{e:#}")),
        }
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Expand a workload into concrete operations, cycling through its endpoints.
pub fn plan_operations(workload: &WorkloadConfig) -> Vec<Operation> {
    if workload.endpoints.is_empty() {
        return Vec::new();
    }
    (0..workload.operations)
        .map(|id| {
            let silent = workload.silent_every > 0 && (id + 1) % workload.silent_every == 0;
            Operation {
                id,
                path: workload.endpoints[id % workload.endpoints.len()].clone(),
                tracking: if silent {
                    Tracking::Silent
                } else {
                    Tracking::Indicator
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_cycles_endpoints() {
        let workload = WorkloadConfig {
            operations: 5,
            endpoints: vec!["/a".into(), "/b".into()],
            ..Default::default()
        };
        let plan = plan_operations(&workload);
        let paths: Vec<&str> = plan.iter().map(|op| op.path.as_str()).collect();
        assert_eq!(paths, ["/a", "/b", "/a", "/b", "/a"]);
        assert!(plan.iter().all(|op| op.tracking == Tracking::Indicator));
    }

    #[test]
    fn test_plan_marks_silent_operations() {
        let workload = WorkloadConfig {
            operations: 6,
            silent_every: 3,
            ..Default::default()
        };
        let silent: Vec<usize> = plan_operations(&workload)
            .into_iter()
            .filter(|op| op.tracking == Tracking::Silent)
            .map(|op| op.id)
            .collect();
        assert_eq!(silent, [2, 5]);
    }

    #[test]
    fn test_millis_saturates() {
        assert_eq!(millis(Duration::from_micros(2_500)), 2);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_plan_without_endpoints_is_empty() {
        let workload = WorkloadConfig {
            endpoints: Vec::new(),
            ..Default::default()
        };
        assert!(plan_operations(&workload).is_empty());
    }
}
