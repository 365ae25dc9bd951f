//! Workload controller.
//!
//! Launches staggered, overlapping operations, relays their progress to the
//! presentation layers, and handles quit requests by aborting whatever is still in
//! flight.

use crate::engine::{plan_operations, Backend};
use crate::indicator::VisibilityCoordinator;
use crate::model::{InfoEvent, Operation, OperationOutcome, WorkloadConfig, WorkloadEvent};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{info, warn};

/// Commands emitted by UI layers to control the running workload.
#[derive(Debug, Clone)]
pub enum UiCommand {
    Quit,
}

/// What a finished (or cancelled) workload produced.
#[derive(Debug, Clone)]
pub struct WorkloadRun {
    pub planned: usize,
    pub outcomes: Vec<OperationOutcome>,
    pub cancelled: bool,
}

/// Drive a workload to completion and emit events back to presentation layers.
///
/// Returns once every operation has finished or been aborted and the indicator has
/// gone back to hidden.
pub async fn run_workload(
    backend: Arc<Backend>,
    indicator: &VisibilityCoordinator,
    workload: &WorkloadConfig,
    event_tx: UnboundedSender<WorkloadEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> WorkloadRun {
    let mut queue: VecDeque<_> = plan_operations(workload).into();
    let planned = queue.len();
    let concurrency = workload.concurrency.max(1);
    info!(planned, concurrency, stagger = ?workload.stagger, target = %backend.target(), "workload starting");

    let mut in_flight = JoinSet::new();
    let mut outcomes = Vec::with_capacity(planned);
    let mut next_launch = Instant::now();
    let mut cancelled = false;
    let mut commands_open = true;
    let mut ctrl_c = std::pin::pin!(tokio::signal::ctrl_c());

    loop {
        if queue.is_empty() && in_flight.is_empty() {
            break;
        }
        let can_launch = !queue.is_empty() && in_flight.len() < concurrency;

        tokio::select! {
            _ = tokio::time::sleep_until(next_launch), if can_launch => {
                if let Some(op) = queue.pop_front() {
                    let _ = event_tx.send(WorkloadEvent::OperationStarted {
                        id: op.id,
                        path: op.path.clone(),
                        tracking: op.tracking,
                    });
                    let backend = backend.clone();
                    in_flight.spawn(async move { backend.perform(&op).await });
                    next_launch = Instant::now() + workload.stagger;
                }
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                match joined {
                    Ok(outcome) => {
                        let _ = event_tx.send(WorkloadEvent::OperationFinished(outcome.clone()));
                        outcomes.push(outcome);
                    }
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => {
                        warn!("operation task failed: {e}");
                        let _ = event_tx.send(WorkloadEvent::Info(InfoEvent::Message(format!(
                            "Operation task failed: {e}"
                        ))));
                    }
                }
            }
            cmd = cmd_rx.recv(), if commands_open => {
                match cmd {
                    Some(UiCommand::Quit) => {
                        cancel(&mut queue, &mut in_flight, &event_tx);
                        cancelled = true;
                    }
                    // Headless callers drop their sender up front.
                    None => commands_open = false,
                }
            }
            res = &mut ctrl_c, if !cancelled => {
                if let Err(e) = res {
                    warn!("failed to listen for Ctrl-C: {e}");
                }
                cancel(&mut queue, &mut in_flight, &event_tx);
                cancelled = true;
            }
        }
    }

    // Aborted operations have dropped their pending guards by now; only the
    // min-duration window can still be open.
    if indicator.is_visible() {
        let _ = event_tx.send(WorkloadEvent::Info(InfoEvent::Settling));
        indicator.settled().await;
    }
    info!(completed = outcomes.len(), cancelled, "workload finished");

    WorkloadRun {
        planned,
        outcomes,
        cancelled,
    }
}

fn cancel(
    queue: &mut VecDeque<Operation>,
    in_flight: &mut JoinSet<OperationOutcome>,
    event_tx: &UnboundedSender<WorkloadEvent>,
) {
    queue.clear();
    let _ = event_tx.send(WorkloadEvent::Info(InfoEvent::Cancelling {
        in_flight: in_flight.len(),
    }));
    in_flight.abort_all();
}
