use crate::display::Spinner;
use crate::model::{SessionReport, WorkloadEvent};
use std::collections::VecDeque;
use std::time::Instant;

const LOG_CAPACITY: usize = 500;

pub struct UiState {
    pub info: String,
    pub visible: bool,
    pub pending: usize,
    pub spinner: Spinner,

    pub started: usize,
    pub finished: usize,
    pub failed: usize,

    pub run_start: Instant,
    // Newest last
    pub log: VecDeque<String>,
    pub report: Option<SessionReport>,
}

impl Default for UiState {
    fn default() -> Self {
        let now = Instant::now();
        Self {
            info: String::new(),
            visible: false,
            pending: 0,
            spinner: Spinner::new(now),
            started: 0,
            finished: 0,
            failed: 0,
            run_start: now,
            log: VecDeque::with_capacity(LOG_CAPACITY),
            report: None,
        }
    }
}

impl UiState {
    pub fn push_log(&mut self, line: String) {
        if self.log.len() == LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }

    /// Record a visibility change from the coordinator.
    pub fn set_visible(&mut self, visible: bool, now: Instant) {
        if visible && !self.visible {
            self.spinner.reset(now);
        }
        self.visible = visible;
        let t = now.saturating_duration_since(self.run_start).as_secs_f64();
        let what = if visible { "shown" } else { "hidden" };
        self.push_log(format!("[{t:>7.3}s] indicator {what}"));
    }
}

pub fn apply_event(state: &mut UiState, ev: WorkloadEvent) {
    match ev {
        WorkloadEvent::OperationStarted { id, path, tracking } => {
            state.started += 1;
            state.push_log(format!("#{id:<3} start  {path} ({tracking:?})"));
        }
        WorkloadEvent::OperationFinished(o) => {
            state.finished += 1;
            let status = match &o.error {
                None => "ok".to_string(),
                Some(e) => {
                    state.failed += 1;
                    format!("failed: {e}")
                }
            };
            state.push_log(format!("#{:<3} done   {} in {} ms, {}", o.id, o.path, o.elapsed_ms, status));
        }
        WorkloadEvent::Info(info) => state.info = info.to_message(),
        WorkloadEvent::RunCompleted { report } => {
            state.info = if report.cancelled {
                "Run cancelled. Press q to quit.".to_string()
            } else {
                "Run complete. Press q to quit.".to_string()
            };
            state.report = Some(*report);
        }
    }
}
