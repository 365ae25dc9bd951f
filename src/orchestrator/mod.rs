//! Application-level orchestration utilities.
//!
//! This module owns the workload lifecycle (launch/cancel/settle) and post-run
//! processing such as report building and exports. UI/CLI layers call into this
//! module to keep responsibilities separated.

mod controller;
mod post_process;

pub use controller::{run_workload, UiCommand, WorkloadRun};
pub use post_process::{build_report, export_report_json, process_run_completion, ProcessedRun};
