//! busy-indicator - flicker-free busy indicator coordination
//!
//! The heart of the crate is [`indicator::VisibilityCoordinator`], a process-wide
//! component that turns an unbounded number of overlapping async operations into
//! one visible/hidden signal, with a show delay against flicker for quick bursts
//! and a minimum display time once shown.
//!
//! # Modules
//!
//! - [`indicator`] - the coordinator, its config and the pending guard
//! - [`client`] - HTTP interception over reqwest
//! - [`display`] - observers of the visibility signal
//! - [`engine`] / [`orchestrator`] - workload driver used by the CLI
//! - [`config`] / [`logging`] / [`cli`] - ambient plumbing

pub mod cli;
pub mod client;
pub mod config;
pub mod display;
pub mod engine;
pub mod indicator;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod orchestrator;
pub mod text_summary;
#[cfg(feature = "tui")]
mod tui;

pub use client::{ClientError, RecipeClient, Tracking};
pub use config::Config;
pub use indicator::{
    CoordinatorMetrics, IndicatorConfig, IndicatorError, IndicatorPhase, PendingGuard, VisibilityCoordinator,
};
