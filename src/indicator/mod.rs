//! Busy-indicator visibility coordination.
//!
//! A single [`VisibilityCoordinator`] is created at startup and cloned into every
//! consumer. Request layers bracket their work with `begin()`/`end()` (or the
//! [`PendingGuard`] returned by `track()`), display layers observe the visibility
//! signal through `subscribe()`.

mod config;
mod coordinator;
mod error;
mod guard;

pub use config::IndicatorConfig;
pub use coordinator::{CoordinatorMetrics, IndicatorPhase, VisibilityCoordinator};
pub use error::IndicatorError;
pub use guard::PendingGuard;
