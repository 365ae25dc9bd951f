//! Display surfaces for the busy indicator.
//!
//! Displays only observe the visibility signal; they never call `begin()`/`end()`.

mod spinner;
mod text;

pub use spinner::Spinner;
pub use text::spawn_text_display;

use crate::indicator::VisibilityCoordinator;
use tokio::sync::watch;

/// Read side of the visibility signal.
#[derive(Debug, Clone)]
pub struct IndicatorView {
    rx: watch::Receiver<bool>,
}

impl IndicatorView {
    pub fn new(coordinator: &VisibilityCoordinator) -> Self {
        Self {
            rx: coordinator.subscribe(),
        }
    }

    pub fn is_visible(&self) -> bool {
        *self.rx.borrow()
    }

    /// Non-blocking check for render loops: the new value if it changed since the
    /// last call.
    pub fn poll_change(&mut self) -> Option<bool> {
        match self.rx.has_changed() {
            Ok(true) => Some(*self.rx.borrow_and_update()),
            _ => None,
        }
    }

    /// Wait for the next change. `None` once the coordinator is gone.
    pub async fn changed(&mut self) -> Option<bool> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}
