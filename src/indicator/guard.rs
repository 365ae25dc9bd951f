use super::coordinator::VisibilityCoordinator;

/// One pending operation on a [`VisibilityCoordinator`].
///
/// Created by [`VisibilityCoordinator::track`], which calls `begin()`. The matching
/// `end()` runs exactly once: on [`finish`](Self::finish) or when the guard is
/// dropped, including during unwinding and when an enclosing future is cancelled.
#[must_use = "the operation ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct PendingGuard {
    coordinator: Option<VisibilityCoordinator>,
}

impl PendingGuard {
    pub(crate) fn new(coordinator: VisibilityCoordinator) -> Self {
        coordinator.begin();
        Self {
            coordinator: Some(coordinator),
        }
    }

    /// End the operation now rather than at scope exit.
    pub fn finish(mut self) {
        if let Some(coordinator) = self.coordinator.take() {
            coordinator.end();
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if let Some(coordinator) = self.coordinator.take() {
            coordinator.end();
        }
    }
}
