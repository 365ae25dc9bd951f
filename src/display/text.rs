use super::IndicatorView;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Log indicator transitions as text lines, offset from when the display started.
///
/// Ends when the coordinator is dropped or the line receiver goes away.
pub fn spawn_text_display(mut view: IndicatorView, lines: UnboundedSender<String>) -> JoinHandle<()> {
    let start = Instant::now();
    tokio::spawn(async move {
        while let Some(visible) = view.changed().await {
            let state = if visible { "shown" } else { "hidden" };
            let line = format!("[{:>8.3}s] indicator {state}", start.elapsed().as_secs_f64());
            if lines.send(line).is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::{IndicatorConfig, VisibilityCoordinator};
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_logs_show_and_hide() {
        let c = VisibilityCoordinator::new(IndicatorConfig::new(Duration::from_millis(300), Duration::ZERO)).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_text_display(IndicatorView::new(&c), tx);

        c.begin();
        let shown = rx.recv().await.unwrap();
        assert!(shown.ends_with("indicator shown"), "{shown}");

        c.end();
        let hidden = rx.recv().await.unwrap();
        assert!(hidden.ends_with("indicator hidden"), "{hidden}");
        assert!(hidden.contains("0.300s"), "{hidden}");

        drop(c);
        handle.await.unwrap();
    }
}
