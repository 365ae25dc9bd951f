mod state;

use crate::cli::Cli;
use crate::config::Config;
use crate::display::IndicatorView;
use crate::engine::Backend;
use crate::indicator::VisibilityCoordinator;
use crate::model::WorkloadEvent;
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use state::{apply_event, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub async fn run(
    args: Cli,
    config: Config,
    indicator: VisibilityCoordinator,
    backend: Arc<Backend>,
) -> Result<()> {
    // Unbounded channels avoid backpressure and task switching in the hot path.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<WorkloadEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_indicator = indicator.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_indicator, event_rx, cmd_tx));

    let run =
        orchestrator::run_workload(backend.clone(), &indicator, &config.workload, event_tx.clone(), cmd_rx).await;
    let processed = orchestrator::process_run_completion(
        backend.target(),
        &run,
        indicator.metrics(),
        args.export_json.as_deref(),
    );
    for msg in processed.export_messages {
        let _ = event_tx.send(WorkloadEvent::Info(crate::model::InfoEvent::Message(msg)));
    }
    let _ = event_tx.send(WorkloadEvent::RunCompleted {
        report: Box::new(processed.report),
    });

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }
    Ok(())
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    indicator: VisibilityCoordinator,
    mut event_rx: UnboundedReceiver<WorkloadEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut view = IndicatorView::new(&indicator);
    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState {
        visible: view.is_visible(),
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev);
        }
        if let Some(visible) = view.poll_change() {
            state.set_visible(visible, Instant::now());
        }
        state.pending = indicator.pending_count();

        if last_tick.elapsed() >= tick_rate {
            state.spinner.tick(Instant::now());
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();
    res
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3), // Indicator status
                Constraint::Length(3), // Counters
                Constraint::Min(0),    // Operation log / summary
                Constraint::Length(1), // Keys
            ]
            .as_ref(),
        )
        .split(area);

    let status = if state.visible {
        Line::from(vec![
            Span::styled(
                format!("{} ", state.spinner.current_frame()),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled("Loading…", Style::default().add_modifier(Modifier::BOLD)),
        ])
    } else {
        Line::from(Span::styled("Idle", Style::default().fg(Color::DarkGray)))
    };
    let status = Paragraph::new(status).block(Block::default().borders(Borders::ALL).title("busy-indicator"));
    f.render_widget(status, chunks[0]);

    let counters = Paragraph::new(Line::from(vec![
        Span::raw("pending "),
        Span::styled(state.pending.to_string(), Style::default().fg(Color::Cyan)),
        Span::raw("  started "),
        Span::raw(state.started.to_string()),
        Span::raw("  finished "),
        Span::styled(state.finished.to_string(), Style::default().fg(Color::Green)),
        Span::raw("  failed "),
        Span::styled(state.failed.to_string(), Style::default().fg(Color::Red)),
    ]))
    .block(Block::default().borders(Borders::ALL).title(state.info.as_str()));
    f.render_widget(counters, chunks[1]);

    draw_log(chunks[2], f, state);

    let keys = Paragraph::new(Line::from(vec![
        Span::styled("q", Style::default().fg(Color::Magenta)),
        Span::raw(" / "),
        Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
        Span::raw("  Quit"),
    ]));
    f.render_widget(keys, chunks[3]);
}

fn draw_log(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut lines: Vec<Line> = Vec::new();
    if let Some(report) = &state.report {
        for l in crate::text_summary::build_text_summary(report).lines {
            lines.push(Line::from(Span::styled(l, Style::default().fg(Color::Green))));
        }
        lines.push(Line::from(""));
    }
    // Keep the newest entries in view.
    let room = (area.height.saturating_sub(2) as usize).saturating_sub(lines.len());
    let skip = state.log.len().saturating_sub(room);
    lines.extend(state.log.iter().skip(skip).map(|l| Line::from(l.as_str())));

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Operations"));
    f.render_widget(p, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn render(state: &UiState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|f| draw(f.area(), f, state)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_status_shows_loading_only_while_visible() {
        let mut state = UiState::default();
        let idle = render(&state);
        assert!(idle.contains("Idle"));
        assert!(!idle.contains("Loading"));

        state.set_visible(true, Instant::now());
        state.pending = 3;
        let busy = render(&state);
        assert!(busy.contains("Loading"));
        assert!(busy.contains("pending 3"));
        assert!(busy.contains("indicator shown"));
    }
}
