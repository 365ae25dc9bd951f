use crate::client::RecipeClient;
use crate::config::Config;
use crate::display::{spawn_text_display, IndicatorView};
use crate::engine::{Backend, SimulatedBackend};
use crate::indicator::VisibilityCoordinator;
use crate::model::WorkloadEvent;
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "busy-indicator",
    version,
    about = "Drive overlapping recipe-API requests and render a flicker-free busy indicator"
)]
pub struct Cli {
    /// Path to a JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base URL of the blend-recipe API
    #[arg(long)]
    pub base_url: Option<String>,

    /// Use a simulated backend instead of the network
    #[arg(long)]
    pub simulate: bool,

    /// Minimum time the indicator stays visible once shown
    #[arg(long)]
    pub min_duration: Option<humantime::Duration>,

    /// Delay before the indicator appears
    #[arg(long)]
    pub show_delay: Option<humantime::Duration>,

    /// Number of operations to issue
    #[arg(long)]
    pub operations: Option<usize>,

    /// Maximum operations in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Gap between operation launches
    #[arg(long)]
    pub stagger: Option<humantime::Duration>,

    /// Every n-th operation bypasses the indicator (0 = never)
    #[arg(long)]
    pub silent_every: Option<usize>,

    /// Print JSON report and exit (no TUI)
    #[arg(long, conflicts_with = "text")]
    pub json: bool,

    /// Print transitions and a text summary (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Export the report as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Whether the terminal UI owns the screen for this invocation.
    pub fn uses_tui(&self) -> bool {
        cfg!(feature = "tui") && !self.json && !self.text
    }
}

/// Layer CLI flags over the loaded configuration.
pub fn apply_overrides(args: &Cli, mut config: Config) -> Config {
    if let Some(url) = &args.base_url {
        config.client.base_url = url.clone();
    }
    if let Some(d) = args.min_duration {
        config.indicator.min_duration = Duration::from(d);
    }
    if let Some(d) = args.show_delay {
        config.indicator.show_delay = Duration::from(d);
    }
    if let Some(n) = args.operations {
        config.workload.operations = n;
    }
    if let Some(n) = args.concurrency {
        config.workload.concurrency = n;
    }
    if let Some(d) = args.stagger {
        config.workload.stagger = Duration::from(d);
    }
    if let Some(n) = args.silent_every {
        config.workload.silent_every = n;
    }
    config
}

/// Build the backend every operation goes through. Both variants share `indicator`.
pub fn build_backend(args: &Cli, config: &Config, indicator: &VisibilityCoordinator) -> Result<Backend> {
    if args.simulate {
        return Ok(Backend::Simulated(SimulatedBackend::new(
            config.simulation.clone(),
            indicator.clone(),
        )));
    }
    let client = RecipeClient::new(&config.client, indicator.clone()).context("build HTTP client")?;
    Ok(Backend::Http(client))
}

pub async fn run(args: Cli, config: Config) -> Result<()> {
    let indicator = VisibilityCoordinator::new(config.indicator).context("create visibility coordinator")?;
    let backend = Arc::new(build_backend(&args, &config, &indicator)?);

    if args.uses_tui() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args, config, indicator, backend).await;
        }
    }

    run_headless(args, config, indicator, backend).await
}

/// Text and JSON modes.
async fn run_headless(
    args: Cli,
    config: Config,
    indicator: VisibilityCoordinator,
    backend: Arc<Backend>,
) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<WorkloadEvent>();
    // No interactive commands; Ctrl-C is handled by the controller.
    let (_, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let display = if args.text {
        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
        let out = out_tx.clone();
        let relay = tokio::spawn(async move {
            while let Some(line) = line_rx.recv().await {
                let _ = out.send(OutputLine::Stderr(line));
            }
        });
        Some((spawn_text_display(IndicatorView::new(&indicator), line_tx), relay))
    } else {
        None
    };

    let driver = {
        let indicator = indicator.clone();
        let workload = config.workload.clone();
        let backend = backend.clone();
        tokio::spawn(async move {
            orchestrator::run_workload(backend, &indicator, &workload, evt_tx, cmd_rx).await
        })
    };

    while let Some(ev) = evt_rx.recv().await {
        if !args.text {
            continue;
        }
        match ev {
            WorkloadEvent::OperationStarted { id, path, tracking } => {
                let _ = out_tx.send(OutputLine::Stderr(format!("#{id:<3} start  {path} ({tracking:?})")));
            }
            WorkloadEvent::OperationFinished(o) => {
                let status = match &o.error {
                    None => "ok".to_string(),
                    Some(e) => format!("failed: {e}"),
                };
                let _ = out_tx.send(OutputLine::Stderr(format!(
                    "#{:<3} done   {} in {} ms, {}",
                    o.id, o.path, o.elapsed_ms, status
                )));
            }
            WorkloadEvent::Info(info) => {
                let _ = out_tx.send(OutputLine::Stderr(info.to_message()));
            }
            WorkloadEvent::RunCompleted { .. } => {}
        }
    }

    let run = driver.await.context("workload task failed")?;
    let processed = orchestrator::process_run_completion(
        backend.target(),
        &run,
        indicator.metrics(),
        args.export_json.as_deref(),
    );

    // Dropping the last coordinator handles closes the visibility channel; the text
    // display drains the final transition and exits.
    drop(backend);
    drop(indicator);
    if let Some((display, relay)) = display {
        let _ = display.await;
        let _ = relay.await;
    }

    if args.json {
        let out = serde_json::to_string_pretty(&processed.report)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        for line in crate::text_summary::build_text_summary(&processed.report).lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }
    for msg in processed.export_messages {
        let _ = out_tx.send(OutputLine::Stderr(msg));
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}
