use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use vibe_eyes::{load_config, TranscriptPayload, VibeEngine};

/// Streams transcript lines from stdin into a live VIBE signal
#[derive(Debug, Parser)]
#[command(name = "vibe-eyes", version, about)]
struct Cli {
    /// Config file (TOML or JSON); defaults to the platform config dir
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Radial amplification strength
    #[arg(long)]
    passion: Option<f64>,

    /// Pull toward the nearest cinematic exemplar (0-1)
    #[arg(long)]
    drama: Option<f64>,

    /// Log frames instead of writing to the output device
    #[arg(long)]
    dry_run: bool,

    /// Run fast-only, without the slow mood estimator
    #[arg(long)]
    no_estimator: bool,

    /// Info-level logging
    #[arg(short, long)]
    verbose: bool,

    /// Debug-level logging
    #[arg(long)]
    debug: bool,

    /// Print the resolved configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set log level based on flags
    let log_level = if cli.debug {
        tracing::Level::DEBUG
    } else if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    // Logs go to stderr; stdout carries ingest reports
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(passion) = cli.passion {
        config.amplifier.passion = passion;
    }
    if let Some(drama) = cli.drama {
        config.amplifier.drama = drama;
    }
    if cli.dry_run {
        config.sink.device_path = None;
    }
    if cli.no_estimator {
        config.estimator.enabled = false;
    }
    config.validate()?;

    if cli.print_config {
        emit(&toml::to_string_pretty(&config)?);
        return Ok(());
    }

    tracing::info!("Starting vibe-eyes version {}", env!("CARGO_PKG_VERSION"));

    let engine = VibeEngine::builder(config).build()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ticker = tokio::spawn(VibeEngine::run(engine.clone(), shutdown_rx));

    let warm = engine.clone();
    tokio::spawn(async move {
        warm.warm_baseline().await;
    });

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => handle_line(&engine, &line),
                    Ok(None) => {
                        tracing::info!("Input closed; rendering continues until Ctrl-C");
                        stdin_open = false;
                    }
                    Err(e) => {
                        tracing::error!("Failed to read input: {}", e);
                        stdin_open = false;
                    }
                }
            }
        }
    }

    let _ = shutdown_tx.send(true);
    ticker.await?;

    if let Ok(status) = engine.status() {
        tracing::info!("Final status: {}", serde_json::to_string(&status)?);
    }

    Ok(())
}

fn handle_line(engine: &VibeEngine, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    if line == "status" {
        match engine.status().map(|s| serde_json::to_string(&s)) {
            Ok(Ok(json)) => emit(&json),
            Ok(Err(e)) => tracing::error!("Failed to encode status: {}", e),
            Err(e) => tracing::warn!("Status unavailable: {}", e),
        }
        return;
    }

    let result = TranscriptPayload::from_line(line).and_then(|payload| engine.ingest(&payload));
    match result {
        Ok(report) => match serde_json::to_string(&report) {
            Ok(json) => emit(&json),
            Err(e) => tracing::error!("Failed to encode report: {}", e),
        },
        Err(e) => tracing::warn!("Rejected transcript: {}", e),
    }
}

/// Stdout carries reports only
#[allow(clippy::print_stdout)]
fn emit(out: &str) {
    println!("{out}");
}
