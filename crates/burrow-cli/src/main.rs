//! Burrow - send and receive files through the magic-wormhole executable.

use anyhow::Result;
use burrow_cli::{config, logging, output};
use burrow_core::{Orchestrator, Transfer, describe_files};
use burrow_types::TransferOutcome;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use config::Config;
use logging::{LogConfig, LogFormat};
use output::EventFormat;

/// Burrow - file and text transfers over magic-wormhole.
#[derive(Parser, Debug)]
#[command(name = "burrow")]
#[command(about = "Send and receive files and text through the wormhole executable")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override the wormhole executable path from config
    #[arg(long, value_name = "PATH", global = true)]
    wormhole: Option<PathBuf>,

    /// Event output format (text or json)
    #[arg(long = "events", value_name = "FORMAT", global = true)]
    events: Option<EventFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable trace logging, including raw process output
    #[arg(long, global = true)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "process=debug").
    /// Targets are prefixed with "burrow::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL", global = true)]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one or more files
    Send {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// Receive files into a directory
    Receive {
        code: String,
        /// Save location (defaults to the download directory)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
    /// Send a text message
    SendText { text: String },
    /// Receive a text message and print it
    ReceiveText { code: String },
    /// Check that the wormhole executable runs
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(path) = cli.wormhole {
        config.wormhole_path = path;
    }
    if let Some(format) = cli.events {
        config.event_format = format;
    }

    tracing::info!(target: "burrow::startup", "Using wormhole executable at {:?}", config.wormhole_path);

    let orchestrator = Orchestrator::new(config.orchestrator_config());

    let transfer = match cli.command {
        Command::Check => {
            let available = orchestrator.check_available().await;
            let path = orchestrator.config().executable_path.display();
            if available {
                println!("wormhole is available at {}", path);
            } else {
                println!("wormhole is not usable at {}", path);
            }
            std::process::exit(if available { 0 } else { 1 });
        }
        Command::Send { files } => {
            let transfer = orchestrator.send_files(&files).await?;
            match describe_files(&files).await {
                Ok(described) => {
                    for file in described {
                        tracing::info!(target: "burrow::cli", "Sending {} ({} bytes)", file.name, file.size);
                    }
                }
                Err(e) => tracing::warn!(target: "burrow::cli", "Could not inspect files to send: {}", e),
            }
            transfer
        }
        Command::Receive { code, dir } => {
            let dir = dir.unwrap_or_else(|| config.download_dir.clone());
            orchestrator.receive_files(&code, &dir).await?
        }
        Command::SendText { text } => orchestrator.send_text(&text).await?,
        Command::ReceiveText { code } => orchestrator.receive_text(&code).await?,
    };

    let exit_code = run_transfer(&orchestrator, transfer, config.event_format).await;
    std::process::exit(exit_code);
}

/// Print events until the transfer ends. Ctrl-C cancels it.
async fn run_transfer(orchestrator: &Orchestrator, mut transfer: Transfer, format: EventFormat) -> i32 {
    let session_id = transfer.id();

    loop {
        tokio::select! {
            event = transfer.next_event() => match event {
                Some(event) => match output::format_event(&event, format) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!(target: "burrow::cli", "Failed to render event: {}", e),
                },
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                if orchestrator.cancel(session_id) {
                    tracing::info!(target: "burrow::cli", "Cancelled transfer {}", session_id);
                }
            }
        }
    }

    match transfer.wait().await {
        Ok(TransferOutcome::Completed(receipt)) => {
            match output::format_receipt(&receipt, format) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!(target: "burrow::cli", "Failed to render result: {}", e),
            }
            0
        }
        Ok(TransferOutcome::Cancelled { .. }) => {
            eprintln!("Transfer cancelled");
            130
        }
        Err(e) => {
            eprintln!("Transfer failed: {}", e);
            1
        }
    }
}
