//! stpswitchd - STP-aware learning switch controller daemon
//!
//! Entry point for the stpswitchd daemon. Events arrive as JSON lines on
//! stdin; commands and the STP configuration push leave as JSON lines on
//! stdout. Logs go to stderr.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sonic_stpswitchd::replay::{read_events, write_outbound};
use sonic_stpswitchd::{ChannelSink, Controller, EventLoop, LogFormat, StpSwitchConfig};

/// STP-aware L2 learning switch controller
#[derive(Parser, Debug)]
#[command(name = "stpswitchd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Log level, overrides the configuration file (trace, debug, info, warn, error)
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

/// Initializes tracing/logging subsystem
fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn run(config: StpSwitchConfig) -> anyhow::Result<()> {
    let (sink, outbound_rx) = ChannelSink::channel();
    let writer = tokio::spawn(write_outbound(outbound_rx, tokio::io::stdout()));

    let controller = Arc::new(Controller::new(Arc::new(sink.clone())));
    controller.push_stp_config(&sink, &config.stp_config())?;

    let (event_tx, event_rx) = mpsc::channel(config.event_loop.mailbox_depth);
    let reader = tokio::spawn(read_events(BufReader::new(tokio::io::stdin()), event_tx));

    let stats = EventLoop::new(Arc::clone(&controller), config.event_loop.clone())
        .run(event_rx)
        .await?;
    let reader_stats = reader.await??;

    // Every sink clone must go before the writer sees end-of-stream.
    drop(sink);
    drop(controller);
    let written = writer.await??;

    info!(
        "Processed {} events ({} malformed lines skipped), wrote {} records",
        reader_stats.events, reader_stats.malformed, written
    );
    info!("Final stats: {:?}", stats);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match StpSwitchConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("stpswitchd: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    let format = if args.json_logs {
        LogFormat::Json
    } else {
        config.logging.format
    };
    init_logging(level, format);

    info!("--- Starting stpswitchd ---");

    match run(config).await {
        Ok(()) => {
            info!("stpswitchd exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("stpswitchd failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
