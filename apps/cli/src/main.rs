mod logger;
mod session;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use session::LogSink;
use timer_ingest_core::{bounded, SampleSource, DEFAULT_QUEUE_DEPTH};
use timer_ingest_odom::{OdomConfig, OdomSource, StampMode};

#[derive(Parser, Debug)]
#[command(name = "race-timer", version, about = "Times a single run from start to goal")]
struct Cli {
    #[clap(flatten)]
    verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,

    /// Also print every event as a JSON line on stdout
    #[arg(long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Time a live run from UDP odometry datagrams
    Listen {
        /// Address to receive odometry on
        #[arg(short, long, default_value_t = OdomConfig::default().bind_addr)]
        bind: String,

        /// Use the stamp carried in each datagram instead of arrival time
        #[arg(long, default_value_t = false)]
        message_stamps: bool,

        /// Samples buffered between socket and timer before dropping
        #[arg(long, default_value_t = DEFAULT_QUEUE_DEPTH)]
        queue_depth: usize,
    },
    /// Time a recorded run from a CSV file (t_s,x,y,vx,vy,vz)
    Replay { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose.log_level_filter());
    info!("Initializing Mechatronics Timer...");

    let sink = LogSink { json: cli.json };
    match cli.command {
        Command::Listen { bind, message_stamps, queue_depth } => {
            let cfg = OdomConfig {
                bind_addr: bind,
                stamp: if message_stamps { StampMode::Message } else { StampMode::Arrival },
            };
            listen(cfg, queue_depth, sink).await
        }
        Command::Replay { file } => {
            let samples = iox::read_samples_csv(&file)?;
            info!("replaying {} samples from {}", samples.len(), file.display());
            let mut sink = sink;
            let timer = session::time_samples(&samples, &mut sink);
            if !timer.is_finished() {
                warn!("recording ended before the goal ({:?})", timer.phase());
            }
            Ok(())
        }
    }
}

async fn listen(cfg: OdomConfig, queue_depth: usize, sink: LogSink) -> Result<()> {
    let (tx, rx) = bounded(queue_depth);
    let src = OdomSource::new(cfg);
    let source = tokio::spawn(async move { src.run(tx).await });
    let pump = session::spawn_pump(rx, sink);

    tokio::select! {
        res = source => {
            res.context("odometry task panicked")?.context("odometry source")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
            return Ok(());
        }
    }

    // source is gone, so the pump drains what is left and stops
    let timer = tokio::task::spawn_blocking(move || pump.join())
        .await?
        .map_err(|_| anyhow!("timer thread panicked"))?;
    if !timer.is_finished() {
        warn!("odometry ended before the goal ({:?})", timer.phase());
    }
    Ok(())
}
