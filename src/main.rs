//! CLI entry point: replay a G-code file in simulated time, or drive the
//! simulator interactively from stdin.

use clap::{Parser, Subcommand};
use grbl_sim::streamer::{StreamEvent, Streamer, read_program};
use grbl_sim::{SimClock, SimConfig, Simulator, interactive, load_config};
use grbl_shared::MonotonicClock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "grbl-sim", about = "Grbl 1.1 serial protocol simulator.")]
pub struct Cli {
    /// Path to a TOML config file (overrides defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream a G-code file with character-counting flow control
    Stream {
        file: PathBuf,
        /// Print the transcript as JSON lines
        #[arg(long)]
        jsonl: bool,
        /// Also record a status snapshot every N simulated milliseconds
        #[arg(long)]
        status_ms: Option<u64>,
    },
    /// Read lines and real-time characters from stdin (^X reset, ^J jog cancel)
    Interactive,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(&path.to_string_lossy()) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load config: {e}");
                std::process::exit(1);
            }
        },
        None => SimConfig::default(),
    };

    let level = if cli.verbose || config.simulator.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Stream { file, jsonl, status_ms } => {
            tracing::info!("Streaming {}", file.display());
            let clock = SimClock::new();
            let sim = Simulator::new(&config, Arc::new(clock.clone()))?;
            let mut streamer = Streamer::new(sim, clock, config.tick_interval());
            if let Some(ms) = status_ms {
                streamer = streamer.with_status_interval(Duration::from_millis(ms));
            }
            let program = read_program(&file)?;
            let summary = streamer.run(&program)?;
            for event in &summary.events {
                if jsonl {
                    println!("{}", serde_json::to_string(event)?);
                    continue;
                }
                match event {
                    StreamEvent::Response { line, response, .. } => print!("{} => {}", line, response),
                    StreamEvent::Push { message, .. } => print!("{}", message),
                    StreamEvent::Status { status, .. } => print!("{}", status.render()),
                }
            }
            if !jsonl {
                println!(
                    "{} lines, {} errors, {} alarms, {:.3}s simulated",
                    summary.lines,
                    summary.errors,
                    summary.alarms,
                    summary.elapsed.as_secs_f64()
                );
            }
        }
        Commands::Interactive => {
            let mut sim = Simulator::new(&config, Arc::new(MonotonicClock::new()))?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            interactive::run_session(&mut sim, stdin, tokio::io::stdout(), config.tick_interval()).await?;
        }
    }

    Ok(())
}
