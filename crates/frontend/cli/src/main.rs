mod config;
mod replay;
mod script;

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use emu_core::logging::LogConfig;
use emu_gamecube::LogSink;
use replay::Replay;
use script::Script;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Replay a recorded SI command script against emulated controller ports
#[derive(Parser)]
#[command(name = "si-trace")]
struct Args {
    /// Script of buffer, poll and direct-command steps (JSON)
    script: PathBuf,

    /// Port and logging configuration (JSON); defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the global device log level (off, error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Write device logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Dump the device save-states to this file as JSON after the run
    #[arg(long)]
    save: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if let Some(path) = args.log_file {
        config.log_file = Some(path);
    }

    let log = Arc::new(LogConfig::new());
    config.apply_logging(&log)?;

    let script = Script::load(&args.script)?;
    log::info!(
        "replaying {} step(s) from {}",
        script.steps.len(),
        args.script.display()
    );

    let mut replay = Replay::new(&config, Arc::new(LogSink::new(log.clone())));
    let results = replay.run(&script)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            println!("{}", result);
        }
    }

    if let Some(path) = args.save {
        let state = replay.save_state();
        let mut f =
            File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        write!(f, "{}", serde_json::to_string_pretty(&state)?)?;
        log::info!("saved device state to {}", path.display());
    }

    log.clear_log_file();
    Ok(())
}
