use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use fleetwatch_monitor::{doctor, Config, Monitor};
use fleetwatch_store::StateStore;
use fleetwatch_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(name = "fleetwatch", version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "fleetwatch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a commented default configuration file
    Init,

    /// Verify required local tooling (ssh, sshpass)
    Doctor,

    /// Watch the fleet and dispatch post-install scripts, forever
    Run,

    /// Run a single detect + dispatch cycle and exit
    Cycle,

    /// Show per-class device and actionable counts
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Init => {
            Config::write_default_to(&cli.config)?;
            println!("Wrote default config to {}", cli.config.display());
        }
        Command::Doctor => {
            doctor()?;
            println!("OK");
        }
        Command::Run => {
            let cfg = Config::load_from(&cli.config)?;
            init_logging(&cfg)?;
            doctor()?;
            let mut monitor = Monitor::from_config(&cfg)?;
            info!("fleetwatch starting");
            monitor.run_forever()?;
        }
        Command::Cycle => {
            let cfg = Config::load_from(&cli.config)?;
            init_logging(&cfg)?;
            let mut monitor = Monitor::from_config(&cfg)?;
            monitor.run_cycle()?;
        }
        Command::Status => {
            let cfg = Config::load_from(&cli.config)?;
            let store = SqliteStore::open(&cfg.db_path())?;
            for class in cfg.enabled_classes() {
                match store.load(class)? {
                    Some(state) => println!(
                        "{class}: {} devices, {} awaiting post-install",
                        state.devices.len(),
                        state.actionable.len()
                    ),
                    None => println!("{class}: no state yet"),
                }
            }
        }
    }
    Ok(())
}

fn init_logging(cfg: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match cfg.log_path() {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}
