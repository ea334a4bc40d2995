use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::eyre;
use memtrail::config::{self, load_config, load_config_from_path};
use memtrail::daily_log::DailyLog;
use memtrail::format::format_bytes;
use memtrail::logger::Logger;
use memtrail::report::build_report;
use memtrail::scheduler::IntervalScheduler;
use memtrail::system::collector::SysinfoProvider;
use memtrail::system::reading::Reading;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "memtrail",
    about = "Samples memory, kernel pools, and top processes into daily CSV logs"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sampling interval in seconds
    #[arg(long)]
    interval: Option<u64>,

    /// Directory the daily logs are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Run a single cycle and exit.
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Emit console logs as JSON lines.
    #[arg(long, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Summarise the daily logs already written
    Report {
        /// Directory to read instead of the configured output directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.log_json)?;
    let config = load_config_for_cli(&cli);

    if let Some(Command::Report { dir }) = &cli.command {
        let dir = dir.as_deref().unwrap_or(&config.general.output_dir);
        return run_report(dir);
    }

    let mut logger = Logger::new(
        SysinfoProvider::new(),
        DailyLog::new(&config.general.output_dir),
    );

    let total = match logger.sampler().total_memory() {
        Reading::Available(bytes) => format_bytes(bytes),
        Reading::Unavailable => "unknown".to_string(),
    };
    info!(
        "memtrail started: total memory {total}, interval {}s, logging to {}",
        config.general.interval_secs,
        config.general.output_dir.display()
    );

    if cli.once {
        let report = logger.guarded_tick()?;
        info!("{}", report.status);
        return Ok(());
    }

    let (mut scheduler, cancel) = IntervalScheduler::new(config.general.interval());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping after the current cycle");
            cancel.cancel();
        }
    });

    let summary = logger.run(&mut scheduler).await;
    info!(
        cycles = summary.cycles,
        failures = summary.failures,
        "memtrail stopped"
    );
    Ok(())
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| eyre!("failed to set tracing subscriber: {e}"))
}

fn load_config_for_cli(cli: &Cli) -> config::Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(interval) = cli.interval {
        config.general.interval_secs = interval;
    }
    if let Some(ref dir) = cli.output_dir {
        config.general.output_dir = dir.clone();
    }

    config.sanitized()
}

fn run_report(dir: &Path) -> Result<()> {
    let report = build_report(dir)?;
    print!("{report}");
    Ok(())
}
