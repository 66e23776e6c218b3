//! Geo-NAP CLI
//!
//! Plans training jobs against a local provider cache, or submits them to a
//! running geonapd.

mod commands;

use clap::{Parser, Subcommand};
use commands::{JobArgs, Local};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// geonap - network-aware GPU placement and training cost planner
#[derive(Parser, Debug)]
#[command(name = "geonap")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Daemon API address
    #[arg(long, default_value = "http://localhost:9090", global = true)]
    api: String,

    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Provider cache file (JSON); overrides the configured path
    #[arg(long, global = true)]
    providers: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Plan a job against the provider cache
    Plan {
        #[command(flatten)]
        job: JobArgs,
    },

    /// Compare a job with the same job restricted to one GPU model
    Compare {
        #[command(flatten)]
        job: JobArgs,

        /// GPU model to compare against (e.g., H100)
        #[arg(long)]
        model: String,
    },

    /// List ranked providers
    Providers {
        /// Only providers within this round-trip time
        #[arg(long)]
        max_rtt: Option<f64>,

        /// Only providers offering this GPU model
        #[arg(long)]
        model: Option<String>,
    },

    /// List known GPU models
    Models,

    /// Simulate the spread of a job's cost
    Simulate {
        #[command(flatten)]
        job: JobArgs,

        /// Mean cost to simulate around; plans the job when omitted
        #[arg(long)]
        mean: Option<f64>,

        /// Number of samples
        #[arg(long, default_value_t = geonap_scheduler::DEFAULT_RUNS)]
        runs: usize,

        /// Random seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },

    /// Submit a job to a running daemon
    Submit {
        #[command(flatten)]
        job: JobArgs,
    },

    /// Reload the daemon's provider cache
    Reload,

    /// Show daemon status
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let local = || Local::open(cli.config.as_deref(), cli.providers.as_deref());
    let client = commands::ApiClient::new(&cli.api);

    match &cli.command {
        Commands::Plan { job } => {
            commands::plan(&local()?, job, cli.json).await?;
        }
        Commands::Compare { job, model } => {
            commands::compare(&local()?, job, model, cli.json).await?;
        }
        Commands::Providers { max_rtt, model } => {
            commands::providers(&local()?, *max_rtt, model.as_deref(), cli.json).await?;
        }
        Commands::Models => {
            commands::models(&local()?, cli.json).await?;
        }
        Commands::Simulate {
            job,
            mean,
            runs,
            seed,
        } => {
            commands::simulate(&local()?, job, *mean, *runs, *seed, cli.json).await?;
        }
        Commands::Submit { job } => {
            commands::submit(&client, job, cli.json).await?;
        }
        Commands::Reload => {
            commands::reload(&client).await?;
        }
        Commands::Status => {
            commands::status(&client).await?;
        }
    }

    Ok(())
}
