//! # precinct-scan
//!
//! Drives the precinct scanner controller from the command line.

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Precinct ballot scanner controller.
///
/// Runs simulated voting sessions against the mock scanner and calibrates
/// scanner sensors.
#[derive(Parser, Debug)]
#[command(name = "precinct-scan", version, about)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Feed simulated ballots through the controller.
    Simulate(precinct_cli::simulate::SimulateArgs),
    /// Calibrate double-feed detection or image sensors.
    Calibrate(precinct_cli::calibrate::CalibrateArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Simulate(args) => {
            let report = precinct_cli::simulate::run(args).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Calibrate(args) => precinct_cli::calibrate::run(args).await?,
    }

    Ok(())
}
