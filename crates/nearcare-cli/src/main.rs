mod render;
mod search;

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use nearcare_core::FacilityKind;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "nearcare")]
#[command(about = "Find hospitals and clinics near you")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search for facilities around your position
    Search {
        /// Latitude of the search origin (requires --lon)
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Longitude of the search origin (requires --lat)
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
        /// Search radius in meters (defaults to `NEARCARE_SEARCH_RADIUS_METERS`)
        #[arg(long)]
        radius: Option<u32>,
        /// Restrict to a facility kind; repeat for several (defaults to all)
        #[arg(long = "kind", value_parser = parse_kind)]
        kinds: Vec<FacilityKind>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// List the provider endpoints in the order they are tried
    Providers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn parse_kind(value: &str) -> Result<FacilityKind, String> {
    FacilityKind::from_tag(value).ok_or_else(|| {
        let known: Vec<&str> = FacilityKind::ALL.into_iter().map(FacilityKind::as_tag).collect();
        format!("unknown facility kind '{value}' (expected one of: {})", known.join(", "))
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // `--help` and usage errors must not depend on config.
    let cli = Cli::parse();

    let config = nearcare_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Search {
            lat,
            lon,
            radius,
            kinds,
            format,
        }) => {
            let args = search::SearchArgs {
                position: lat.zip(lon),
                radius,
                kinds,
                format,
            };
            search::run_search(&config, args).await
        }
        Some(Commands::Providers) => {
            search::run_providers(&config)?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("nearcare: try `nearcare search` or `nearcare --help`");
            Ok(ExitCode::SUCCESS)
        }
    }
}
