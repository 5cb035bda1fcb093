#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Building performance standard compliance calculator.
//!
//! Reports a building's emissions intensity against benchmark ceilings,
//! the excess emissions and fines per period, and how compliance evolves
//! as the grid decarbonizes. Running without a subcommand opens an
//! interactive form.
//!
//! Engine-backed commands need `PATHWAYS_API_KEY`. Log output goes through
//! [`pathways_cli_utils::init_logger`] and is filtered by `RUST_LOG`.

mod interactive;
mod query_file;
mod render;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pathways_analysis::sweep::{sweep_emission_rates, sweep_years};
use pathways_analysis::{analyze, decarbonize, validate_building};
use pathways_cli_utils::IndicatifProgress;
use pathways_compliance::calculator::{schedule, yearly_schedule};
use pathways_compliance::config::{ComplianceConfig, ComplianceSettings};
use pathways_compliance::projector::project;
use pathways_compliance::units::sqm_to_sqft;
use pathways_engine::client::BemClient;

use crate::query_file::QueryFile;
use crate::render::Format;

#[derive(Parser)]
#[command(
    name = "pathways",
    about = "Building performance standard compliance and decarbonization pathways"
)]
struct Cli {
    /// Compliance configuration TOML (defaults to the built-in benchmarks)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List benchmark periods and the per-year ceilings
    Benchmarks,
    /// Compute excess emissions and fines for a known intensity
    Schedule {
        /// Building emissions intensity in kgCO2/ft²
        #[arg(long)]
        intensity: f64,
        /// Floor area of one unit in m²
        #[arg(long)]
        floor_area_m2: f64,
        /// Number of units
        #[arg(long, default_value = "1")]
        units: u32,
        /// One row per year instead of per period
        #[arg(long)]
        yearly: bool,
    },
    /// Print a grid emission-factor trajectory (the configured one when no
    /// bounds are given)
    Project {
        /// First year
        #[arg(long)]
        start: Option<i32>,
        /// Last year
        #[arg(long)]
        end: Option<i32>,
        /// Factor in the first year (kgCO2/kWh)
        #[arg(long)]
        initial: Option<f64>,
        /// Factor in the last year (kgCO2/kWh)
        #[arg(long = "final")]
        final_factor: Option<f64>,
    },
    /// Run the engine for a building and report compliance
    Calculate {
        /// Query TOML file
        #[arg(long)]
        query: PathBuf,
        /// Geocode this address instead of the file's location
        #[arg(long)]
        address: Option<String>,
        /// Also project compliance onto the decarbonizing grid
        #[arg(long)]
        decarbonize: bool,
    },
    /// Run a building once per electricity emission rate
    SweepRates {
        /// Query TOML file
        #[arg(long)]
        query: PathBuf,
        /// Comma-separated rates in kgCO2/kWh (defaults to the configured sweep)
        #[arg(long, value_delimiter = ',')]
        rates: Option<Vec<f64>>,
    },
    /// Run a building once per calendar year and check each year's ceiling
    SweepYears {
        /// Query TOML file
        #[arg(long)]
        query: PathBuf,
        /// First year
        #[arg(long)]
        from: i32,
        /// Last year
        #[arg(long)]
        to: i32,
    },
}

fn load_settings(path: Option<&Path>) -> Result<ComplianceSettings, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => ComplianceConfig::from_path(path)?,
        None => ComplianceConfig::embedded(),
    };
    Ok(config.resolve()?)
}

#[allow(clippy::too_many_lines)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = pathways_cli_utils::init_logger();
    let cli = Cli::parse();

    let settings = load_settings(cli.config.as_deref())?;
    let format = Format::from_json_flag(cli.json);

    let Some(command) = cli.command else {
        return interactive::run(&multi, &settings, format).await;
    };

    match command {
        Commands::Benchmarks => render::benchmarks(&settings.benchmarks, format)?,
        Commands::Schedule {
            intensity,
            floor_area_m2,
            units,
            yearly,
        } => {
            if !intensity.is_finite() || intensity < 0.0 {
                return Err(format!("intensity {intensity} must be a non-negative number").into());
            }
            validate_building(floor_area_m2, units)?;
            let floor_area_ft2 = sqm_to_sqft(floor_area_m2);
            let records = if yearly {
                yearly_schedule(
                    intensity,
                    &settings.benchmarks,
                    floor_area_ft2,
                    f64::from(units),
                    settings.fine_rate,
                )
            } else {
                schedule(
                    intensity,
                    &settings.benchmarks,
                    floor_area_ft2,
                    f64::from(units),
                    settings.fine_rate,
                )
            };
            render::records(&records, format)?;
        }
        Commands::Project {
            start,
            end,
            initial,
            final_factor,
        } => match (start, end, initial, final_factor) {
            (Some(start), Some(end), Some(initial), Some(final_factor)) => {
                render::trajectory(&project(start, end, initial, final_factor)?, format)?;
            }
            (None, None, None, None) => render::trajectory(&settings.trajectory, format)?,
            _ => {
                return Err("--start, --end, --initial and --final must be given together".into());
            }
        },
        Commands::Calculate {
            query,
            address,
            decarbonize: with_decarbonization,
        } => {
            let engine = BemClient::from_env()?;
            let query = QueryFile::from_path(&query)?
                .resolve(address.as_deref(), settings.baseline_factor)
                .await?;

            let report = analyze(&engine, &query, &settings).await?;
            let decarbonized = if with_decarbonization {
                Some(decarbonize(&report, &settings)?)
            } else {
                None
            };
            render::report(&report, decarbonized.as_deref(), format)?;
        }
        Commands::SweepRates { query, rates } => {
            let engine = BemClient::from_env()?;
            let query = QueryFile::from_path(&query)?
                .resolve(None, settings.baseline_factor)
                .await?;
            let rates = rates.unwrap_or_else(|| settings.sweep_rates.clone());
            if rates.is_empty() {
                return Err("no emission rates given and none configured".into());
            }

            let progress = IndicatifProgress::sweep_bar(&multi, "Emission rates");
            let entries = sweep_emission_rates(&engine, &query, &rates, &*progress).await?;
            render::sweep(&entries, format)?;
        }
        Commands::SweepYears { query, from, to } => {
            if from > to {
                return Err(format!("--from {from} is after --to {to}").into());
            }
            let engine = BemClient::from_env()?;
            let query = QueryFile::from_path(&query)?
                .resolve(None, settings.baseline_factor)
                .await?;
            let years: Vec<i32> = (from..=to).collect();

            let progress = IndicatifProgress::sweep_bar(&multi, "Years");
            let entries = sweep_years(&engine, &query, &years, &settings, &*progress).await?;
            render::sweep(&entries, format)?;
        }
    }

    Ok(())
}
