//! Interactive building form.
//!
//! Walks through the same inputs a query file holds, runs the analysis and
//! offers the decarbonization projection and emission-rate sweep
//! afterwards.

use dialoguer::{Confirm, Input, Select};
use pathways_analysis::sweep::sweep_emission_rates;
use pathways_analysis::{analyze, decarbonize};
use pathways_cli_utils::{IndicatifProgress, MultiProgress};
use pathways_compliance::config::ComplianceSettings;
use pathways_engine::client::BemClient;
use pathways_engine_models::{Attribute, Location};

use crate::query_file::QueryFile;
use crate::render::{self, Format};

const BUILDING_TYPES: &[&str] = &[
    "Multi-Family (5 to 9 units)",
    "Multi-Family (10 to 19 units)",
    "Multi-Family (20 to 49 units)",
    "Multi-Family (50 or more units)",
];

const VINTAGES: &[&str] = &[
    "<1940", "1940s", "1950s", "1960s", "1970s", "1980s", "1990s", "2000s", "2010s", "2020s",
];

const WALL_TYPES: &[&str] = &["Concrete", "Wood Frame", "Brick", "Other"];
const HEATING_FUELS: &[&str] = &["Fossil Fuel", "Electric"];
const WATER_HEATERS: &[&str] = &["Fossil Fuel Standard", "Electric Standard"];
const LIGHTING: &[&str] = &["Incandescent", "LED", "CFL"];
const DRYER_FUELS: &[&str] = &["Gas", "Electric"];
const APPLIANCE_EFFICIENCIES: &[&str] = &["None", "Standard", "EnergyStar"];
const COOKING_RANGES: &[&str] = &["Gas", "Electric Resistance", "Electric Induction"];

/// How the building is located.
enum Locate {
    Address,
    Coordinates,
}

impl Locate {
    const ALL: &[Self] = &[Self::Address, Self::Coordinates];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Address => "Street address",
            Self::Coordinates => "Latitude / longitude",
        }
    }
}

/// Prompts for a building, then reports on it.
///
/// # Errors
///
/// Returns an error if a prompt fails, the engine is not configured, or
/// geocoding, the engine call or the compliance calculation fails.
#[allow(clippy::too_many_lines)]
pub async fn run(
    multi: &MultiProgress,
    settings: &ComplianceSettings,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = BemClient::from_env()?;

    println!("Building Performance Standard Pathways");
    println!();

    let labels: Vec<&str> = Locate::ALL.iter().map(Locate::label).collect();
    let idx = Select::new()
        .with_prompt("Locate the building by")
        .items(&labels)
        .default(0)
        .interact()?;

    let (address, location) = match Locate::ALL[idx] {
        Locate::Address => {
            let address: String = Input::new().with_prompt("Address").interact_text()?;
            (Some(address), None)
        }
        Locate::Coordinates => {
            let latitude: f64 = Input::new()
                .with_prompt("Latitude")
                .default(40.7)
                .interact_text()?;
            let longitude: f64 = Input::new()
                .with_prompt("Longitude")
                .default(-74.0)
                .interact_text()?;
            (None, Some(Location { latitude, longitude }))
        }
    };

    let timeline = settings.benchmarks.timeline();
    let first_year = timeline.first_year().unwrap_or(2024);
    let year: i32 = Input::new()
        .with_prompt("Year")
        .default(first_year)
        .validate_with(|y: &i32| {
            if timeline.contains(*y) {
                Ok(())
            } else {
                Err(format!("{y} has no benchmark"))
            }
        })
        .interact_text()?;

    let building_type = select("Building type", BUILDING_TYPES, 3)?;
    let floor_area_m2: f64 = Input::new()
        .with_prompt("Floor area per unit (m²)")
        .default(100.0)
        .interact_text()?;
    let num_units: u32 = Input::new()
        .with_prompt("Number of units")
        .default(50)
        .interact_text()?;
    let num_occupants: u32 = Input::new()
        .with_prompt("Occupants per unit")
        .default(3)
        .interact_text()?;
    let num_stories: u32 = Input::new()
        .with_prompt("Number of stories")
        .default(6)
        .interact_text()?;
    let vintage = select("Vintage", VINTAGES, 0)?;
    let wall_type = select("Wall type", WALL_TYPES, 0)?;

    let heating_fuel = select("HVAC heating fuel", HEATING_FUELS, 0)?;
    let heating_setpoint: f64 = Input::new()
        .with_prompt("Heating setpoint (°C)")
        .default(23.0)
        .interact_text()?;
    let cooling_setpoint: f64 = Input::new()
        .with_prompt("Cooling setpoint (°C)")
        .default(18.4)
        .interact_text()?;
    let water_heater = select("Water heating fuel", WATER_HEATERS, 0)?;
    let lighting = select("Lighting", LIGHTING, 0)?;

    let double_pane = confirm("Double-pane high insulation windows?")?;
    let insulated_roof = confirm("Thermally insulated roof?")?;
    let ev_charging = confirm("EV charging stations?")?;

    let dryer_fuel = select("Clothes dryer fuel", DRYER_FUELS, 0)?;
    let dryer_efficiency = select("Clothes dryer efficiency", APPLIANCE_EFFICIENCIES, 0)?;
    let washer_efficiency = select("Clothes washer efficiency", APPLIANCE_EFFICIENCIES, 0)?;
    let cooking_range = select("Cooking range", COOKING_RANGES, 0)?;

    let storage_quantile: f64 = Input::new()
        .with_prompt("Battery storage capacity recommendation quantile (0 to 1)")
        .default(0.3)
        .validate_with(|q: &f64| {
            if (0.0..=1.0).contains(q) {
                Ok(())
            } else {
                Err("must be between 0 and 1")
            }
        })
        .interact_text()?;
    let production_kw: f64 = Input::new()
        .with_prompt("Production capacity (kW)")
        .default(0.0)
        .interact_text()?;

    let file = QueryFile {
        address,
        location,
        year,
        floor_area_m2,
        num_units,
        attributes: vec![
            Attribute::new("building_type", building_type),
            Attribute::new("num_occupants", num_occupants),
            Attribute::new("num_stories", num_stories),
            Attribute::new("vintage", vintage),
            Attribute::new("wall_type", wall_type),
            Attribute::new("lighting", lighting),
            Attribute::new("hvac_heating_fuel", heating_fuel),
            Attribute::new("hvac_heating_setpoint", heating_setpoint),
            Attribute::new("hvac_cooling_setpoint", cooling_setpoint),
            Attribute::new(
                "roof_or_ceiling_insulation",
                if insulated_roof { 30_i64 } else { 1_i64 },
            ),
            Attribute::new(
                "window_panes",
                if double_pane { "Double" } else { "Single" },
            ),
            Attribute::new("water_heater", water_heater),
            Attribute::new("ev_charging", ev_charging),
            Attribute::new("clothes_dryer_fuel", dryer_fuel),
            Attribute::new("clothes_dryer_efficiency", dryer_efficiency),
            Attribute::new("clothes_washer_efficiency", washer_efficiency),
            Attribute::new("cooking_range", cooking_range),
        ],
        storage: vec![Attribute::new(
            "capacity_recommendation_quantile",
            storage_quantile,
        )],
        production: vec![Attribute::new("capacity", production_kw)],
        costs: None,
        variables: None,
    };

    let query = file.resolve(None, settings.baseline_factor).await?;
    let report = analyze(&engine, &query, settings).await?;
    println!();
    render::report(&report, None, format)?;

    println!();
    if confirm("Project compliance onto a decarbonizing grid?")? {
        let records = decarbonize(&report, settings)?;
        println!();
        if format == Format::Table {
            println!("Decarbonizing grid (intensity scaled with the grid emission factor)");
        }
        render::records(&records, format)?;
    }

    if !settings.sweep_rates.is_empty() && confirm("Sweep electricity emission rates?")? {
        let progress = IndicatifProgress::sweep_bar(multi, "Emission rates");
        let entries =
            sweep_emission_rates(&engine, &query, &settings.sweep_rates, &*progress).await?;
        println!();
        render::sweep(&entries, format)?;
    }

    Ok(())
}

fn select(
    prompt: &str,
    options: &[&'static str],
    default: usize,
) -> Result<&'static str, dialoguer::Error> {
    let idx = Select::new()
        .with_prompt(prompt)
        .items(options)
        .default(default)
        .interact()?;
    Ok(options[idx])
}

fn confirm(prompt: &str) -> Result<bool, dialoguer::Error> {
    Confirm::new().with_prompt(prompt).default(false).interact()
}
