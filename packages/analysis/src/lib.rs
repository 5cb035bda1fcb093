#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Building analysis pipeline.
//!
//! Glues the [`EmissionsEngine`] boundary to the compliance calculator:
//! one query becomes one engine call, whose totals are turned into an
//! intensity and checked against every benchmark period and year.
//! Batch variants live in [`sweep`].

pub mod progress;
pub mod sweep;

use pathways_compliance::ComplianceError;
use pathways_compliance::calculator::{decarbonized_schedule, schedule, yearly_schedule};
use pathways_compliance::config::ComplianceSettings;
use pathways_compliance::units::sqm_to_sqft;
use pathways_compliance_models::{ComplianceRecord, EmissionsResult};
use pathways_engine::{EmissionsEngine, EngineError, emissions_result};
use pathways_engine_models::{BuildingQuery, LocationInfo};
use serde::Serialize;
use thiserror::Error;

/// Errors from the analysis pipeline.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The engine call failed.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// A compliance computation failed.
    #[error("Compliance error: {0}")]
    Compliance(#[from] ComplianceError),

    /// The query cannot produce a meaningful intensity.
    #[error("Invalid query: {message}")]
    InvalidQuery {
        /// Description.
        message: String,
    },
}

/// Baseline compliance picture for one building.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingReport {
    /// Location metadata resolved by the engine, when provided.
    pub location: Option<LocationInfo>,
    /// Building totals.
    pub emissions: EmissionsResult,
    /// Floor area of one unit in ft².
    pub floor_area_ft2: f64,
    /// Number of identical units.
    pub num_units: u32,
    /// Electricity emission rate the engine was asked to assume.
    pub electricity_emission_rate: f64,
    /// Emissions intensity in kgCO2/ft².
    pub intensity: f64,
    /// One record per benchmark period.
    pub periods: Vec<ComplianceRecord>,
    /// One record per covered year.
    pub years: Vec<ComplianceRecord>,
}

/// Engine totals and intensity for a single query.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Evaluation {
    pub location: Option<LocationInfo>,
    pub emissions: EmissionsResult,
    pub floor_area_ft2: f64,
    pub intensity: f64,
}

/// Checks that a building has a positive, finite floor area per unit and at
/// least one unit.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidQuery`] otherwise.
pub fn validate_building(floor_area_m2: f64, num_units: u32) -> Result<(), AnalysisError> {
    if !floor_area_m2.is_finite() || floor_area_m2 <= 0.0 {
        return Err(AnalysisError::InvalidQuery {
            message: format!("floor area {floor_area_m2} m² must be positive"),
        });
    }
    if num_units == 0 {
        return Err(AnalysisError::InvalidQuery {
            message: "number of units must be at least 1".to_string(),
        });
    }
    Ok(())
}

/// Checks that `query` describes a building with positive area and units.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidQuery`] otherwise.
pub fn validate_query(query: &BuildingQuery) -> Result<(), AnalysisError> {
    validate_building(query.floor_area_m2, query.num_units)
}

pub(crate) async fn evaluate(
    engine: &dyn EmissionsEngine,
    query: &BuildingQuery,
) -> Result<Evaluation, EngineError> {
    let response = engine.calculate(query).await?;
    let emissions = emissions_result(&response, query.num_units)?;
    let floor_area_ft2 = sqm_to_sqft(query.floor_area_m2);
    let intensity = emissions.intensity(floor_area_ft2, f64::from(query.num_units));

    Ok(Evaluation {
        location: response.data.location,
        emissions,
        floor_area_ft2,
        intensity,
    })
}

/// Runs the engine for `query` and evaluates it against every benchmark.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidQuery`] for a degenerate query and
/// [`AnalysisError::Engine`] if the engine call fails.
pub async fn analyze(
    engine: &dyn EmissionsEngine,
    query: &BuildingQuery,
    settings: &ComplianceSettings,
) -> Result<BuildingReport, AnalysisError> {
    validate_query(query)?;

    let evaluation = evaluate(engine, query).await?;
    let units = f64::from(query.num_units);
    log::info!(
        "Building intensity {:.3} kgCO2/ft² ({:.0} kgCO2 over {:.1} ft² x {})",
        evaluation.intensity,
        evaluation.emissions.total_emissions_kgco2,
        evaluation.floor_area_ft2,
        query.num_units
    );

    let periods = schedule(
        evaluation.intensity,
        &settings.benchmarks,
        evaluation.floor_area_ft2,
        units,
        settings.fine_rate,
    );
    let years = yearly_schedule(
        evaluation.intensity,
        &settings.benchmarks,
        evaluation.floor_area_ft2,
        units,
        settings.fine_rate,
    );

    Ok(BuildingReport {
        location: evaluation.location,
        emissions: evaluation.emissions,
        floor_area_ft2: evaluation.floor_area_ft2,
        num_units: query.num_units,
        electricity_emission_rate: query.costs.emission_rates.electricity.value,
        intensity: evaluation.intensity,
        periods,
        years,
    })
}

/// Projects `report` onto the configured grid trajectory.
///
/// The report's intensity is scaled by `factor / rate`, where `rate` is the
/// electricity emission rate the engine modeled the report at.
///
/// # Errors
///
/// Returns [`ComplianceError::InvalidFactor`] if a trajectory factor is above
/// the report's rate, and propagates [`ComplianceError::OutOfRange`] from the
/// calculator.
pub fn decarbonize(
    report: &BuildingReport,
    settings: &ComplianceSettings,
) -> Result<Vec<ComplianceRecord>, ComplianceError> {
    log::debug!(
        "Decarbonizing from {} kgCO2/kWh (configured baseline {})",
        report.electricity_emission_rate,
        settings.baseline_factor
    );

    decarbonized_schedule(
        report.intensity,
        report.electricity_emission_rate,
        &settings.trajectory,
        &settings.benchmarks,
        report.floor_area_ft2,
        f64::from(report.num_units),
        settings.fine_rate,
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pathways_engine::{EmissionsEngine, EngineError};
    use pathways_engine_models::{BuildingQuery, DateRange, EngineResponse, Location};

    /// Per-unit electricity consumption every fake response reports.
    pub const CONSUMPTION_KWH: f64 = 10_000.0;

    /// Engine whose per-unit emissions are the query's electricity
    /// emission rate times [`CONSUMPTION_KWH`].
    pub struct FakeEngine {
        fail_on: Vec<usize>,
        calls: Mutex<Vec<BuildingQuery>>,
    }

    impl FakeEngine {
        pub const fn new() -> Self {
            Self::failing_on(Vec::new())
        }

        /// Fails the given zero-based calls with HTTP 503.
        pub const fn failing_on(fail_on: Vec<usize>) -> Self {
            Self {
                fail_on,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<BuildingQuery> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmissionsEngine for FakeEngine {
        async fn calculate(&self, query: &BuildingQuery) -> Result<EngineResponse, EngineError> {
            let index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(query.clone());
                calls.len() - 1
            };
            if self.fail_on.contains(&index) {
                return Err(EngineError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            let rate = query.costs.emission_rates.electricity.value;
            Ok(serde_json::from_value(serde_json::json!({
                "data": {
                    "location": { "state": "NY", "county": "New York County" },
                    "intervals": [
                        { "variable": "emissions", "value": rate * CONSUMPTION_KWH },
                        { "variable": "consumption.electricity", "value": CONSUMPTION_KWH }
                    ]
                }
            }))
            .unwrap())
        }
    }

    /// One 100 m² unit in Manhattan for 2024.
    pub fn query(num_units: u32) -> BuildingQuery {
        BuildingQuery::new(
            Location {
                latitude: 40.7128,
                longitude: -74.006,
            },
            DateRange::calendar_year(2024).unwrap(),
            100.0,
            num_units,
        )
    }
}
