#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Benchmark, emissions and compliance record types.
//!
//! These are plain data types shared between the compliance calculator,
//! the emissions engine client and the CLI. They carry no behaviour beyond
//! trivial derived quantities.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A labeled multi-year compliance period with its emissions-intensity
/// ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkPeriod {
    /// Display label (e.g. `"2024–2029"`).
    pub label: String,
    /// First calendar year covered (inclusive).
    pub start_year: i32,
    /// Last calendar year covered (inclusive).
    pub end_year: i32,
    /// Maximum allowed emissions intensity in kgCO2/ft².
    pub ceiling: f64,
}

impl BenchmarkPeriod {
    /// Whether `year` falls inside this period.
    #[must_use]
    pub const fn covers(&self, year: i32) -> bool {
        year >= self.start_year && year <= self.end_year
    }

    /// Iterates every calendar year of the period in ascending order.
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start_year..=self.end_year
    }
}

/// What a [`ComplianceRecord`] is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ComplianceKey {
    /// A benchmark period, by label.
    Period(String),
    /// A single calendar year.
    Year(i32),
}

impl std::fmt::Display for ComplianceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Period(label) => f.write_str(label),
            Self::Year(year) => write!(f, "{year}"),
        }
    }
}

/// Compliance outcome for one period or year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceRecord {
    /// The period or year this record describes.
    pub period_or_year: ComplianceKey,
    /// Benchmark ceiling in kgCO2/ft².
    pub ceiling: f64,
    /// Building emissions intensity in kgCO2/ft².
    pub building_intensity: f64,
    /// Emissions above the ceiling across the whole building, in kgCO2.
    pub excess_emissions_kgco2: f64,
    /// Fine in US dollars.
    pub fine_dollars: f64,
}

impl ComplianceRecord {
    /// A building is compliant when it emits nothing above the ceiling.
    #[must_use]
    pub fn is_compliant(&self) -> bool {
        self.excess_emissions_kgco2 <= 0.0
    }
}

/// One point of a grid emission-factor trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridFactorPoint {
    /// Calendar year.
    pub year: i32,
    /// Grid emission factor in kgCO2/kWh.
    pub factor: f64,
}

/// Building totals returned for one query over one date range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionsResult {
    /// Total building emissions in kgCO2.
    pub total_emissions_kgco2: f64,
    /// Total building electricity consumption in kWh.
    pub total_consumption_kwh: f64,
}

impl EmissionsResult {
    /// Emissions intensity in kgCO2/ft² across all units.
    #[must_use]
    pub fn intensity(&self, floor_area_ft2: f64, num_units: f64) -> f64 {
        self.total_emissions_kgco2 / (floor_area_ft2 * num_units)
    }
}

/// Unit a fine rate is expressed in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FineRateUnits {
    /// US dollars per kilogram of excess CO2.
    UsdPerKg,
    /// US dollars per metric ton of excess CO2.
    UsdPerMetricTon,
}

impl FineRateUnits {
    /// Multiplier that converts a rate in these units to USD per kg.
    #[must_use]
    pub const fn to_per_kg(self) -> f64 {
        match self {
            Self::UsdPerKg => 1.0,
            Self::UsdPerMetricTon => 0.001,
        }
    }
}
