//! Excess emissions and fine calculation.
//!
//! All functions here are pure. Intensities are in kgCO2/ft², areas in ft²
//! per unit, emissions in kgCO2 and fines in US dollars.

use pathways_compliance_models::{ComplianceKey, ComplianceRecord, FineRateUnits};

use crate::ComplianceError;
use crate::benchmark::BenchmarkSchedule;
use crate::projector::GridFactorTrajectory;

/// A fine rate normalized to US dollars per kg of excess CO2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FineRate {
    per_kg: f64,
}

impl FineRate {
    /// Creates a rate from a value in the given units.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::Config`] if `value` is negative or not
    /// finite.
    pub fn new(value: f64, units: FineRateUnits) -> Result<Self, ComplianceError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ComplianceError::Config {
                message: format!("fine rate {value} {units} must be a non-negative number"),
            });
        }
        Ok(Self {
            per_kg: value * units.to_per_kg(),
        })
    }

    /// Dollars per kg of excess CO2.
    #[must_use]
    pub const fn per_kg(self) -> f64 {
        self.per_kg
    }
}

/// Emissions above the ceiling across the whole building, in kgCO2.
///
/// `max(0, intensity - ceiling) * floor_area_ft2 * num_units`. Zero when the
/// building is at or below the ceiling.
#[must_use]
pub fn excess_emissions(
    building_intensity: f64,
    ceiling: f64,
    floor_area_ft2: f64,
    num_units: f64,
) -> f64 {
    (building_intensity - ceiling).max(0.0) * floor_area_ft2 * num_units
}

/// Fine for `excess_emissions` kg at `rate_per_unit` dollars per kg.
#[must_use]
pub fn fine(excess_emissions: f64, rate_per_unit: f64) -> f64 {
    excess_emissions * rate_per_unit
}

/// Builds the record for one period or year.
#[must_use]
pub fn compliance_record(
    key: ComplianceKey,
    ceiling: f64,
    building_intensity: f64,
    floor_area_ft2: f64,
    num_units: f64,
    rate: FineRate,
) -> ComplianceRecord {
    let excess = excess_emissions(building_intensity, ceiling, floor_area_ft2, num_units);
    ComplianceRecord {
        period_or_year: key,
        ceiling,
        building_intensity,
        excess_emissions_kgco2: excess,
        fine_dollars: fine(excess, rate.per_kg()),
    }
}

/// One record per benchmark period, in period order.
#[must_use]
pub fn schedule(
    building_intensity: f64,
    benchmarks: &BenchmarkSchedule,
    floor_area_ft2: f64,
    num_units: f64,
    rate: FineRate,
) -> Vec<ComplianceRecord> {
    benchmarks
        .periods()
        .iter()
        .map(|period| {
            compliance_record(
                ComplianceKey::Period(period.label.clone()),
                period.ceiling,
                building_intensity,
                floor_area_ft2,
                num_units,
                rate,
            )
        })
        .collect()
}

/// One record per covered calendar year, in year order.
#[must_use]
pub fn yearly_schedule(
    building_intensity: f64,
    benchmarks: &BenchmarkSchedule,
    floor_area_ft2: f64,
    num_units: f64,
    rate: FineRate,
) -> Vec<ComplianceRecord> {
    benchmarks
        .timeline()
        .iter()
        .map(|(year, ceiling)| {
            compliance_record(
                ComplianceKey::Year(year),
                ceiling,
                building_intensity,
                floor_area_ft2,
                num_units,
                rate,
            )
        })
        .collect()
}

/// Intensity projected onto a cleaner grid.
///
/// Assumes emissions scale linearly with the grid emission factor while
/// consumption stays fixed. This is a modeling assumption, not a measured
/// relationship.
#[must_use]
pub fn projected_intensity(baseline_intensity: f64, factor: f64, baseline_factor: f64) -> f64 {
    baseline_intensity * factor / baseline_factor
}

/// One record per trajectory year with the building intensity scaled by
/// `factor / baseline_factor`.
///
/// # Errors
///
/// Returns [`ComplianceError::InvalidFactor`] if `baseline_factor` is not
/// positive or a trajectory factor exceeds it, and
/// [`ComplianceError::OutOfRange`] if a trajectory year has no benchmark.
pub fn decarbonized_schedule(
    baseline_intensity: f64,
    baseline_factor: f64,
    trajectory: &GridFactorTrajectory,
    benchmarks: &BenchmarkSchedule,
    floor_area_ft2: f64,
    num_units: f64,
    rate: FineRate,
) -> Result<Vec<ComplianceRecord>, ComplianceError> {
    if !baseline_factor.is_finite() || baseline_factor <= 0.0 {
        return Err(ComplianceError::InvalidFactor {
            message: format!("baseline factor {baseline_factor} must be a positive number"),
        });
    }

    trajectory
        .iter()
        .map(|point| {
            if point.factor > baseline_factor {
                return Err(ComplianceError::InvalidFactor {
                    message: format!(
                        "factor {} for {} exceeds the baseline factor {baseline_factor}",
                        point.factor, point.year
                    ),
                });
            }
            let ceiling = benchmarks.ceiling_for(point.year)?;
            Ok(compliance_record(
                ComplianceKey::Year(point.year),
                ceiling,
                projected_intensity(baseline_intensity, point.factor, baseline_factor),
                floor_area_ft2,
                num_units,
                rate,
            ))
        })
        .collect()
}
