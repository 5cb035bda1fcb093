//! Compliance configuration loaded from TOML.
//!
//! Benchmark ceilings, the fine rate, grid emission factors and sweep rates
//! are regulatory or modeling inputs, not constants of the calculator. The
//! default document under `config/` is embedded at compile time; users may
//! point at their own file instead.

use std::collections::BTreeMap;
use std::path::Path;

use pathways_compliance_models::{BenchmarkPeriod, FineRateUnits, GridFactorPoint};
use serde::Deserialize;

use crate::ComplianceError;
use crate::benchmark::{BenchmarkSchedule, parse_period_label, period_from_label, period_from_years};
use crate::calculator::FineRate;
use crate::projector::{GridFactorTrajectory, project, project_from_table};

const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Raw compliance configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct ComplianceConfig {
    /// Fine charged per unit of excess emissions.
    pub fine_rate: FineRateConfig,
    /// Benchmark periods in authoritative order.
    pub benchmarks: Vec<BenchmarkEntry>,
    /// Grid emission factors.
    pub grid: GridConfig,
    /// Emission-rate sweep settings.
    #[serde(default)]
    pub sweep: SweepConfig,
}

/// Fine rate with explicit units.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FineRateConfig {
    /// Rate value.
    pub value: f64,
    /// Units of `value`.
    pub units: FineRateUnits,
}

/// One benchmark period, given either by label or by explicit years.
#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkEntry {
    /// `"YYYY–YYYY"` label.
    #[serde(default)]
    pub label: Option<String>,
    /// First year, when no label is given.
    #[serde(default)]
    pub start_year: Option<i32>,
    /// Last year, when no label is given.
    #[serde(default)]
    pub end_year: Option<i32>,
    /// Ceiling in kgCO2/ft².
    pub ceiling: f64,
}

impl BenchmarkEntry {
    /// Resolves the entry into a [`BenchmarkPeriod`].
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::Parse`] for a malformed label and
    /// [`ComplianceError::Config`] when neither a label nor both years are
    /// present, or when label and years disagree.
    pub fn to_period(&self) -> Result<BenchmarkPeriod, ComplianceError> {
        match (&self.label, self.start_year, self.end_year) {
            (Some(label), None, None) => period_from_label(label, self.ceiling),
            (Some(label), start, end) => {
                let (label_start, label_end) = parse_period_label(label)?;
                if start.is_some_and(|s| s != label_start) || end.is_some_and(|e| e != label_end) {
                    return Err(ComplianceError::Config {
                        message: format!(
                            "benchmark '{label}' disagrees with start_year/end_year {start:?}/{end:?}"
                        ),
                    });
                }
                period_from_label(label, self.ceiling)
            }
            (None, Some(start), Some(end)) => period_from_years(start, end, self.ceiling),
            (None, _, _) => Err(ComplianceError::Config {
                message: format!(
                    "benchmark with ceiling {} needs a label or both start_year and end_year",
                    self.ceiling
                ),
            }),
        }
    }
}

/// Grid emission-factor settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    /// Electricity emission rate (kgCO2/kWh) baseline results assume.
    pub baseline_factor: f64,
    /// How future factors are projected.
    pub projection: ProjectionConfig,
}

/// Grid projection mode, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProjectionConfig {
    /// Linear interpolation between two factors.
    Linear {
        /// First projected year.
        start_year: i32,
        /// Last projected year.
        end_year: i32,
        /// Factor in `start_year`.
        initial_factor: f64,
        /// Factor in `end_year`.
        final_factor: f64,
    },
    /// Explicit year-by-year factors.
    Table {
        /// `(year, factor)` points; order does not matter.
        points: Vec<GridFactorPoint>,
    },
}

/// Emission-rate sweep settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SweepConfig {
    /// Electricity emission rates (kgCO2/kWh) to query.
    #[serde(default)]
    pub emission_rates: Vec<f64>,
}

/// Validated settings ready for the calculator.
#[derive(Debug, Clone)]
pub struct ComplianceSettings {
    /// Benchmark schedule.
    pub benchmarks: BenchmarkSchedule,
    /// Normalized fine rate.
    pub fine_rate: FineRate,
    /// Baseline grid factor.
    pub baseline_factor: f64,
    /// Projected grid factors.
    pub trajectory: GridFactorTrajectory,
    /// Sweep emission rates.
    pub sweep_rates: Vec<f64>,
}

impl ComplianceConfig {
    /// Returns the configuration embedded at compile time.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (covered by tests).
    #[must_use]
    pub fn embedded() -> Self {
        toml::de::from_str(DEFAULT_CONFIG_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded compliance config: {e}"))
    }

    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::Config`] if the TOML is malformed.
    pub fn from_toml_str(contents: &str) -> Result<Self, ComplianceError> {
        toml::de::from_str(contents).map_err(|e| ComplianceError::Config {
            message: e.to_string(),
        })
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::Io`] if the file cannot be read and
    /// [`ComplianceError::Config`] if it is malformed.
    pub fn from_path(path: &Path) -> Result<Self, ComplianceError> {
        log::debug!("Loading compliance config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Builds the benchmark schedule.
    ///
    /// # Errors
    ///
    /// Propagates label, range and ceiling errors from the entries.
    pub fn benchmark_schedule(&self) -> Result<BenchmarkSchedule, ComplianceError> {
        let periods = self
            .benchmarks
            .iter()
            .map(BenchmarkEntry::to_period)
            .collect::<Result<Vec<_>, _>>()?;
        BenchmarkSchedule::new(periods)
    }

    /// Builds the normalized fine rate.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::Config`] for a negative or non-finite rate.
    pub fn fine_rate(&self) -> Result<FineRate, ComplianceError> {
        FineRate::new(self.fine_rate.value, self.fine_rate.units)
    }

    /// Builds the projected grid factor trajectory.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::Config`] if a table lists a year twice, and
    /// propagates projection errors.
    pub fn trajectory(&self) -> Result<GridFactorTrajectory, ComplianceError> {
        match &self.grid.projection {
            ProjectionConfig::Linear {
                start_year,
                end_year,
                initial_factor,
                final_factor,
            } => project(*start_year, *end_year, *initial_factor, *final_factor),
            ProjectionConfig::Table { points } => {
                let mut table = BTreeMap::new();
                for point in points {
                    if table.insert(point.year, point.factor).is_some() {
                        return Err(ComplianceError::Config {
                            message: format!("grid projection lists {} more than once", point.year),
                        });
                    }
                }
                project_from_table(&table)
            }
        }
    }

    /// Validates everything and returns calculator-ready settings.
    ///
    /// # Errors
    ///
    /// Returns the first validation error encountered.
    pub fn resolve(&self) -> Result<ComplianceSettings, ComplianceError> {
        if !self.grid.baseline_factor.is_finite() || self.grid.baseline_factor <= 0.0 {
            return Err(ComplianceError::InvalidFactor {
                message: format!(
                    "baseline factor {} must be a positive number",
                    self.grid.baseline_factor
                ),
            });
        }

        if let Some(rate) = self
            .sweep
            .emission_rates
            .iter()
            .find(|r| !r.is_finite() || **r < 0.0)
        {
            return Err(ComplianceError::Config {
                message: format!("sweep emission rate {rate} must be a non-negative number"),
            });
        }

        Ok(ComplianceSettings {
            benchmarks: self.benchmark_schedule()?,
            fine_rate: self.fine_rate()?,
            baseline_factor: self.grid.baseline_factor,
            trajectory: self.trajectory()?,
            sweep_rates: self.sweep.emission_rates.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_resolves() {
        let settings = ComplianceConfig::embedded().resolve().unwrap();
        assert_eq!(settings.benchmarks.periods().len(), 4);
        assert_eq!(settings.benchmarks.timeline().first_year(), Some(2024));
        assert_eq!(settings.benchmarks.timeline().last_year(), Some(2049));
        assert!((settings.fine_rate.per_kg() - 0.269).abs() < 1e-12);
        assert!((settings.baseline_factor - 0.2889).abs() < 1e-12);
        assert_eq!(settings.sweep_rates.len(), 5);
    }

    #[test]
    fn embedded_trajectory_stays_inside_benchmarks() {
        let settings = ComplianceConfig::embedded().resolve().unwrap();
        for point in settings.trajectory.iter() {
            assert!(settings.benchmarks.ceiling_for(point.year).is_ok());
        }
        assert!(settings.trajectory.is_decarbonizing());
    }

    #[test]
    fn parses_year_entries_and_table_projection() {
        let config = ComplianceConfig::from_toml_str(
            r#"
            [fine_rate]
            value = 269.0
            units = "usd_per_metric_ton"

            [[benchmarks]]
            start_year = 2024
            end_year = 2029
            ceiling = 6.75

            [grid]
            baseline_factor = 0.2889

            [grid.projection]
            type = "table"
            points = [
                { year = 2025, factor = 0.25 },
                { year = 2024, factor = 0.2889 },
            ]
            "#,
        )
        .unwrap();

        let settings = config.resolve().unwrap();
        assert_eq!(settings.benchmarks.periods()[0].label, "2024–2029");
        assert!((settings.fine_rate.per_kg() - 0.269).abs() < 1e-12);
        assert_eq!(settings.trajectory.points()[0].year, 2024);
        assert!(settings.sweep_rates.is_empty());
    }

    #[test]
    fn rejects_duplicate_table_years() {
        let config = ComplianceConfig::from_toml_str(
            r#"
            [fine_rate]
            value = 0.269
            units = "usd_per_kg"

            [[benchmarks]]
            label = "2024-2029"
            ceiling = 6.75

            [grid]
            baseline_factor = 0.2889

            [grid.projection]
            type = "table"
            points = [
                { year = 2024, factor = 0.2889 },
                { year = 2024, factor = 0.25 },
            ]
            "#,
        )
        .unwrap();

        assert!(matches!(
            config.trajectory(),
            Err(ComplianceError::Config { .. })
        ));
    }

    #[test]
    fn rejects_entry_without_years() {
        let entry = BenchmarkEntry {
            label: None,
            start_year: Some(2024),
            end_year: None,
            ceiling: 1.0,
        };
        assert!(matches!(
            entry.to_period(),
            Err(ComplianceError::Config { .. })
        ));
    }

    #[test]
    fn rejects_label_year_mismatch() {
        let entry = BenchmarkEntry {
            label: Some("2024–2029".to_string()),
            start_year: Some(2025),
            end_year: None,
            ceiling: 1.0,
        };
        assert!(matches!(
            entry.to_period(),
            Err(ComplianceError::Config { .. })
        ));
    }

    #[test]
    fn rejects_unknown_fine_units() {
        let result = ComplianceConfig::from_toml_str(
            r#"
            benchmarks = []
            [fine_rate]
            value = 1.0
            units = "usd_per_pound"
            [grid]
            baseline_factor = 0.3
            [grid.projection]
            type = "table"
            points = []
            "#,
        );
        assert!(matches!(result, Err(ComplianceError::Config { .. })));
    }
}
