//! Batch sweeps over emission rates and calendar years.
//!
//! Each iteration is an independent engine call. Iterations run
//! sequentially and a failed call is recorded as a [`SweepOutcome::Failed`]
//! entry in its slot; later iterations still run. Only errors that make the
//! whole sweep meaningless (a degenerate query, a year without a benchmark)
//! abort before the first call.

use pathways_compliance::calculator::compliance_record;
use pathways_compliance::config::ComplianceSettings;
use pathways_compliance_models::{ComplianceKey, ComplianceRecord, EmissionsResult};
use pathways_engine::EmissionsEngine;
use pathways_engine_models::{BuildingQuery, DateRange};
use serde::Serialize;

use crate::progress::ProgressCallback;
use crate::{AnalysisError, evaluate, validate_query};

/// What an iteration varied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SweepKey {
    /// Electricity emission rate in kgCO2/kWh.
    EmissionRate(f64),
    /// Calendar year.
    Year(i32),
}

impl std::fmt::Display for SweepKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmissionRate(rate) => write!(f, "{rate} kgCO2/kWh"),
            Self::Year(year) => write!(f, "{year}"),
        }
    }
}

/// Result of a successful iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepRecord {
    /// Building totals.
    pub emissions: EmissionsResult,
    /// Emissions intensity in kgCO2/ft².
    pub intensity: f64,
    /// Compliance against the iteration's year, for year sweeps.
    pub compliance: Option<ComplianceRecord>,
}

/// Success or failure of one iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepOutcome {
    /// The engine answered.
    Success(SweepRecord),
    /// The engine call failed.
    Failed {
        /// Rendered error.
        error: String,
    },
}

/// One iteration of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepEntry {
    /// What this iteration varied.
    pub key: SweepKey,
    /// What happened.
    pub outcome: SweepOutcome,
}

impl SweepEntry {
    /// Whether the iteration succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, SweepOutcome::Success(_))
    }

    /// The successful record, if any.
    #[must_use]
    pub const fn record(&self) -> Option<&SweepRecord> {
        match &self.outcome {
            SweepOutcome::Success(record) => Some(record),
            SweepOutcome::Failed { .. } => None,
        }
    }
}

/// Runs `query` once per electricity emission rate.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidQuery`] for a degenerate query. Engine
/// failures are recorded per entry.
pub async fn sweep_emission_rates(
    engine: &dyn EmissionsEngine,
    query: &BuildingQuery,
    rates: &[f64],
    progress: &dyn ProgressCallback,
) -> Result<Vec<SweepEntry>, AnalysisError> {
    validate_query(query)?;

    progress.set_total(rates.len() as u64);
    let mut entries = Vec::with_capacity(rates.len());

    for &rate in rates {
        let key = SweepKey::EmissionRate(rate);
        progress.set_message(format!("emission rate {rate}"));

        let iteration = query.clone().with_electricity_emission_rate(rate);
        let outcome = match evaluate(engine, &iteration).await {
            Ok(evaluation) => SweepOutcome::Success(SweepRecord {
                emissions: evaluation.emissions,
                intensity: evaluation.intensity,
                compliance: None,
            }),
            Err(e) => {
                log::error!("Sweep iteration {key} failed: {e}");
                SweepOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        entries.push(SweepEntry { key, outcome });
        progress.inc(1);
    }

    progress.finish(summary(&entries));
    Ok(entries)
}

/// Runs `query` once per calendar year and checks each year against its
/// benchmark ceiling.
///
/// Every year is checked for benchmark coverage before the first engine
/// call.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidQuery`] for a degenerate query or a year
/// chrono cannot represent, and [`AnalysisError::Compliance`] with
/// `OutOfRange` for a year without a benchmark.
pub async fn sweep_years(
    engine: &dyn EmissionsEngine,
    query: &BuildingQuery,
    years: &[i32],
    settings: &ComplianceSettings,
    progress: &dyn ProgressCallback,
) -> Result<Vec<SweepEntry>, AnalysisError> {
    validate_query(query)?;

    let plan = years
        .iter()
        .map(|&year| {
            let ceiling = settings.benchmarks.ceiling_for(year)?;
            let range = DateRange::calendar_year(year).ok_or_else(|| AnalysisError::InvalidQuery {
                message: format!("year {year} is not representable"),
            })?;
            Ok((year, ceiling, range))
        })
        .collect::<Result<Vec<_>, AnalysisError>>()?;

    progress.set_total(plan.len() as u64);
    let mut entries = Vec::with_capacity(plan.len());

    for (year, ceiling, range) in plan {
        let key = SweepKey::Year(year);
        progress.set_message(format!("year {year}"));

        let iteration = query.clone().with_date_range(range);
        let outcome = match evaluate(engine, &iteration).await {
            Ok(evaluation) => {
                let compliance = compliance_record(
                    ComplianceKey::Year(year),
                    ceiling,
                    evaluation.intensity,
                    evaluation.floor_area_ft2,
                    f64::from(query.num_units),
                    settings.fine_rate,
                );
                SweepOutcome::Success(SweepRecord {
                    emissions: evaluation.emissions,
                    intensity: evaluation.intensity,
                    compliance: Some(compliance),
                })
            }
            Err(e) => {
                log::error!("Sweep iteration {key} failed: {e}");
                SweepOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        entries.push(SweepEntry { key, outcome });
        progress.inc(1);
    }

    progress.finish(summary(&entries));
    Ok(entries)
}

fn summary(entries: &[SweepEntry]) -> String {
    let ok = entries.iter().filter(|e| e.is_success()).count();
    let failed = entries.len() - ok;
    if failed > 0 {
        log::warn!("{failed} of {} sweep iterations failed", entries.len());
    }
    format!("{ok} succeeded, {failed} failed")
}

#[cfg(test)]
mod tests {
    use pathways_compliance::ComplianceError;
    use pathways_compliance::config::ComplianceConfig;

    use super::*;
    use crate::progress::NullProgress;
    use crate::test_support::{CONSUMPTION_KWH, FakeEngine, query};

    fn settings() -> ComplianceSettings {
        ComplianceConfig::embedded().resolve().unwrap()
    }

    #[tokio::test]
    async fn failed_iteration_does_not_abort_the_sweep() {
        let engine = FakeEngine::failing_on(vec![2]);
        let rates = [0.2889, 0.245, 0.21, 0.15, 0.10];

        let entries = sweep_emission_rates(&engine, &query(1), &rates, &NullProgress)
            .await
            .unwrap();

        assert_eq!(entries.len(), 5);
        assert_eq!(entries.iter().filter(|e| e.is_success()).count(), 4);
        assert!(matches!(entries[2].outcome, SweepOutcome::Failed { .. }));
        for (entry, rate) in entries.iter().zip(rates) {
            assert_eq!(entry.key, SweepKey::EmissionRate(rate));
        }
        assert_eq!(engine.calls().len(), 5);
    }

    #[tokio::test]
    async fn each_iteration_overrides_the_emission_rate() {
        let engine = FakeEngine::new();
        let entries = sweep_emission_rates(&engine, &query(2), &[0.3, 0.1], &NullProgress)
            .await
            .unwrap();

        let sent: Vec<f64> = engine
            .calls()
            .iter()
            .map(|q| q.costs.emission_rates.electricity.value)
            .collect();
        assert_eq!(sent, vec![0.3, 0.1]);

        let first = entries[0].record().unwrap();
        assert!((first.emissions.total_emissions_kgco2 - 0.3 * CONSUMPTION_KWH * 2.0).abs() < 1e-6);
        assert!(first.compliance.is_none());
        assert!(
            entries[1].record().unwrap().intensity < first.intensity,
            "cleaner grid should lower intensity"
        );
    }

    #[tokio::test]
    async fn year_sweep_sets_date_range_and_checks_ceiling() {
        let engine = FakeEngine::new();
        let entries = sweep_years(&engine, &query(1), &[2029, 2030], &settings(), &NullProgress)
            .await
            .unwrap();

        let calls = engine.calls();
        assert_eq!(calls[0].date_range, DateRange::calendar_year(2029).unwrap());
        assert_eq!(calls[1].date_range, DateRange::calendar_year(2030).unwrap());

        let c2029 = entries[0].record().unwrap().compliance.as_ref().unwrap();
        let c2030 = entries[1].record().unwrap().compliance.as_ref().unwrap();
        assert_eq!(c2029.period_or_year, ComplianceKey::Year(2029));
        assert!((c2029.ceiling - 6.75).abs() < 1e-12);
        assert!(c2030.ceiling < c2029.ceiling);
    }

    #[tokio::test]
    async fn uncovered_year_fails_before_any_call() {
        let engine = FakeEngine::new();
        let err = sweep_years(&engine, &query(1), &[2030, 2051], &settings(), &NullProgress)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AnalysisError::Compliance(ComplianceError::OutOfRange { year: 2051 })
        ));
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn year_sweep_records_failures_in_place() {
        let engine = FakeEngine::failing_on(vec![0]);
        let entries = sweep_years(&engine, &query(1), &[2024, 2025], &settings(), &NullProgress)
            .await
            .unwrap();
        assert!(!entries[0].is_success());
        assert!(entries[1].is_success());
    }
}
