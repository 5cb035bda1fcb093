//! Table and JSON output.

use pathways_analysis::BuildingReport;
use pathways_analysis::sweep::{SweepEntry, SweepOutcome};
use pathways_compliance::benchmark::BenchmarkSchedule;
use pathways_compliance::projector::GridFactorTrajectory;
use pathways_compliance_models::ComplianceRecord;
use serde::Serialize;

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Aligned text tables.
    Table,
    /// Pretty-printed JSON.
    Json,
}

impl Format {
    #[must_use]
    pub const fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Table }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `(period or year, fine)` pairs in record order, for charting.
#[must_use]
pub fn fine_series(records: &[ComplianceRecord]) -> Vec<(String, f64)> {
    records
        .iter()
        .map(|r| (r.period_or_year.to_string(), r.fine_dollars))
        .collect()
}

pub fn benchmarks(schedule: &BenchmarkSchedule, format: Format) -> Result<(), serde_json::Error> {
    if format == Format::Json {
        let timeline: Vec<_> = schedule
            .timeline()
            .iter()
            .map(|(year, ceiling)| serde_json::json!({ "year": year, "ceiling": ceiling }))
            .collect();
        return print_json(&serde_json::json!({
            "periods": schedule.periods(),
            "timeline": timeline,
        }));
    }

    println!("{:<12} {:>6} {:>6} {:>12}", "PERIOD", "START", "END", "CEILING");
    println!("{}", "-".repeat(39));
    for period in schedule.periods() {
        println!(
            "{:<12} {:>6} {:>6} {:>12.6}",
            period.label, period.start_year, period.end_year, period.ceiling
        );
    }

    println!();
    println!("{:<6} {:>12}", "YEAR", "CEILING");
    println!("{}", "-".repeat(19));
    for (year, ceiling) in schedule.timeline().iter() {
        println!("{year:<6} {ceiling:>12.6}");
    }
    Ok(())
}

pub fn records(records: &[ComplianceRecord], format: Format) -> Result<(), serde_json::Error> {
    if format == Format::Json {
        return print_json(records);
    }
    print_records(records);
    Ok(())
}

fn print_records(records: &[ComplianceRecord]) {
    println!(
        "{:<12} {:>10} {:>10} {:>16} {:>14}",
        "PERIOD", "CEILING", "BUILDING", "EXCESS (kgCO2)", "FINE ($)"
    );
    println!("{}", "-".repeat(66));
    for r in records {
        println!(
            "{:<12} {:>10.4} {:>10.4} {:>16.2} {:>14.2}",
            r.period_or_year.to_string(),
            r.ceiling,
            r.building_intensity,
            r.excess_emissions_kgco2,
            r.fine_dollars
        );
    }
    let total: f64 = records.iter().map(|r| r.fine_dollars).sum();
    println!("{}", "-".repeat(66));
    println!("{:<12} {:>53.2}", "TOTAL", total);
}

pub fn trajectory(trajectory: &GridFactorTrajectory, format: Format) -> Result<(), serde_json::Error> {
    if format == Format::Json {
        return print_json(trajectory.points());
    }

    println!("{:<6} {:>18}", "YEAR", "FACTOR (kgCO2/kWh)");
    println!("{}", "-".repeat(25));
    for point in trajectory.iter() {
        println!("{:<6} {:>18.6}", point.year, point.factor);
    }
    Ok(())
}

pub fn report(
    report: &BuildingReport,
    decarbonized: Option<&[ComplianceRecord]>,
    format: Format,
) -> Result<(), serde_json::Error> {
    if format == Format::Json {
        return print_json(&serde_json::json!({
            "report": report,
            "fineSeries": fine_series(&report.periods),
            "decarbonized": decarbonized,
        }));
    }

    if let Some(location) = &report.location {
        println!("Location");
        let fields = [
            ("PUMA FIPS", &location.puma_fips),
            ("County", &location.county),
            ("County FIPS", &location.county_fips),
            ("State", &location.state),
            ("State FIPS", &location.state_fips),
            ("Climate zone", &location.climate_zone),
        ];
        for (label, value) in fields {
            println!("  {label:<14} {}", value.as_deref().unwrap_or("-"));
        }
        println!();
    }

    println!("Total emissions      {:>16.2} kgCO2", report.emissions.total_emissions_kgco2);
    println!("Total consumption    {:>16.2} kWh", report.emissions.total_consumption_kwh);
    println!("Intensity            {:>16.4} kgCO2/ft²", report.intensity);
    println!(
        "Floor area           {:>16.1} ft² x {} units",
        report.floor_area_ft2, report.num_units
    );
    println!();

    print_records(&report.periods);

    if let Some(records) = decarbonized {
        println!();
        println!("Decarbonizing grid (intensity scaled with the grid emission factor)");
        print_records(records);
    }
    Ok(())
}

pub fn sweep(entries: &[SweepEntry], format: Format) -> Result<(), serde_json::Error> {
    if format == Format::Json {
        return print_json(entries);
    }

    println!(
        "{:<18} {:>16} {:>16} {:>12} {:>14}  STATUS",
        "KEY", "EMISSIONS", "CONSUMPTION", "INTENSITY", "FINE ($)"
    );
    println!("{}", "-".repeat(88));
    for entry in entries {
        match &entry.outcome {
            SweepOutcome::Success(record) => {
                let fine = record
                    .compliance
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |c| format!("{:.2}", c.fine_dollars));
                println!(
                    "{:<18} {:>16.2} {:>16.2} {:>12.4} {:>14}  ok",
                    entry.key.to_string(),
                    record.emissions.total_emissions_kgco2,
                    record.emissions.total_consumption_kwh,
                    record.intensity,
                    fine
                );
            }
            SweepOutcome::Failed { error } => {
                println!(
                    "{:<18} {:>16} {:>16} {:>12} {:>14}  failed: {error}",
                    entry.key.to_string(),
                    "-",
                    "-",
                    "-",
                    "-"
                );
            }
        }
    }
    Ok(())
}
