//! Benchmark periods and their per-year expansion.
//!
//! Regulations publish ceilings per multi-year period (`"2024–2029"`), while
//! projections and charts work per calendar year. [`BenchmarkSchedule`]
//! keeps both views: the ordered periods as given and the derived
//! [`BenchmarkTimeline`].

use std::collections::BTreeMap;

use pathways_compliance_models::BenchmarkPeriod;

use crate::ComplianceError;

/// Canonical separator between the two years of a period label.
pub const EN_DASH: char = '\u{2013}';

/// Separators accepted between the two years of a period label.
const SEPARATORS: &[char] = &[EN_DASH, '-'];

/// Parses a `"YYYY–YYYY"` label into its start and end years.
///
/// The label must contain exactly one separator (en-dash, or ASCII
/// hyphen-minus) with exactly four ASCII digits on either side.
///
/// # Errors
///
/// Returns [`ComplianceError::Parse`] if the label does not match.
pub fn parse_period_label(label: &str) -> Result<(i32, i32), ComplianceError> {
    let separators = label.matches(SEPARATORS).count();
    if separators != 1 {
        return Err(ComplianceError::Parse {
            message: format!(
                "period label '{label}' must contain exactly one year separator, found {separators}"
            ),
        });
    }

    let (start, end) = label
        .split_once(SEPARATORS)
        .ok_or_else(|| ComplianceError::Parse {
            message: format!("period label '{label}' has no year separator"),
        })?;

    Ok((parse_year(label, start)?, parse_year(label, end)?))
}

fn parse_year(label: &str, part: &str) -> Result<i32, ComplianceError> {
    if part.len() != 4 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ComplianceError::Parse {
            message: format!("period label '{label}': '{part}' is not a 4-digit year"),
        });
    }
    part.parse::<i32>().map_err(|e| ComplianceError::Parse {
        message: format!("period label '{label}': {e}"),
    })
}

/// Builds a [`BenchmarkPeriod`] from a `"YYYY–YYYY"` label.
///
/// # Errors
///
/// Returns [`ComplianceError::Parse`] for a malformed label and
/// [`ComplianceError::InvalidRange`] if the start year is after the end
/// year.
pub fn period_from_label(label: &str, ceiling: f64) -> Result<BenchmarkPeriod, ComplianceError> {
    let (start_year, end_year) = parse_period_label(label)?;
    let period = BenchmarkPeriod {
        label: label.to_string(),
        start_year,
        end_year,
        ceiling,
    };
    validate_period(&period)?;
    Ok(period)
}

/// Builds a [`BenchmarkPeriod`] from explicit years, labeling it
/// `"start–end"`.
///
/// # Errors
///
/// Returns [`ComplianceError::InvalidRange`] if `start_year > end_year`.
pub fn period_from_years(
    start_year: i32,
    end_year: i32,
    ceiling: f64,
) -> Result<BenchmarkPeriod, ComplianceError> {
    let period = BenchmarkPeriod {
        label: format!("{start_year}{EN_DASH}{end_year}"),
        start_year,
        end_year,
        ceiling,
    };
    validate_period(&period)?;
    Ok(period)
}

fn validate_period(period: &BenchmarkPeriod) -> Result<(), ComplianceError> {
    if period.start_year > period.end_year {
        return Err(ComplianceError::InvalidRange {
            start: period.start_year,
            end: period.end_year,
            message: format!("benchmark period '{}' ends before it starts", period.label),
        });
    }
    if !period.ceiling.is_finite() || period.ceiling < 0.0 {
        return Err(ComplianceError::Config {
            message: format!(
                "benchmark period '{}' has invalid ceiling {}",
                period.label, period.ceiling
            ),
        });
    }
    Ok(())
}

/// Per-year view of a benchmark schedule: `year → ceiling`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkTimeline {
    ceilings: BTreeMap<i32, f64>,
}

impl BenchmarkTimeline {
    /// Returns the ceiling that applies in `year`.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::OutOfRange`] if no period covers `year`.
    pub fn ceiling_for(&self, year: i32) -> Result<f64, ComplianceError> {
        self.ceilings
            .get(&year)
            .copied()
            .ok_or(ComplianceError::OutOfRange { year })
    }

    /// Whether `year` has a ceiling.
    #[must_use]
    pub fn contains(&self, year: i32) -> bool {
        self.ceilings.contains_key(&year)
    }

    /// Iterates `(year, ceiling)` pairs in ascending year order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.ceilings.iter().map(|(year, ceiling)| (*year, *ceiling))
    }

    /// First covered year, if any.
    #[must_use]
    pub fn first_year(&self) -> Option<i32> {
        self.ceilings.keys().next().copied()
    }

    /// Last covered year, if any.
    #[must_use]
    pub fn last_year(&self) -> Option<i32> {
        self.ceilings.keys().next_back().copied()
    }

    /// Number of covered years.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ceilings.len()
    }

    /// Whether no year is covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ceilings.is_empty()
    }
}

/// Expands periods into a per-year timeline.
///
/// Every year of every period maps to that period's ceiling. When two
/// periods claim the same year, the one later in `periods` wins.
#[must_use]
pub fn expand(periods: &[BenchmarkPeriod]) -> BenchmarkTimeline {
    let mut ceilings = BTreeMap::new();
    for period in periods {
        for year in period.years() {
            ceilings.insert(year, period.ceiling);
        }
    }
    BenchmarkTimeline { ceilings }
}

/// An ordered list of benchmark periods together with its expanded
/// timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkSchedule {
    periods: Vec<BenchmarkPeriod>,
    timeline: BenchmarkTimeline,
}

impl BenchmarkSchedule {
    /// Creates a schedule from periods in their authoritative order.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::Config`] if `periods` is empty or a
    /// ceiling is invalid, and [`ComplianceError::InvalidRange`] for an
    /// inverted period.
    pub fn new(periods: Vec<BenchmarkPeriod>) -> Result<Self, ComplianceError> {
        if periods.is_empty() {
            return Err(ComplianceError::Config {
                message: "benchmark schedule has no periods".to_string(),
            });
        }

        for period in &periods {
            validate_period(period)?;
        }

        for (i, later) in periods.iter().enumerate() {
            for earlier in &periods[..i] {
                if earlier.start_year <= later.end_year && later.start_year <= earlier.end_year {
                    log::warn!(
                        "Benchmark periods '{}' and '{}' overlap; '{}' takes precedence",
                        earlier.label,
                        later.label,
                        later.label
                    );
                }
            }
        }

        let timeline = expand(&periods);
        Ok(Self { periods, timeline })
    }

    /// Creates a schedule from `(label, ceiling)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::Parse`] for a malformed label, plus the
    /// errors of [`Self::new`].
    pub fn from_labels<'a, I>(entries: I) -> Result<Self, ComplianceError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let periods = entries
            .into_iter()
            .map(|(label, ceiling)| period_from_label(label, ceiling))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(periods)
    }

    /// The periods in their original order.
    #[must_use]
    pub fn periods(&self) -> &[BenchmarkPeriod] {
        &self.periods
    }

    /// The per-year expansion of the periods.
    #[must_use]
    pub const fn timeline(&self) -> &BenchmarkTimeline {
        &self.timeline
    }

    /// Returns the ceiling that applies in `year`.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::OutOfRange`] if no period covers `year`.
    pub fn ceiling_for(&self, year: i32) -> Result<f64, ComplianceError> {
        self.timeline.ceiling_for(year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observed() -> BenchmarkSchedule {
        BenchmarkSchedule::from_labels([
            ("2024–2029", 6.75),
            ("2030–2034", 3.346_640),
            ("2035–2039", 2.692_183),
            ("2040–2049", 2.052_731),
        ])
        .unwrap()
    }

    #[test]
    fn parses_en_dash_label() {
        assert_eq!(parse_period_label("2024–2029").unwrap(), (2024, 2029));
    }

    #[test]
    fn parses_hyphen_label() {
        assert_eq!(parse_period_label("2030-2034").unwrap(), (2030, 2034));
    }

    #[test]
    fn rejects_malformed_labels() {
        for label in [
            "2024",
            "2024–2029–2034",
            "2024-2029–2034",
            "24–29",
            "2024–20x9",
            " 2024–2029",
            "2024–",
            "",
        ] {
            assert!(
                matches!(
                    parse_period_label(label),
                    Err(ComplianceError::Parse { .. })
                ),
                "expected parse error for {label:?}"
            );
        }
    }

    #[test]
    fn rejects_inverted_period() {
        assert!(matches!(
            period_from_label("2030–2024", 1.0),
            Err(ComplianceError::InvalidRange {
                start: 2030,
                end: 2024,
                ..
            })
        ));
    }

    #[test]
    fn rejects_empty_schedule() {
        assert!(matches!(
            BenchmarkSchedule::new(Vec::new()),
            Err(ComplianceError::Config { .. })
        ));
    }

    #[test]
    fn timeline_covers_every_year_once() {
        let schedule = observed();
        let timeline = schedule.timeline();
        assert_eq!(timeline.len(), 26);
        assert_eq!(timeline.first_year(), Some(2024));
        assert_eq!(timeline.last_year(), Some(2049));

        for year in 2024..=2049 {
            let ceiling = schedule.ceiling_for(year).unwrap();
            let owners = schedule
                .periods()
                .iter()
                .filter(|p| p.covers(year))
                .collect::<Vec<_>>();
            assert_eq!(owners.len(), 1, "year {year}");
            assert!((owners[0].ceiling - ceiling).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn uncovered_year_is_out_of_range() {
        let schedule = observed();
        assert!(matches!(
            schedule.ceiling_for(2023),
            Err(ComplianceError::OutOfRange { year: 2023 })
        ));
        assert!(matches!(
            schedule.ceiling_for(2050),
            Err(ComplianceError::OutOfRange { year: 2050 })
        ));
    }

    #[test]
    fn gap_years_are_out_of_range() {
        let schedule =
            BenchmarkSchedule::from_labels([("2024–2025", 5.0), ("2028–2029", 4.0)]).unwrap();
        assert!(matches!(
            schedule.ceiling_for(2026),
            Err(ComplianceError::OutOfRange { year: 2026 })
        ));
    }

    #[test]
    fn later_period_wins_overlapping_years() {
        let schedule =
            BenchmarkSchedule::from_labels([("2024–2030", 6.0), ("2030–2034", 3.0)]).unwrap();
        assert!((schedule.ceiling_for(2029).unwrap() - 6.0).abs() < f64::EPSILON);
        assert!((schedule.ceiling_for(2030).unwrap() - 3.0).abs() < f64::EPSILON);

        let reversed =
            BenchmarkSchedule::from_labels([("2030–2034", 3.0), ("2024–2030", 6.0)]).unwrap();
        assert!((reversed.ceiling_for(2030).unwrap() - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn period_from_years_uses_en_dash_label() {
        let period = period_from_years(2035, 2039, 2.692_183).unwrap();
        assert_eq!(period.label, "2035–2039");
        assert_eq!(parse_period_label(&period.label).unwrap(), (2035, 2039));
    }
}
