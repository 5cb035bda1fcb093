//! Grid emission-factor trajectories.
//!
//! A trajectory describes how the carbon intensity of grid electricity
//! (kgCO2/kWh) is expected to fall year over year. It is produced either by
//! linear interpolation between two factors ([`project`]) or from a
//! published year-by-year table ([`project_from_table`]).

use std::collections::BTreeMap;

use pathways_compliance_models::GridFactorPoint;

use crate::ComplianceError;

/// Ordered `(year, factor)` pairs with strictly increasing years and
/// positive, finite factors.
#[derive(Debug, Clone, PartialEq)]
pub struct GridFactorTrajectory {
    points: Vec<GridFactorPoint>,
}

impl GridFactorTrajectory {
    /// Creates a trajectory from points already in year order.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::Config`] if `points` is empty,
    /// [`ComplianceError::InvalidRange`] if years are not strictly
    /// increasing and [`ComplianceError::InvalidFactor`] for a factor that
    /// is not a positive finite number.
    pub fn new(points: Vec<GridFactorPoint>) -> Result<Self, ComplianceError> {
        if points.is_empty() {
            return Err(ComplianceError::Config {
                message: "grid factor trajectory has no points".to_string(),
            });
        }

        for window in points.windows(2) {
            if window[1].year <= window[0].year {
                return Err(ComplianceError::InvalidRange {
                    start: window[0].year,
                    end: window[1].year,
                    message: "trajectory years must be strictly increasing".to_string(),
                });
            }
        }

        if let Some(bad) = points
            .iter()
            .find(|p| !p.factor.is_finite() || p.factor <= 0.0)
        {
            return Err(ComplianceError::InvalidFactor {
                message: format!(
                    "factor {} for {} must be a positive finite number",
                    bad.factor, bad.year
                ),
            });
        }

        Ok(Self { points })
    }

    /// The points in year order.
    #[must_use]
    pub fn points(&self) -> &[GridFactorPoint] {
        &self.points
    }

    /// Factor of the first year.
    #[must_use]
    pub fn initial_factor(&self) -> f64 {
        self.points[0].factor
    }

    /// Factor for `year`, if the trajectory contains it.
    #[must_use]
    pub fn factor_for(&self, year: i32) -> Option<f64> {
        self.points
            .binary_search_by_key(&year, |p| p.year)
            .ok()
            .map(|i| self.points[i].factor)
    }

    /// Whether no later factor exceeds the initial one.
    #[must_use]
    pub fn is_decarbonizing(&self) -> bool {
        let initial = self.initial_factor();
        self.points.iter().all(|p| p.factor <= initial)
    }

    /// Iterates the points in year order.
    pub fn iter(&self) -> impl Iterator<Item = &GridFactorPoint> {
        self.points.iter()
    }

    /// Number of years in the trajectory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`; a trajectory has at least one point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Linearly interpolates grid factors for every year in
/// `start_year..=end_year`.
///
/// `factor(y) = initial + (final - initial) * (y - start) / (end - start)`,
/// evaluated in a form that reproduces both endpoints exactly.
///
/// # Errors
///
/// Returns [`ComplianceError::InvalidRange`] unless `start_year < end_year`
/// and [`ComplianceError::InvalidFactor`] if either factor is not a
/// positive finite number.
pub fn project(
    start_year: i32,
    end_year: i32,
    initial_factor: f64,
    final_factor: f64,
) -> Result<GridFactorTrajectory, ComplianceError> {
    if start_year >= end_year {
        return Err(ComplianceError::InvalidRange {
            start: start_year,
            end: end_year,
            message: "interpolation needs start year before end year".to_string(),
        });
    }

    let span = f64::from(end_year - start_year);
    let points = (start_year..=end_year)
        .map(|year| {
            let t = f64::from(year - start_year) / span;
            GridFactorPoint {
                year,
                factor: initial_factor.mul_add(1.0 - t, final_factor * t),
            }
        })
        .collect();

    log::debug!(
        "Projected grid factors {start_year}..={end_year}: {initial_factor} -> {final_factor}"
    );

    GridFactorTrajectory::new(points)
}

/// Builds a trajectory from an explicit `year → factor` table.
///
/// # Errors
///
/// Returns [`ComplianceError::Config`] for an empty table and
/// [`ComplianceError::InvalidFactor`] for a non-positive or non-finite
/// factor.
pub fn project_from_table(
    year_to_factor: &BTreeMap<i32, f64>,
) -> Result<GridFactorTrajectory, ComplianceError> {
    let points = year_to_factor
        .iter()
        .map(|(year, factor)| GridFactorPoint {
            year: *year,
            factor: *factor,
        })
        .collect();
    GridFactorTrajectory::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reproduces_endpoints_exactly() {
        let trajectory = project(2024, 2050, 0.2889, 0.05).unwrap();
        assert_eq!(trajectory.len(), 27);
        assert_eq!(trajectory.factor_for(2024), Some(0.2889));
        assert_eq!(trajectory.factor_for(2050), Some(0.05));
    }

    #[test]
    fn midpoint_matches_linear_formula() {
        let trajectory = project(2024, 2050, 0.2889, 0.05).unwrap();
        let expected = 0.2889 + (0.05 - 0.2889) * f64::from(2037 - 2024) / f64::from(2050 - 2024);
        let actual = trajectory.factor_for(2037).unwrap();
        assert!((actual - expected).abs() < 1e-9, "{actual} vs {expected}");
    }

    #[test]
    fn interpolation_is_monotonic_for_falling_factor() {
        let trajectory = project(2024, 2049, 0.2889, 0.05).unwrap();
        assert!(trajectory.is_decarbonizing());
        for window in trajectory.points().windows(2) {
            assert!(window[1].factor < window[0].factor);
        }
    }

    #[test]
    fn rejects_degenerate_ranges() {
        assert!(matches!(
            project(2030, 2030, 0.3, 0.1),
            Err(ComplianceError::InvalidRange { .. })
        ));
        assert!(matches!(
            project(2050, 2024, 0.3, 0.1),
            Err(ComplianceError::InvalidRange { .. })
        ));
    }

    #[test]
    fn rejects_non_positive_factor() {
        assert!(matches!(
            project(2024, 2030, 0.3, 0.0),
            Err(ComplianceError::InvalidFactor { .. })
        ));
    }

    #[test]
    fn table_mode_orders_by_year() {
        let table = BTreeMap::from([(2026, 0.21), (2024, 0.2889), (2025, 0.245)]);
        let trajectory = project_from_table(&table).unwrap();
        let years: Vec<i32> = trajectory.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2024, 2025, 2026]);
        assert!((trajectory.initial_factor() - 0.2889).abs() < f64::EPSILON);
        assert_eq!(trajectory.factor_for(2027), None);
    }

    #[test]
    fn empty_table_is_rejected() {
        assert!(matches!(
            project_from_table(&BTreeMap::new()),
            Err(ComplianceError::Config { .. })
        ));
    }

    #[test]
    fn rising_table_is_not_decarbonizing() {
        let table = BTreeMap::from([(2024, 0.2), (2025, 0.25)]);
        assert!(!project_from_table(&table).unwrap().is_decarbonizing());
    }
}
