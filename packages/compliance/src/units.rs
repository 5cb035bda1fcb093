//! Floor-area unit conversion.

/// Square feet per square meter.
///
/// Truncated from 10.763 910 4…; every published figure in the benchmark
/// tables was derived with this value, so it is kept as-is.
pub const SQFT_PER_SQM: f64 = 10.764;

/// Converts an area in square meters to square feet.
#[must_use]
pub fn sqm_to_sqft(area_m2: f64) -> f64 {
    area_m2 * SQFT_PER_SQM
}

/// Converts an area in square feet to square meters.
#[must_use]
pub fn sqft_to_sqm(area_ft2: f64) -> f64 {
    area_ft2 / SQFT_PER_SQM
}
