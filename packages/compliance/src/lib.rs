#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Building performance standard compliance engine.
//!
//! Turns a building's emissions intensity into excess emissions and fines
//! against a schedule of multi-year benchmark ceilings:
//!
//! - [`benchmark`] parses period labels and expands periods into a
//!   per-year [`benchmark::BenchmarkTimeline`].
//! - [`projector`] builds grid emission-factor trajectories, either by
//!   linear interpolation or from an explicit year table.
//! - [`calculator`] computes excess emissions, fines and per-period,
//!   per-year and decarbonized schedules.
//! - [`units`] converts floor area between square meters and square feet.
//! - [`config`] loads benchmark, fine-rate and grid settings from TOML.
//!
//! Nothing in this crate performs I/O except [`config::ComplianceConfig::from_path`].

pub mod benchmark;
pub mod calculator;
pub mod config;
pub mod projector;
pub mod units;

pub use pathways_compliance_models as models;

use thiserror::Error;

/// Errors from benchmark, projection and compliance operations.
#[derive(Debug, Error)]
pub enum ComplianceError {
    /// A benchmark period label could not be parsed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// A year is not covered by any benchmark period.
    #[error("Year {year} is not covered by any benchmark period")]
    OutOfRange {
        /// The uncovered year.
        year: i32,
    },

    /// A year range is empty or inverted.
    #[error("Invalid year range {start}..={end}: {message}")]
    InvalidRange {
        /// First year of the range.
        start: i32,
        /// Last year of the range.
        end: i32,
        /// Why the range was rejected.
        message: String,
    },

    /// A grid emission factor is non-positive, non-finite or rising above
    /// the baseline factor.
    #[error("Invalid emission factor: {message}")]
    InvalidFactor {
        /// Description of the offending factor.
        message: String,
    },

    /// Configuration is missing or malformed.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },

    /// I/O error reading a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
