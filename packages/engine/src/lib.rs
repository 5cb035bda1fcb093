#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Emissions engine boundary.
//!
//! The building-energy model itself is an external service. This crate
//! defines the [`EmissionsEngine`] trait the rest of the toolchain calls,
//! an HTTP implementation in [`client`], and the conversion from raw
//! per-unit engine output to building totals ([`emissions_result`]).

pub mod client;

use async_trait::async_trait;
use pathways_compliance_models::EmissionsResult;
use pathways_engine_models::{
    BuildingQuery, EngineResponse, VAR_CONSUMPTION_ELECTRICITY, VAR_EMISSIONS,
};
use thiserror::Error;

/// Errors from the emissions engine boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The engine answered with a non-success status.
    #[error("Engine returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Leading part of the response body.
        body: String,
    },

    /// The response body was not the expected JSON shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A requested variable is absent from the response.
    #[error("Engine response is missing variable '{variable}'")]
    MissingVariable {
        /// Name of the missing variable.
        variable: String,
    },

    /// Engine configuration is missing or invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}

/// Something that can model a building's emissions for a query.
#[async_trait]
pub trait EmissionsEngine: Send + Sync {
    /// Runs the model for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the engine is unreachable, rejects the
    /// query or returns an unexpected payload.
    async fn calculate(&self, query: &BuildingQuery) -> Result<EngineResponse, EngineError>;
}

/// Returns the value of `variable` from `response`.
///
/// # Errors
///
/// Returns [`EngineError::MissingVariable`] if no interval reports it.
pub fn require_variable(response: &EngineResponse, variable: &str) -> Result<f64, EngineError> {
    response
        .value(variable)
        .ok_or_else(|| EngineError::MissingVariable {
            variable: variable.to_string(),
        })
}

/// Converts per-unit engine output into building totals.
///
/// The engine models a single unit, so emissions and electricity
/// consumption are multiplied by `num_units`.
///
/// # Errors
///
/// Returns [`EngineError::MissingVariable`] if `emissions` or
/// `consumption.electricity` is absent.
pub fn emissions_result(
    response: &EngineResponse,
    num_units: u32,
) -> Result<EmissionsResult, EngineError> {
    let units = f64::from(num_units);
    Ok(EmissionsResult {
        total_emissions_kgco2: require_variable(response, VAR_EMISSIONS)? * units,
        total_consumption_kwh: require_variable(response, VAR_CONSUMPTION_ELECTRICITY)? * units,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: serde_json::Value) -> EngineResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn scales_per_unit_values_to_building_totals() {
        let resp = response(serde_json::json!({
            "data": { "intervals": [
                { "variable": "emissions", "value": 8610.0 },
                { "variable": "consumption.electricity", "value": 5000.0 }
            ]}
        }));
        let result = emissions_result(&resp, 50).unwrap();
        assert!((result.total_emissions_kgco2 - 430_500.0).abs() < 1e-6);
        assert!((result.total_consumption_kwh - 250_000.0).abs() < 1e-6);
    }

    #[test]
    fn missing_variable_is_named() {
        let resp = response(serde_json::json!({
            "data": { "intervals": [
                { "variable": "emissions", "value": 1.0 }
            ]}
        }));
        let err = emissions_result(&resp, 1).unwrap_err();
        match err {
            EngineError::MissingVariable { variable } => {
                assert_eq!(variable, "consumption.electricity");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
