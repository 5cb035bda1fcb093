#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address geocoding for building queries.
//!
//! Resolves a free-form street address to coordinates with the Nominatim /
//! `OpenStreetMap` search API. An address that does not match yields
//! `None`; callers must report it rather than fall back to any default
//! location.

pub mod nominatim;

use pathways_engine_models::Location;
use thiserror::Error;

/// Public Nominatim search endpoint.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Environment variable overriding [`DEFAULT_NOMINATIM_URL`].
pub const NOMINATIM_URL_ENV: &str = "PATHWAYS_NOMINATIM_URL";

/// `User-Agent` sent with every request, as Nominatim's usage policy
/// requires one.
pub const USER_AGENT: &str = concat!("pathways/", env!("CARGO_PKG_VERSION"));

/// A geocoding match.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Canonical address returned by the geocoder.
    pub display_name: Option<String>,
}

impl GeocodedAddress {
    /// Coordinates as an engine [`Location`].
    #[must_use]
    pub const fn location(&self) -> Location {
        Location {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// Builds an HTTP client carrying [`USER_AGENT`].
///
/// # Errors
///
/// Returns [`GeocodeError::Http`] if the client cannot be built.
pub fn client() -> Result<reqwest::Client, GeocodeError> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}

/// Search endpoint from the environment, or [`DEFAULT_NOMINATIM_URL`].
#[must_use]
pub fn base_url_from_env() -> String {
    std::env::var(NOMINATIM_URL_ENV).unwrap_or_else(|_| DEFAULT_NOMINATIM_URL.to_string())
}
