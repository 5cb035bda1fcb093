//! Building query documents.
//!
//! A query file is a TOML document describing one building: where it is,
//! which year to model, its size and its engine attributes. See
//! `queries/multifamily.toml` for a complete example.

use std::collections::BTreeSet;
use std::path::Path;

use pathways_engine_models::{Attribute, BuildingQuery, CostAssumptions, DateRange, Location};
use pathways_geocoder::GeocodeError;
use serde::Deserialize;
use thiserror::Error;

/// Errors loading or resolving a query file.
#[derive(Debug, Error)]
pub enum QueryFileError {
    /// The file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid query document.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Geocoding the address failed.
    #[error("Geocoding error: {0}")]
    Geocode(#[from] GeocodeError),

    /// The address did not match anything.
    #[error("Address '{address}' could not be geocoded")]
    NoMatch {
        /// The address as given.
        address: String,
    },

    /// Neither an address nor coordinates were given.
    #[error("Query needs an address or a [location] table")]
    MissingLocation,

    /// The year cannot be modeled.
    #[error("Year {year} is not a valid calendar year")]
    InvalidYear {
        /// The year as given.
        year: i32,
    },
}

/// One building, as written in a query file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryFile {
    /// Street address to geocode.
    #[serde(default)]
    pub address: Option<String>,
    /// Explicit coordinates.
    #[serde(default)]
    pub location: Option<Location>,
    /// Calendar year to model.
    pub year: i32,
    /// Floor area of one unit in m².
    pub floor_area_m2: f64,
    /// Number of identical units.
    pub num_units: u32,
    /// Building attributes.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Storage attributes.
    #[serde(default)]
    pub storage: Vec<Attribute>,
    /// Production attributes.
    #[serde(default)]
    pub production: Vec<Attribute>,
    /// Emission and utility rate overrides.
    #[serde(default)]
    pub costs: Option<CostAssumptions>,
    /// Output variables to request instead of the defaults.
    #[serde(default)]
    pub variables: Option<BTreeSet<String>>,
}

impl QueryFile {
    /// Reads a query file.
    ///
    /// # Errors
    ///
    /// Returns [`QueryFileError::Io`] or [`QueryFileError::Toml`].
    pub fn from_path(path: &Path) -> Result<Self, QueryFileError> {
        log::debug!("Loading query from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses a query document.
    ///
    /// # Errors
    ///
    /// Returns [`QueryFileError::Toml`] if the document is malformed.
    pub fn from_toml_str(contents: &str) -> Result<Self, QueryFileError> {
        Ok(toml::de::from_str(contents)?)
    }

    /// Builds the engine query at `location`.
    ///
    /// Without a `[costs]` table the electricity emission rate is
    /// `baseline_factor`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryFileError::InvalidYear`] if the year has no calendar
    /// date range.
    pub fn to_query(
        &self,
        location: Location,
        baseline_factor: f64,
    ) -> Result<BuildingQuery, QueryFileError> {
        let date_range =
            DateRange::calendar_year(self.year).ok_or(QueryFileError::InvalidYear { year: self.year })?;

        let mut query = BuildingQuery::new(location, date_range, self.floor_area_m2, self.num_units)
            .with_attributes(self.attributes.clone())
            .with_storage(self.storage.clone())
            .with_production(self.production.clone());

        match &self.costs {
            Some(costs) => query.costs = costs.clone(),
            None => query = query.with_electricity_emission_rate(baseline_factor),
        }
        if let Some(variables) = &self.variables {
            query.variables = variables.clone();
        }

        Ok(query)
    }

    /// Resolves the location and builds the engine query.
    ///
    /// `address_override` wins over everything in the file. Otherwise the
    /// `[location]` table is used, then the file's `address`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryFileError::MissingLocation`] when there is nothing to
    /// locate the building with, [`QueryFileError::NoMatch`] when the address
    /// does not geocode, and geocoding errors as they occur.
    pub async fn resolve(
        &self,
        address_override: Option<&str>,
        baseline_factor: f64,
    ) -> Result<BuildingQuery, QueryFileError> {
        let location = match (address_override, self.location, self.address.as_deref()) {
            (Some(address), _, _) | (None, None, Some(address)) => geocode(address).await?,
            (None, Some(location), _) => location,
            (None, None, None) => return Err(QueryFileError::MissingLocation),
        };
        self.to_query(location, baseline_factor)
    }
}

/// Geocodes `address` with the configured Nominatim endpoint.
///
/// # Errors
///
/// Returns [`QueryFileError::NoMatch`] when nothing matches.
pub async fn geocode(address: &str) -> Result<Location, QueryFileError> {
    let client = pathways_geocoder::client()?;
    let base_url = pathways_geocoder::base_url_from_env();

    pathways_geocoder::nominatim::geocode(&client, &base_url, address)
        .await?
        .map(|found| {
            if let Some(name) = &found.display_name {
                println!("Located: {name}");
            }
            found.location()
        })
        .ok_or_else(|| QueryFileError::NoMatch {
            address: address.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use pathways_engine_models::{ATTR_FLOOR_AREA, AttributeValue};

    use super::*;

    const SAMPLE: &str = include_str!("../queries/multifamily.toml");

    #[test]
    fn sample_query_parses() {
        let file = QueryFile::from_toml_str(SAMPLE).unwrap();
        assert_eq!(file.year, 2024);
        assert_eq!(file.num_units, 50);
        assert!(file.address.is_some());
        assert_eq!(file.attributes[0].name, "building_type");
        assert_eq!(file.attributes[1].value, AttributeValue::Integer(3));
        assert_eq!(file.attributes[8].value, AttributeValue::Number(18.4));
        assert_eq!(file.attributes[12].value, AttributeValue::Flag(false));
    }

    #[test]
    fn builds_calendar_year_query() {
        let file = QueryFile::from_toml_str(SAMPLE).unwrap();
        let location = file.location.unwrap();
        let query = file.to_query(location, 0.2889).unwrap();

        assert_eq!(query.date_range, DateRange::calendar_year(2024).unwrap());
        assert!((query.floor_area_m2 - 100.0).abs() < f64::EPSILON);
        assert_eq!(query.storage.len(), 1);
        assert_eq!(query.production.len(), 1);

        let request = query.to_request();
        assert_eq!(
            request.consumption.attributes.baseline[0].name,
            ATTR_FLOOR_AREA
        );
    }

    #[test]
    fn overrides_costs_and_variables() {
        let file = QueryFile::from_toml_str(
            r#"
            year = 2030
            floor_area_m2 = 80.0
            num_units = 10
            variables = ["emissions", "consumption.electricity"]

            [location]
            latitude = 38.9
            longitude = -77.0

            [costs.emission_rates.electricity]
            value = 0.15
            units = "kgCO2/kWh"
            [costs.emission_rates.fossil_fuel]
            value = 0.059
            [costs.utility_rates.electricity]
            value = 0.25
            [costs.utility_rates.fossil_fuel]
            value = 0.07
            "#,
        )
        .unwrap();

        let query = file.to_query(file.location.unwrap(), 0.2889).unwrap();
        assert!((query.costs.emission_rates.electricity.value - 0.15).abs() < f64::EPSILON);
        assert_eq!(query.variables.len(), 2);
        assert!(query.attributes.is_empty());
    }

    #[test]
    fn baseline_factor_applies_without_costs() {
        let file = QueryFile::from_toml_str(
            r"
            year = 2024
            floor_area_m2 = 100.0
            num_units = 1

            [location]
            latitude = 40.7
            longitude = -74.0
            ",
        )
        .unwrap();

        let query = file.to_query(file.location.unwrap(), 0.31).unwrap();
        assert!((query.costs.emission_rates.electricity.value - 0.31).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_unknown_fields() {
        let result = QueryFile::from_toml_str(
            r"
            year = 2024
            floor_area_m2 = 100.0
            num_units = 1
            floor_area_ft2 = 1076.4
            ",
        );
        assert!(matches!(result, Err(QueryFileError::Toml(_))));
    }

    #[tokio::test]
    async fn missing_location_is_reported() {
        let file = QueryFile::from_toml_str(
            r"
            year = 2024
            floor_area_m2 = 100.0
            num_units = 1
            ",
        )
        .unwrap();
        assert!(matches!(
            file.resolve(None, 0.2889).await,
            Err(QueryFileError::MissingLocation)
        ));
    }
}
