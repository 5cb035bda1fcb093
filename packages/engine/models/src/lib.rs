#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Building query and building-energy-model (BEM) API wire types.
//!
//! [`BuildingQuery`] is the immutable description of one building
//! submission. [`BuildingQuery::to_request`] turns it into the nested
//! [`EngineRequest`] payload the BEM API expects, and [`EngineResponse`]
//! models what comes back.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Total building emissions (kgCO2) per unit.
pub const VAR_EMISSIONS: &str = "emissions";
/// Electricity consumption (kWh) per unit.
pub const VAR_CONSUMPTION_ELECTRICITY: &str = "consumption.electricity";
/// Fossil fuel consumption per unit.
pub const VAR_CONSUMPTION_FOSSIL_FUEL: &str = "consumption.fossil_fuel";
/// Fossil fuel cost per unit.
pub const VAR_COSTS_FOSSIL_FUEL: &str = "costs.fossil_fuel";
/// Electricity cost per unit.
pub const VAR_COSTS_ELECTRICITY: &str = "costs.electricity";
/// Electricity emissions per unit.
pub const VAR_EMISSIONS_ELECTRICITY: &str = "emissions.electricity";
/// Fossil fuel emissions per unit.
pub const VAR_EMISSIONS_FOSSIL_FUEL: &str = "emissions.fossil_fuel";

/// Variables requested when a query does not name its own.
pub const DEFAULT_VARIABLES: &[&str] = &[
    VAR_EMISSIONS,
    VAR_CONSUMPTION_ELECTRICITY,
    VAR_CONSUMPTION_FOSSIL_FUEL,
    VAR_COSTS_FOSSIL_FUEL,
    VAR_COSTS_ELECTRICITY,
    VAR_EMISSIONS_ELECTRICITY,
    VAR_EMISSIONS_FOSSIL_FUEL,
];

/// Results are always aggregated per calendar year.
pub const GROUP_BY_YEAR: &str = "year";

/// Name of the floor-area attribute sent ahead of the query's attributes.
pub const ATTR_FLOOR_AREA: &str = "floor_area";

/// WGS84 coordinates of the building.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

/// Inclusive timestamp range the engine aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Start of the range.
    pub from_datetime: NaiveDateTime,
    /// End of the range.
    pub to_datetime: NaiveDateTime,
}

impl DateRange {
    /// `YYYY-01-01T00:00:00` through `YYYY-12-31T23:59:59`.
    ///
    /// Returns `None` for years chrono cannot represent.
    #[must_use]
    pub fn calendar_year(year: i32) -> Option<Self> {
        Some(Self {
            from_datetime: NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)?,
            to_datetime: NaiveDate::from_ymd_opt(year, 12, 31)?.and_hms_opt(23, 59, 59)?,
        })
    }
}

/// Value of a named building attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Yes/no attribute (e.g. EV charging).
    Flag(bool),
    /// Whole-number attribute (e.g. number of stories).
    Integer(i64),
    /// Real-valued attribute (e.g. setpoint in °C).
    Number(f64),
    /// Categorical attribute (e.g. wall type).
    Text(String),
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A `{name, value}` pair as the engine expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name (e.g. `"wall_type"`).
    pub name: String,
    /// Attribute value.
    pub value: AttributeValue,
}

impl Attribute {
    /// Creates an attribute.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A rate with optional units annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    /// Rate value.
    pub value: f64,
    /// Units, when the engine wants them spelled out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

/// Electricity and fossil fuel rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelRates {
    /// Electricity rate.
    pub electricity: Rate,
    /// Fossil fuel rate.
    pub fossil_fuel: Rate,
}

/// Emission and utility rate assumptions sent with every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostAssumptions {
    /// Emission rates (electricity in kgCO2/kWh).
    pub emission_rates: FuelRates,
    /// Utility prices.
    pub utility_rates: FuelRates,
}

impl Default for CostAssumptions {
    fn default() -> Self {
        Self {
            emission_rates: FuelRates {
                electricity: Rate {
                    value: 0.2889,
                    units: Some("kgCO2/kWh".to_string()),
                },
                fossil_fuel: Rate {
                    value: 0.059,
                    units: None,
                },
            },
            utility_rates: FuelRates {
                electricity: Rate {
                    value: 0.2521,
                    units: None,
                },
                fossil_fuel: Rate {
                    value: 0.0698,
                    units: None,
                },
            },
        }
    }
}

fn default_variables() -> BTreeSet<String> {
    DEFAULT_VARIABLES.iter().map(|v| (*v).to_string()).collect()
}

/// Everything the engine needs to model one building over one date range.
///
/// Assembled once per submission and passed by value; sweeps derive new
/// queries with the `with_*` methods instead of mutating one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingQuery {
    /// Building coordinates.
    pub location: Location,
    /// Aggregation range.
    pub date_range: DateRange,
    /// Conditioned floor area per unit, in m².
    pub floor_area_m2: f64,
    /// Number of units in the building.
    pub num_units: u32,
    /// Variables to request.
    #[serde(default = "default_variables")]
    pub variables: BTreeSet<String>,
    /// Building attributes in submission order.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Battery storage attributes.
    #[serde(default)]
    pub storage: Vec<Attribute>,
    /// On-site production attributes.
    #[serde(default)]
    pub production: Vec<Attribute>,
    /// Emission and utility rate assumptions.
    #[serde(default)]
    pub costs: CostAssumptions,
}

impl BuildingQuery {
    /// Creates a query with default variables, no attributes and default
    /// cost assumptions.
    #[must_use]
    pub fn new(
        location: Location,
        date_range: DateRange,
        floor_area_m2: f64,
        num_units: u32,
    ) -> Self {
        Self {
            location,
            date_range,
            floor_area_m2,
            num_units,
            variables: default_variables(),
            attributes: Vec::new(),
            storage: Vec::new(),
            production: Vec::new(),
            costs: CostAssumptions::default(),
        }
    }

    /// Returns a copy with the given building attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Returns a copy with the given storage attributes.
    #[must_use]
    pub fn with_storage(mut self, storage: Vec<Attribute>) -> Self {
        self.storage = storage;
        self
    }

    /// Returns a copy with the given production attributes.
    #[must_use]
    pub fn with_production(mut self, production: Vec<Attribute>) -> Self {
        self.production = production;
        self
    }

    /// Returns a copy covering a different date range.
    #[must_use]
    pub fn with_date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = date_range;
        self
    }

    /// Returns a copy at a different location.
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Returns a copy assuming a different electricity emission rate.
    #[must_use]
    pub fn with_electricity_emission_rate(mut self, rate: f64) -> Self {
        self.costs.emission_rates.electricity.value = rate;
        self
    }

    /// Builds the engine request payload.
    ///
    /// The floor area is sent as the first consumption attribute, followed
    /// by the query's attributes in order.
    #[must_use]
    pub fn to_request(&self) -> EngineRequest {
        let mut baseline = Vec::with_capacity(self.attributes.len() + 1);
        baseline.push(Attribute::new(ATTR_FLOOR_AREA, self.floor_area_m2));
        baseline.extend(
            self.attributes
                .iter()
                .filter(|a| a.name != ATTR_FLOOR_AREA)
                .cloned(),
        );

        EngineRequest {
            location: self.location,
            parameters: RequestParameters {
                from_datetime: self.date_range.from_datetime,
                to_datetime: self.date_range.to_datetime,
                variables: self.variables.iter().cloned().collect(),
                group_by: GROUP_BY_YEAR.to_string(),
            },
            consumption: AttributeSection::baseline(baseline),
            storage: AttributeSection::baseline(self.storage.clone()),
            production: AttributeSection::baseline(self.production.clone()),
            costs: self.costs.clone(),
        }
    }
}

/// Request body for the BEM calculate endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineRequest {
    /// Building coordinates.
    pub location: Location,
    /// Date range, variables and grouping.
    pub parameters: RequestParameters,
    /// Consumption-model attributes.
    pub consumption: AttributeSection,
    /// Storage-model attributes.
    pub storage: AttributeSection,
    /// Production-model attributes.
    pub production: AttributeSection,
    /// Rate assumptions.
    pub costs: CostAssumptions,
}

/// `parameters` block of an [`EngineRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestParameters {
    /// Start of the range.
    pub from_datetime: NaiveDateTime,
    /// End of the range.
    pub to_datetime: NaiveDateTime,
    /// Requested variables.
    pub variables: Vec<String>,
    /// Aggregation granularity.
    pub group_by: String,
}

/// `{ "attributes": { "baseline": [...] } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSection {
    /// Attribute scenarios.
    pub attributes: AttributeScenarios,
}

impl AttributeSection {
    /// Wraps attributes as the baseline scenario.
    #[must_use]
    pub const fn baseline(baseline: Vec<Attribute>) -> Self {
        Self {
            attributes: AttributeScenarios { baseline },
        }
    }
}

/// Attribute scenarios of a section. Only the baseline is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeScenarios {
    /// Baseline attributes.
    pub baseline: Vec<Attribute>,
}

/// Response body of the BEM calculate endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResponse {
    /// Payload.
    pub data: EngineData,
}

impl EngineResponse {
    /// Value of the first interval reporting `variable`.
    #[must_use]
    pub fn value(&self, variable: &str) -> Option<f64> {
        self.data
            .intervals
            .iter()
            .find(|i| i.variable == variable)
            .map(|i| i.value)
    }
}

/// `data` block of an [`EngineResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineData {
    /// Jurisdiction and climate metadata, when the engine provides it.
    #[serde(default)]
    pub location: Option<LocationInfo>,
    /// Per-variable, per-interval values.
    #[serde(default)]
    pub intervals: Vec<Interval>,
}

/// One aggregated value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    /// Variable name (e.g. `"emissions"`).
    pub variable: String,
    /// Aggregated value.
    pub value: f64,
    /// Interval start, as reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_datetime: Option<String>,
    /// Interval end, as reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_datetime: Option<String>,
}

/// Location metadata resolved by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationInfo {
    /// Public Use Microdata Area FIPS code.
    #[serde(default, deserialize_with = "string_or_number")]
    pub puma_fips: Option<String>,
    /// County name.
    #[serde(default, deserialize_with = "string_or_number")]
    pub county: Option<String>,
    /// County FIPS code.
    #[serde(default, deserialize_with = "string_or_number")]
    pub county_fips: Option<String>,
    /// State abbreviation.
    #[serde(default, deserialize_with = "string_or_number")]
    pub state: Option<String>,
    /// State FIPS code.
    #[serde(default, deserialize_with = "string_or_number")]
    pub state_fips: Option<String>,
    /// IECC climate zone.
    #[serde(default, deserialize_with = "string_or_number")]
    pub climate_zone: Option<String>,
}

/// FIPS codes and climate zones arrive as strings or bare numbers
/// depending on the endpoint version.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_query() -> BuildingQuery {
        BuildingQuery::new(
            Location {
                latitude: 40.7,
                longitude: -74.0,
            },
            DateRange::calendar_year(2024).unwrap(),
            100.0,
            50,
        )
        .with_attributes(vec![
            Attribute::new("building_type", "Multi-Family (50 or more units)"),
            Attribute::new("num_stories", 6_i64),
            Attribute::new("hvac_cooling_setpoint", 18.4),
            Attribute::new("ev_charging", true),
        ])
        .with_storage(vec![Attribute::new("capacity_recommendation_quantile", 0.3)])
        .with_production(vec![Attribute::new("capacity", 0.0)])
    }

    #[test]
    fn calendar_year_spans_whole_year() {
        let range = DateRange::calendar_year(2031).unwrap();
        assert_eq!(range.from_datetime.to_string(), "2031-01-01 00:00:00");
        assert_eq!(range.to_datetime.to_string(), "2031-12-31 23:59:59");
    }

    #[test]
    fn request_matches_engine_payload_shape() {
        let json = serde_json::to_value(sample_query().to_request()).unwrap();

        assert_eq!(json["location"]["latitude"], 40.7);
        assert_eq!(json["parameters"]["from_datetime"], "2024-01-01T00:00:00");
        assert_eq!(json["parameters"]["to_datetime"], "2024-12-31T23:59:59");
        assert_eq!(json["parameters"]["group_by"], "year");
        assert_eq!(
            json["parameters"]["variables"].as_array().unwrap().len(),
            DEFAULT_VARIABLES.len()
        );

        let baseline = json["consumption"]["attributes"]["baseline"]
            .as_array()
            .unwrap();
        assert_eq!(
            baseline[0],
            serde_json::json!({ "name": "floor_area", "value": 100.0 })
        );
        assert_eq!(baseline[1]["name"], "building_type");
        assert_eq!(baseline[2]["value"], 6);
        assert_eq!(baseline[4]["value"], true);

        assert_eq!(
            json["storage"]["attributes"]["baseline"][0]["name"],
            "capacity_recommendation_quantile"
        );
        assert_eq!(
            json["costs"]["emission_rates"]["electricity"],
            serde_json::json!({ "value": 0.2889, "units": "kgCO2/kWh" })
        );
        assert_eq!(
            json["costs"]["utility_rates"]["fossil_fuel"],
            serde_json::json!({ "value": 0.0698 })
        );
    }

    #[test]
    fn explicit_floor_area_attribute_is_not_duplicated() {
        let query = sample_query().with_attributes(vec![Attribute::new("floor_area", 5.0)]);
        let request = query.to_request();
        let baseline = &request.consumption.attributes.baseline;
        assert_eq!(baseline.len(), 1);
        assert_eq!(baseline[0].value, AttributeValue::Number(100.0));
    }

    #[test]
    fn rate_override_leaves_original_untouched() {
        let original = sample_query();
        let swept = original.clone().with_electricity_emission_rate(0.15);
        assert!((original.costs.emission_rates.electricity.value - 0.2889).abs() < f64::EPSILON);
        assert!((swept.costs.emission_rates.electricity.value - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_response_with_numeric_fips() {
        let response: EngineResponse = serde_json::from_value(serde_json::json!({
            "data": {
                "location": {
                    "puma_fips": "3603808",
                    "county": "New York County",
                    "county_fips": 36061,
                    "state": "NY",
                    "climate_zone": "4A"
                },
                "intervals": [
                    { "variable": "emissions", "value": 8000.0,
                      "from_datetime": "2024-01-01T00:00:00" },
                    { "variable": "consumption.electricity", "value": 12000.5 },
                    { "variable": "emissions", "value": 1.0 }
                ]
            }
        }))
        .unwrap();

        let location = response.data.location.as_ref().unwrap();
        assert_eq!(location.county_fips.as_deref(), Some("36061"));
        assert_eq!(location.state_fips, None);
        assert_eq!(response.value(VAR_EMISSIONS), Some(8000.0));
        assert_eq!(response.value(VAR_CONSUMPTION_ELECTRICITY), Some(12000.5));
        assert_eq!(response.value(VAR_EMISSIONS_FOSSIL_FUEL), None);
    }

    #[test]
    fn attribute_values_deserialize_by_shape() {
        let attrs: Vec<Attribute> = serde_json::from_value(serde_json::json!([
            { "name": "a", "value": true },
            { "name": "b", "value": 30 },
            { "name": "c", "value": 23.5 },
            { "name": "d", "value": "Brick" }
        ]))
        .unwrap();
        assert_eq!(attrs[0].value, AttributeValue::Flag(true));
        assert_eq!(attrs[1].value, AttributeValue::Integer(30));
        assert_eq!(attrs[2].value, AttributeValue::Number(23.5));
        assert_eq!(attrs[3].value, AttributeValue::Text("Brick".to_string()));
    }
}
