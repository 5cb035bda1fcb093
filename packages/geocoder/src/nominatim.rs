//! Nominatim / OpenStreetMap search client.
//!
//! The public instance allows at most one request per second. Callers
//! geocode one address per submission, so no throttling happens here.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use crate::{GeocodeError, GeocodedAddress};

/// Geocodes a free-form address.
///
/// Returns `Ok(None)` when Nominatim has no match.
///
/// # Errors
///
/// Returns [`GeocodeError::RateLimited`] on HTTP 429 and
/// [`GeocodeError`] if the HTTP request or response parsing fails.
pub async fn geocode(
    client: &reqwest::Client,
    base_url: &str,
    address: &str,
) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(GeocodeError::Parse {
            message: "address is empty".to_string(),
        });
    }

    log::debug!("Geocoding '{address}' via {base_url}");
    let resp = client
        .get(base_url)
        .query(&[("q", address), ("format", "jsonv2"), ("limit", "1")])
        .send()
        .await?;

    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }

    let resp = resp.error_for_status()?;
    let body: serde_json::Value = resp.json().await?;
    let result = parse_response(&body)?;

    match &result {
        Some(found) => log::info!(
            "Geocoded '{address}' to ({:.5}, {:.5})",
            found.latitude,
            found.longitude
        ),
        None => log::warn!("No geocoding match for '{address}'"),
    }

    Ok(result)
}

/// Parses a Nominatim `jsonv2` search response.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    Ok(Some(GeocodedAddress {
        latitude: coordinate(first, "lat")?,
        longitude: coordinate(first, "lon")?,
        display_name: first["display_name"].as_str().map(String::from),
    }))
}

/// Nominatim returns coordinates as decimal strings.
fn coordinate(result: &serde_json::Value, field: &str) -> Result<f64, GeocodeError> {
    result[field]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| GeocodeError::Parse {
            message: format!("Missing or invalid {field} in Nominatim response"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_result() {
        let body = serde_json::json!([
            {
                "lat": "40.7127281",
                "lon": "-74.0060152",
                "display_name": "City of New York, New York, United States"
            },
            { "lat": "0", "lon": "0" }
        ]);
        let result = parse_response(&body).unwrap().unwrap();
        assert!((result.latitude - 40.712_728_1).abs() < 1e-9);
        assert!((result.longitude - -74.006_015_2).abs() < 1e-9);
        assert_eq!(
            result.display_name.as_deref(),
            Some("City of New York, New York, United States")
        );
        assert!((result.location().latitude - result.latitude).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_result_is_no_match() {
        let body = serde_json::json!([]);
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn numeric_or_missing_coordinates_are_rejected() {
        let body = serde_json::json!([{ "lat": 40.7, "lon": "-74.0" }]);
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));

        let body = serde_json::json!([{ "lat": "nan", "lon": "-74.0" }]);
        assert!(parse_response(&body).is_err());
    }

    #[test]
    fn non_array_body_is_parse_error() {
        let body = serde_json::json!({ "error": "Unable to geocode" });
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }
}
