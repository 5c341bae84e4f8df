#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Wire types for the territory translation protocol.
//!
//! A click on the source map becomes a [`CorrelationRequest`] (a single
//! `{lat, lng}` object). The translation service answers with a
//! [`CorrelationResponse`], whose field names and casing are fixed by the
//! existing service. [`Correlation`] is the normalized form the rest of the
//! client works with: every coordinate is a [`LatLng`], including the border
//! points which travel as `[lng, lat]` pairs on the wire.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Path of the translation operation, relative to the page origin.
pub const TRANSLATE_PATH: &str = "/translateLatLngInSourceCountryToLatLngInTargetCountry";

/// A geographic point (WGS84), serialized with the map widget's native keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl LatLng {
    /// Creates a point from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a point from a `[lng, lat]` pair, the order used by
    /// `SourceBorderPoints` (and by `GeoJSON`).
    #[must_use]
    pub const fn from_lng_lat(pair: [f64; 2]) -> Self {
        Self {
            lat: pair[1],
            lng: pair[0],
        }
    }

    /// Returns the point as a `[lng, lat]` pair.
    #[must_use]
    pub const fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

/// The geographic coordinate of a single click on the source map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClickPoint(pub LatLng);

impl ClickPoint {
    /// Creates a click point from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self(LatLng::new(lat, lng))
    }

    /// The clicked coordinate.
    #[must_use]
    pub const fn latlng(self) -> LatLng {
        self.0
    }
}

/// Request body of the translation operation: exactly one point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRequest {
    /// Latitude of the click.
    pub lat: f64,
    /// Longitude of the click.
    pub lng: f64,
}

impl From<ClickPoint> for CorrelationRequest {
    fn from(point: ClickPoint) -> Self {
        Self {
            lat: point.0.lat,
            lng: point.0.lng,
        }
    }
}

impl From<CorrelationRequest> for ClickPoint {
    fn from(request: CorrelationRequest) -> Self {
        Self::new(request.lat, request.lng)
    }
}

impl CorrelationRequest {
    /// Serializes the request body.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails (non-finite
    /// floats are written as `null` by `serde_json`, so in practice this
    /// does not fail).
    pub fn to_body(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a request body.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the body is not a `{lat, lng}`
    /// object.
    pub fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

/// A numeric field as it may appear on the wire.
///
/// The service writes JSON numbers, but the browser client coerced every
/// field with `parseFloat`, so numeric strings are accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireNumber {
    /// A JSON number.
    Number(f64),
    /// A JSON string expected to hold a number.
    Text(String),
}

impl WireNumber {
    /// Returns the finite value, or `None` if the field is not numeric.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for WireNumber {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Response body of the translation operation, exactly as the service
/// sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResponse {
    /// Latitude of the source-region point closest to the click.
    #[serde(rename = "LatClosest")]
    pub lat_closest: WireNumber,
    /// Longitude of the source-region point closest to the click.
    #[serde(rename = "LngClosest")]
    pub lng_closest: WireNumber,
    /// Latitude of the counterpart point in the target region.
    #[serde(rename = "LatTarget")]
    pub lat_target: WireNumber,
    /// Longitude of the counterpart point in the target region.
    #[serde(rename = "LngTarget")]
    pub lng_target: WireNumber,
    /// Relative horizontal position of the click in the source region.
    #[serde(rename = "Xspread")]
    pub x_spread: WireNumber,
    /// Relative vertical position of the click in the source region.
    #[serde(rename = "Yspread")]
    pub y_spread: WireNumber,
    /// Source region outline, grouped into rings. Each point is
    /// `[lng, lat]`; trailing entries such as an altitude are ignored.
    #[serde(rename = "SourceBorderPoints")]
    pub source_border_points: Vec<Vec<Vec<WireNumber>>>,
}

/// Errors from interpreting a response body.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// The body is not valid JSON or does not have the expected shape
    /// (including missing fields).
    #[error("Invalid response JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is present but not a finite number.
    #[error("Field {field} is not numeric")]
    NonNumeric {
        /// Wire name of the offending field.
        field: String,
    },

    /// `SourceBorderPoints` has no group at all.
    #[error("SourceBorderPoints has no groups")]
    EmptyBorder,
}

/// Relative position of the click inside the source region's extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    /// Horizontal ratio, expected in `[0, 1]`.
    pub x: f64,
    /// Vertical ratio, expected in `[0, 1]`.
    pub y: f64,
}

impl Spread {
    /// Whether both ratios lie in `[0, 1]`.
    #[must_use]
    pub fn is_within_unit_square(self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }

    /// Popup text shown on both primary markers, e.g. `Territory X=42 Y=7`.
    #[must_use]
    pub fn territory_label(self) -> String {
        format!(
            "Territory X={} Y={}",
            percent_floor(self.x),
            percent_floor(self.y)
        )
    }
}

#[allow(clippy::cast_possible_truncation)]
fn percent_floor(ratio: f64) -> i64 {
    (100.0 * ratio).floor() as i64
}

/// A fully parsed translation result, every coordinate in `(lat, lng)`
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlation {
    /// Source-region point closest to the click.
    pub closest_source: LatLng,
    /// Counterpart point in the target region.
    pub target: LatLng,
    /// Relative position of the click in the source region.
    pub spread: Spread,
    /// Source region outline, one `Vec` per ring. Never empty.
    pub source_border: Vec<Vec<LatLng>>,
}

impl Correlation {
    /// Parses and validates a raw response body.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError`] if the body is not valid JSON, a required
    /// field is missing or not numeric, or the border structure is empty.
    pub fn from_body(body: &str) -> Result<Self, ResponseError> {
        let response: CorrelationResponse = serde_json::from_str(body)?;
        Self::try_from(response)
    }

    /// The first border group, the only one drawn on the map.
    #[must_use]
    pub fn first_border_group(&self) -> &[LatLng] {
        self.source_border.first().map_or(&[], Vec::as_slice)
    }
}

fn required(value: &WireNumber, field: &str) -> Result<f64, ResponseError> {
    value.value().ok_or_else(|| ResponseError::NonNumeric {
        field: field.to_string(),
    })
}

fn border_point(point: &[WireNumber]) -> Option<LatLng> {
    match point {
        [lng, lat, ..] => Some(LatLng::from_lng_lat([lng.value()?, lat.value()?])),
        _ => None,
    }
}

impl TryFrom<CorrelationResponse> for Correlation {
    type Error = ResponseError;

    fn try_from(response: CorrelationResponse) -> Result<Self, Self::Error> {
        let closest_source = LatLng::new(
            required(&response.lat_closest, "LatClosest")?,
            required(&response.lng_closest, "LngClosest")?,
        );
        let target = LatLng::new(
            required(&response.lat_target, "LatTarget")?,
            required(&response.lng_target, "LngTarget")?,
        );
        let spread = Spread {
            x: required(&response.x_spread, "Xspread")?,
            y: required(&response.y_spread, "Yspread")?,
        };

        let mut groups = response.source_border_points.iter();
        let first = groups
            .next()
            .ok_or(ResponseError::EmptyBorder)?
            .iter()
            .map(|point| {
                border_point(point).ok_or_else(|| ResponseError::NonNumeric {
                    field: "SourceBorderPoints".to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Only the first group is drawn; unusable points elsewhere are dropped.
        let source_border = std::iter::once(first)
            .chain(groups.map(|group| group.iter().filter_map(|p| border_point(p)).collect()))
            .collect();

        Ok(Self {
            closest_source,
            target,
            spread,
            source_border,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_body() -> String {
        serde_json::json!({
            "LatClosest": 48.0,
            "LngClosest": 2.0,
            "LatTarget": 18.5,
            "LngTarget": -72.3,
            "Xspread": 0.42,
            "Yspread": 0.07,
            "SourceBorderPoints": [[[2.1, 48.1], [2.2, 48.2]]]
        })
        .to_string()
    }

    #[test]
    fn request_body_round_trips_click_point() {
        let point = ClickPoint::new(47.123_456, -0.5);
        let body = CorrelationRequest::from(point).to_body().unwrap();
        let parsed: ClickPoint = CorrelationRequest::from_body(&body).unwrap().into();
        assert_eq!(parsed, point);
    }

    #[test]
    fn request_body_uses_lat_lng_keys() {
        let body = CorrelationRequest::from(ClickPoint::new(1.5, 2.5))
            .to_body()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value, serde_json::json!({"lat": 1.5, "lng": 2.5}));
    }

    #[test]
    fn parses_scenario_response() {
        let correlation = Correlation::from_body(&scenario_body()).unwrap();
        assert_eq!(correlation.closest_source, LatLng::new(48.0, 2.0));
        assert_eq!(correlation.target, LatLng::new(18.5, -72.3));
        assert_eq!(correlation.spread.territory_label(), "Territory X=42 Y=7");
    }

    #[test]
    fn border_pairs_are_swapped_from_lng_lat() {
        let correlation = Correlation::from_body(&scenario_body()).unwrap();
        assert_eq!(
            correlation.first_border_group(),
            &[LatLng::new(48.1, 2.1), LatLng::new(48.2, 2.2)]
        );
    }

    #[test]
    fn label_floors_instead_of_rounding() {
        let spread = Spread { x: 0.999, y: 0.0 };
        assert_eq!(spread.territory_label(), "Territory X=99 Y=0");

        let spread = Spread { x: 1.0, y: 0.505 };
        assert_eq!(spread.territory_label(), "Territory X=100 Y=50");
    }

    #[test]
    fn accepts_numeric_strings() {
        let body = serde_json::json!({
            "LatClosest": "48.5",
            "LngClosest": 2,
            "LatTarget": " 18.5 ",
            "LngTarget": -72.3,
            "Xspread": "0.1",
            "Yspread": 0.2,
            "SourceBorderPoints": [[["2.1", "48.1"]]]
        })
        .to_string();
        let correlation = Correlation::from_body(&body).unwrap();
        assert_eq!(correlation.closest_source, LatLng::new(48.5, 2.0));
        assert_eq!(correlation.target.lat, 18.5);
        assert_eq!(correlation.first_border_group(), &[LatLng::new(48.1, 2.1)]);
    }

    #[test]
    fn rejects_non_numeric_field() {
        let body = scenario_body().replace("0.42", "\"abc\"");
        let err = Correlation::from_body(&body).unwrap_err();
        assert!(
            matches!(err, ResponseError::NonNumeric { ref field } if field == "Xspread"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn rejects_missing_field() {
        let body = serde_json::json!({
            "LatClosest": 48.0,
            "LngClosest": 2.0,
            "LatTarget": 18.5,
            "Xspread": 0.42,
            "Yspread": 0.07,
            "SourceBorderPoints": [[]]
        })
        .to_string();
        assert!(matches!(
            Correlation::from_body(&body),
            Err(ResponseError::Json(_))
        ));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            Correlation::from_body("{not json"),
            Err(ResponseError::Json(_))
        ));
    }

    #[test]
    fn empty_first_group_is_valid() {
        let body = scenario_body().replace("[[[2.1,48.1],[2.2,48.2]]]", "[[]]");
        let correlation = Correlation::from_body(&body).unwrap();
        assert!(correlation.first_border_group().is_empty());
    }

    #[test]
    fn malformed_later_group_keeps_first_group() {
        let body = scenario_body().replace(
            "[[[2.1,48.1],[2.2,48.2]]]",
            r#"[[[2.1,48.1],[2.2,48.2]],[["x",1.0],[3.0,49.0],[4.0]]]"#,
        );
        let correlation = Correlation::from_body(&body).unwrap();
        assert_eq!(
            correlation.first_border_group(),
            &[LatLng::new(48.1, 2.1), LatLng::new(48.2, 2.2)]
        );
        assert_eq!(correlation.source_border[1], vec![LatLng::new(49.0, 3.0)]);
    }

    #[test]
    fn border_points_may_carry_altitude() {
        let body = scenario_body().replace("[[[2.1,48.1],[2.2,48.2]]]", "[[[2.1,48.1,0.0]]]");
        let correlation = Correlation::from_body(&body).unwrap();
        assert_eq!(correlation.first_border_group(), &[LatLng::new(48.1, 2.1)]);
    }

    #[test]
    fn rejects_bad_point_in_first_group() {
        for ring in ["[[[2.1,\"x\"]]]", "[[[2.1]]]"] {
            let body = scenario_body().replace("[[[2.1,48.1],[2.2,48.2]]]", ring);
            let err = Correlation::from_body(&body).unwrap_err();
            assert!(
                matches!(err, ResponseError::NonNumeric { ref field } if field == "SourceBorderPoints"),
                "unexpected error for {ring}: {err}"
            );
        }
    }

    #[test]
    fn rejects_border_without_groups() {
        let body = serde_json::json!({
            "LatClosest": 48.0,
            "LngClosest": 2.0,
            "LatTarget": 18.5,
            "LngTarget": -72.3,
            "Xspread": 0.42,
            "Yspread": 0.07,
            "SourceBorderPoints": []
        })
        .to_string();
        assert!(matches!(
            Correlation::from_body(&body),
            Err(ResponseError::EmptyBorder)
        ));
    }

    #[test]
    fn ignores_unknown_fields() {
        let mut value: serde_json::Value = serde_json::from_str(&scenario_body()).unwrap();
        value["X"] = serde_json::json!(12);
        value["TargetBorderPoints"] = serde_json::json!([[[0.0, 0.0]]]);
        assert!(Correlation::from_body(&value.to_string()).is_ok());
    }

    #[test]
    fn spread_range_check() {
        assert!(Spread { x: 0.0, y: 1.0 }.is_within_unit_square());
        assert!(!Spread { x: -0.1, y: 0.5 }.is_within_unit_square());
    }
}
