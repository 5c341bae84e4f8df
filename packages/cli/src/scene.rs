//! Parsing clicks from text and writing rendered scenes.

use std::path::Path;

use tkv_map_view::HeadlessMapView;
use tkv_translate_models::ClickPoint;

/// Parses a click written as `lat,lng` or `lat lng`.
///
/// # Errors
///
/// Returns a message if the line does not hold exactly two finite numbers
/// or the latitude is outside `[-90, 90]`.
pub fn parse_click(line: &str) -> Result<ClickPoint, String> {
    let parts: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();

    let [lat, lng] = parts.as_slice() else {
        return Err(format!("Expected 'lat,lng', got '{}'", line.trim()));
    };

    let lat: f64 = lat.parse().map_err(|_| format!("Invalid latitude '{lat}'"))?;
    let lng: f64 = lng.parse().map_err(|_| format!("Invalid longitude '{lng}'"))?;

    if !lat.is_finite() || !lng.is_finite() {
        return Err(format!("Coordinates must be finite, got '{}'", line.trim()));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("Latitude {lat} is out of range"));
    }

    Ok(ClickPoint::new(lat, lng))
}

/// Both views as one JSON document of `GeoJSON` feature collections.
#[must_use]
pub fn scene_json(source: &HeadlessMapView, target: &HeadlessMapView) -> serde_json::Value {
    serde_json::json!({
        "source": source.to_feature_collection(),
        "target": target.to_feature_collection(),
    })
}

/// Prints the scene to stdout, or writes it to `out`.
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
pub fn write_scene(
    source: &HeadlessMapView,
    target: &HeadlessMapView,
    out: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = serde_json::to_string_pretty(&scene_json(source, target))?;
    match out {
        Some(path) => {
            std::fs::write(path, text)?;
            log::info!("Wrote scene to {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}
