#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map view capability boundary.
//!
//! The translation client draws on two map widgets, a source and a target.
//! It only needs a handful of operations from them, captured by the
//! [`MapView`] trait:
//!
//! - [`MapView::set_view`] and [`MapView::add_tile_layer`] for bootstrap,
//! - [`MapView::add_marker`] to place a marker and get its handle,
//! - [`MapView::bind_popup`] / [`MapView::open_popup`] on a marker.
//!
//! Any widget offering these can be plugged in. [`headless::HeadlessMapView`]
//! keeps the scene in memory and exports it as `GeoJSON`, which is what the
//! CLI and the tests use.
//!
//! View bootstrap configuration ([`MapViewConfig`]) and the border marker
//! icon are embedded TOML files, see [`registry`].

pub mod headless;
pub mod registry;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tkv_translate_models::LatLng;

pub use headless::HeadlessMapView;

/// Handle to a marker, valid only on the view that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(pub usize);

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

/// A raster tile layer definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayerSpec {
    /// URL template with `{z}`, `{x}`, `{y}` and optionally `{id}` and
    /// `{accessToken}` placeholders.
    pub url_template: String,
    /// Attribution HTML shown by the widget.
    pub attribution: String,
    /// Maximum zoom level served by the provider.
    pub max_zoom: u8,
    /// Provider layer id substituted for `{id}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Provider access token substituted for `{accessToken}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl TileLayerSpec {
    /// Expands the URL template for a single tile.
    #[must_use]
    pub fn tile_url(&self, z: u8, x: u32, y: u32) -> String {
        self.url_template
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
            .replace("{id}", self.id.as_deref().unwrap_or_default())
            .replace(
                "{accessToken}",
                self.access_token.as_deref().unwrap_or_default(),
            )
    }
}

/// A fixed-size marker icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconSpec {
    /// Image URL, relative to the page.
    pub url: String,
    /// Icon size in pixels, `[width, height]`.
    pub size: [u32; 2],
    /// Pixel of the icon placed on the marker's location, `[x, y]`.
    pub anchor: [i32; 2],
}

/// Options for a new marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerOptions {
    /// Custom icon; `None` uses the widget's default marker.
    pub icon: Option<IconSpec>,
    /// Whether the marker reacts to pointer events.
    pub interactive: bool,
}

impl Default for MarkerOptions {
    fn default() -> Self {
        Self {
            icon: None,
            interactive: true,
        }
    }
}

impl MarkerOptions {
    /// Options for a small, non-interactive marker with the given icon.
    #[must_use]
    pub const fn passive(icon: IconSpec) -> Self {
        Self {
            icon: Some(icon),
            interactive: false,
        }
    }
}

/// Errors from map view operations.
#[derive(Debug, Error)]
pub enum MapViewError {
    /// The marker handle was not issued by this view.
    #[error("Unknown {marker} on map view '{mount}'")]
    UnknownMarker {
        /// Mount point of the view.
        mount: String,
        /// The offending handle.
        marker: MarkerId,
    },

    /// A view or icon configuration could not be parsed.
    #[error("Invalid map view configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// The operations the translation client needs from a map widget.
pub trait MapView {
    /// Name of the mount point the view is attached to (e.g. `"source"`).
    fn mount(&self) -> &str;

    /// Centers the view on `center` at `zoom`.
    fn set_view(&mut self, center: LatLng, zoom: u8);

    /// Adds a tile layer to the view.
    fn add_tile_layer(&mut self, layer: TileLayerSpec);

    /// Places a marker and returns its handle.
    fn add_marker(&mut self, at: LatLng, options: MarkerOptions) -> MarkerId;

    /// Attaches popup text to a marker, replacing any previous popup.
    ///
    /// # Errors
    ///
    /// Returns [`MapViewError::UnknownMarker`] if `marker` is not a handle
    /// issued by this view.
    fn bind_popup(&mut self, marker: MarkerId, text: &str) -> Result<(), MapViewError>;

    /// Opens the marker's popup. Opening a popup closes the one currently
    /// open on the same view. A marker without a bound popup is left as is.
    ///
    /// # Errors
    ///
    /// Returns [`MapViewError::UnknownMarker`] if `marker` is not a handle
    /// issued by this view.
    fn open_popup(&mut self, marker: MarkerId) -> Result<(), MapViewError>;
}

/// Bootstrap configuration of one map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapViewConfig {
    /// Mount point name.
    pub mount: String,
    /// Initial center.
    pub center: LatLng,
    /// Initial zoom level.
    pub zoom: u8,
    /// Base tile layer.
    pub tile_layer: TileLayerSpec,
}

impl MapViewConfig {
    /// Parses a view configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`MapViewError::Config`] if the TOML is malformed or lacks a
    /// required key.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, MapViewError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Applies the bootstrap to a view: initial center/zoom and tile layer.
    pub fn apply(&self, view: &mut dyn MapView) {
        log::debug!(
            "Bootstrapping map view '{}' at {} zoom {}",
            view.mount(),
            self.center,
            self.zoom
        );
        view.set_view(self.center, self.zoom);
        view.add_tile_layer(self.tile_layer.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> TileLayerSpec {
        TileLayerSpec {
            url_template: "https://tiles.example/{id}/{z}/{x}/{y}.png?access_token={accessToken}"
                .to_string(),
            attribution: "example".to_string(),
            max_zoom: 18,
            id: Some("streets".to_string()),
            access_token: Some("secret".to_string()),
        }
    }

    #[test]
    fn expands_tile_url() {
        assert_eq!(
            layer().tile_url(5, 16, 11),
            "https://tiles.example/streets/5/16/11.png?access_token=secret"
        );
    }

    #[test]
    fn missing_token_expands_to_empty() {
        let mut layer = layer();
        layer.access_token = None;
        assert!(layer.tile_url(1, 0, 0).ends_with("access_token="));
    }

    #[test]
    fn config_apply_sets_view_and_layer() {
        let config = MapViewConfig {
            mount: "source".to_string(),
            center: LatLng::new(47.0, 0.0),
            zoom: 5,
            tile_layer: layer(),
        };
        let mut view = HeadlessMapView::new("source");
        config.apply(&mut view);

        assert_eq!(view.center(), Some(LatLng::new(47.0, 0.0)));
        assert_eq!(view.zoom(), Some(5));
        assert_eq!(view.tile_layers(), &[layer()]);
    }

    #[test]
    fn passive_marker_options() {
        let icon = IconSpec {
            url: "dot.png".to_string(),
            size: [3, 3],
            anchor: [1, 1],
        };
        let options = MarkerOptions::passive(icon.clone());
        assert!(!options.interactive);
        assert_eq!(options.icon, Some(icon));
        assert!(MarkerOptions::default().interactive);
    }

    #[test]
    fn rejects_incomplete_view_config() {
        let err = MapViewConfig::from_toml_str("mount = \"source\"\nzoom = 5\n").unwrap_err();
        assert!(matches!(err, MapViewError::Config(_)));
    }
}
