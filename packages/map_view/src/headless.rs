//! In-memory map view.
//!
//! Records everything drawn on it so a scene can be inspected or exported
//! as a `GeoJSON` `FeatureCollection` (markers become `Point` features in
//! `[lng, lat]` order).

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use tkv_translate_models::LatLng;

use crate::{MapView, MapViewConfig, MapViewError, MarkerId, MarkerOptions, TileLayerSpec};

/// A marker recorded by a [`HeadlessMapView`].
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Handle returned when the marker was added.
    pub id: MarkerId,
    /// Marker location.
    pub position: LatLng,
    /// Options the marker was created with.
    pub options: MarkerOptions,
    /// Bound popup text, if any.
    pub popup: Option<String>,
}

/// A map view that keeps its scene in memory.
#[derive(Debug, Clone, Default)]
pub struct HeadlessMapView {
    mount: String,
    center: Option<LatLng>,
    zoom: Option<u8>,
    tile_layers: Vec<TileLayerSpec>,
    markers: Vec<Marker>,
    open_popup: Option<MarkerId>,
}

impl HeadlessMapView {
    /// Creates an empty view attached to `mount`.
    #[must_use]
    pub fn new(mount: impl Into<String>) -> Self {
        Self {
            mount: mount.into(),
            ..Self::default()
        }
    }

    /// Creates a view and applies the bootstrap configuration to it.
    #[must_use]
    pub fn from_config(config: &MapViewConfig) -> Self {
        let mut view = Self::new(config.mount.clone());
        config.apply(&mut view);
        view
    }

    /// Current center, once [`MapView::set_view`] has been called.
    #[must_use]
    pub const fn center(&self) -> Option<LatLng> {
        self.center
    }

    /// Current zoom, once [`MapView::set_view`] has been called.
    #[must_use]
    pub const fn zoom(&self) -> Option<u8> {
        self.zoom
    }

    /// Tile layers in the order they were added.
    #[must_use]
    pub fn tile_layers(&self) -> &[TileLayerSpec] {
        &self.tile_layers
    }

    /// All markers in creation order.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Looks up a marker by handle.
    #[must_use]
    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.get(id.0)
    }

    /// The marker whose popup is currently open.
    #[must_use]
    pub fn open_popup_marker(&self) -> Option<&Marker> {
        self.open_popup.and_then(|id| self.marker(id))
    }

    /// Exports the markers as a `GeoJSON` feature collection.
    #[must_use]
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .markers
            .iter()
            .map(|marker| {
                let mut properties = JsonObject::new();
                properties.insert("mount".to_string(), self.mount.clone().into());
                properties.insert("interactive".to_string(), marker.options.interactive.into());
                if let Some(popup) = &marker.popup {
                    properties.insert("popup".to_string(), popup.clone().into());
                    properties.insert(
                        "popupOpen".to_string(),
                        (self.open_popup == Some(marker.id)).into(),
                    );
                }
                if let Some(icon) = &marker.options.icon {
                    properties.insert("icon".to_string(), icon.url.clone().into());
                }

                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Point(
                        marker.position.to_lng_lat().to_vec(),
                    ))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    fn check(&self, marker: MarkerId) -> Result<usize, MapViewError> {
        if marker.0 < self.markers.len() {
            Ok(marker.0)
        } else {
            Err(MapViewError::UnknownMarker {
                mount: self.mount.clone(),
                marker,
            })
        }
    }
}

impl MapView for HeadlessMapView {
    fn mount(&self) -> &str {
        &self.mount
    }

    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.center = Some(center);
        self.zoom = Some(zoom);
    }

    fn add_tile_layer(&mut self, layer: TileLayerSpec) {
        self.tile_layers.push(layer);
    }

    fn add_marker(&mut self, at: LatLng, options: MarkerOptions) -> MarkerId {
        let id = MarkerId(self.markers.len());
        self.markers.push(Marker {
            id,
            position: at,
            options,
            popup: None,
        });
        id
    }

    fn bind_popup(&mut self, marker: MarkerId, text: &str) -> Result<(), MapViewError> {
        let idx = self.check(marker)?;
        self.markers[idx].popup = Some(text.to_string());
        Ok(())
    }

    fn open_popup(&mut self, marker: MarkerId) -> Result<(), MapViewError> {
        let idx = self.check(marker)?;
        if self.markers[idx].popup.is_some() {
            self.open_popup = Some(marker);
        } else {
            log::debug!("{marker} on '{}' has no popup to open", self.mount);
        }
        Ok(())
    }
}
