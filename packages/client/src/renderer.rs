//! Response renderer: draws one translation result on both map views.
//!
//! The body is parsed completely before the first drawing call, so a
//! malformed response leaves both views untouched.

use tkv_map_view::{IconSpec, MapView, MapViewError, MarkerOptions};
use tkv_translate_models::Correlation;

use crate::RenderError;

/// What a successful render drew.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    /// Popup text shown on both primary markers.
    pub label: String,
    /// Markers with a popup: one per view.
    pub primary_markers: usize,
    /// Border markers drawn on the source view.
    pub border_markers: usize,
}

/// Draws translation results.
#[derive(Debug, Clone)]
pub struct ResponseRenderer {
    border_icon: IconSpec,
}

impl ResponseRenderer {
    /// Creates a renderer that uses `border_icon` for border markers.
    #[must_use]
    pub const fn new(border_icon: IconSpec) -> Self {
        Self { border_icon }
    }

    /// Parses a raw response body and draws it.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Parse`] (with nothing drawn) if the body is
    /// malformed, or [`RenderError::View`] if a view rejects an operation.
    pub fn render(
        &self,
        body: &str,
        source: &mut dyn MapView,
        target: &mut dyn MapView,
    ) -> Result<RenderSummary, RenderError> {
        let correlation = Correlation::from_body(body)?;
        log::debug!(
            "Translation answer: spread x={} y={}",
            correlation.spread.x,
            correlation.spread.y
        );
        Ok(self.draw(&correlation, source, target)?)
    }

    /// Draws an already parsed result.
    ///
    /// Order: source marker with open popup, target marker with open popup,
    /// then one passive marker per point of the first border group.
    ///
    /// # Errors
    ///
    /// Returns [`MapViewError`] if a view rejects a popup operation.
    pub fn draw(
        &self,
        correlation: &Correlation,
        source: &mut dyn MapView,
        target: &mut dyn MapView,
    ) -> Result<RenderSummary, MapViewError> {
        if !correlation.spread.is_within_unit_square() {
            log::warn!(
                "Spread out of range: x={} y={}",
                correlation.spread.x,
                correlation.spread.y
            );
        }

        let label = correlation.spread.territory_label();

        let marker = source.add_marker(correlation.closest_source, MarkerOptions::default());
        source.bind_popup(marker, &label)?;
        source.open_popup(marker)?;

        let marker = target.add_marker(correlation.target, MarkerOptions::default());
        target.bind_popup(marker, &label)?;
        target.open_popup(marker)?;

        let border = correlation.first_border_group();
        for point in border {
            source.add_marker(*point, MarkerOptions::passive(self.border_icon.clone()));
        }

        Ok(RenderSummary {
            label,
            primary_markers: 2,
            border_markers: border.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use tkv_map_view::HeadlessMapView;
    use tkv_map_view::registry::border_icon;
    use tkv_translate_models::LatLng;

    use super::*;

    fn views() -> (HeadlessMapView, HeadlessMapView) {
        (HeadlessMapView::new("source"), HeadlessMapView::new("target"))
    }

    fn body(x: f64, y: f64, border: &serde_json::Value) -> String {
        serde_json::json!({
            "LatClosest": 48.0,
            "LngClosest": 2.0,
            "LatTarget": 18.5,
            "LngTarget": -72.3,
            "Xspread": x,
            "Yspread": y,
            "SourceBorderPoints": border
        })
        .to_string()
    }

    #[test]
    fn renders_scenario() {
        let renderer = ResponseRenderer::new(border_icon());
        let (mut source, mut target) = views();
        let border = serde_json::json!([[[2.1, 48.1], [2.2, 48.2]]]);

        let summary = renderer
            .render(&body(0.42, 0.07, &border), &mut source, &mut target)
            .unwrap();
        assert_eq!(summary.label, "Territory X=42 Y=7");

        let primary = &source.markers()[0];
        assert_eq!(primary.position, LatLng::new(48.0, 2.0));
        assert_eq!(primary.popup.as_deref(), Some("Territory X=42 Y=7"));
        assert_eq!(source.open_popup_marker().unwrap().id, primary.id);

        assert_eq!(target.markers().len(), 1);
        let counterpart = &target.markers()[0];
        assert_eq!(counterpart.position, LatLng::new(18.5, -72.3));
        assert_eq!(counterpart.popup.as_deref(), Some("Territory X=42 Y=7"));
        assert_eq!(target.open_popup_marker().unwrap().id, counterpart.id);

        let icon = border_icon();
        let border: Vec<LatLng> = source
            .markers()
            .iter()
            .filter(|m| m.options.icon.as_ref() == Some(&icon))
            .map(|m| m.position)
            .collect();
        assert_eq!(border, vec![LatLng::new(48.1, 2.1), LatLng::new(48.2, 2.2)]);
        assert!(source.markers()[1..].iter().all(|m| !m.options.interactive));
        assert!(source.markers()[1..].iter().all(|m| m.popup.is_none()));
    }

    #[test]
    fn marker_count_follows_first_border_group() {
        let renderer = ResponseRenderer::new(border_icon());

        for len in [0_u32, 1, 7, 250] {
            let ring: Vec<[f64; 2]> = (0..len)
                .map(|i| [2.0 + f64::from(i) / 1000.0, 48.0])
                .collect();
            let len = ring.len();
            let border = serde_json::json!([ring, [[9.0, 9.0], [9.5, 9.5]]]);
            let (mut source, mut target) = views();

            let summary = renderer
                .render(&body(0.5, 0.5, &border), &mut source, &mut target)
                .unwrap();

            assert_eq!(summary.primary_markers, 2);
            assert_eq!(summary.border_markers, len);
            assert_eq!(source.markers().len(), 1 + len);
            assert_eq!(target.markers().len(), 1);
        }
    }

    #[test]
    fn primary_markers_keep_lat_lng_order_and_border_markers_swap() {
        let renderer = ResponseRenderer::new(border_icon());
        let (mut source, mut target) = views();
        let border = serde_json::json!([[[10.0, 20.0]]]);

        renderer
            .render(&body(0.1, 0.2, &border), &mut source, &mut target)
            .unwrap();

        // LatClosest/LngClosest are used as-is.
        assert_eq!(source.markers()[0].position, LatLng::new(48.0, 2.0));
        // [lng, lat] on the wire.
        assert_eq!(source.markers()[1].position, LatLng::new(20.0, 10.0));
    }

    #[test]
    fn malformed_body_draws_nothing() {
        let renderer = ResponseRenderer::new(border_icon());
        let (mut source, mut target) = views();

        let err = renderer
            .render("{\"LatClosest\": 48.0", &mut source, &mut target)
            .unwrap_err();
        assert!(matches!(err, RenderError::Parse(_)));

        let missing_target = serde_json::json!({
            "LatClosest": 48.0,
            "LngClosest": 2.0,
            "Xspread": 0.3,
            "Yspread": 0.3,
            "SourceBorderPoints": [[[2.1, 48.1]]]
        })
        .to_string();
        assert!(renderer.render(&missing_target, &mut source, &mut target).is_err());

        assert!(source.markers().is_empty());
        assert!(target.markers().is_empty());
    }

    #[test]
    fn rendering_twice_accumulates() {
        let renderer = ResponseRenderer::new(border_icon());
        let (mut source, mut target) = views();
        let body = body(0.999, 0.0, &serde_json::json!([[[2.1, 48.1]]]));

        let first = renderer.render(&body, &mut source, &mut target).unwrap();
        let second = renderer.render(&body, &mut source, &mut target).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.label, "Territory X=99 Y=0");
        assert_eq!(source.markers().len(), 4);
        assert_eq!(target.markers().len(), 2);
        // The latest popup is the open one.
        assert_eq!(target.open_popup_marker().unwrap().id, target.markers()[1].id);
    }
}
