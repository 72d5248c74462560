use crossbeam_channel::Receiver;
use mapbridge::{
    core::projection::WebMercator,
    engine::{
        google::{GoogleMapsOptions, MapTypeId, STANDARD_CONTROLS as GOOGLE_CONTROLS},
        leaflet::{LeafletOptions, STANDARD_CONTROLS as LEAFLET_CONTROLS},
        openlayers::{OpenLayersOptions, STANDARD_CONTROLS as OL_CONTROLS},
    },
    host::{HeadlessNode, PreloadedLoader},
    widget::{BindOutcome, PropertyOutcome, WidgetPhase},
    DispatchOutcome, GoogleMapsEngine, LatLng, LeafletEngine, MapEngine, MapEvent, MapState,
    MapType, MapWidget, MapWidgetBuilder, OpenLayersEngine,
};
use serde_json::json;

/// Marker/state synchronization scenarios, run against every engine
#[cfg(test)]
mod sync_protocol_tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Builds and binds a widget whose library is already on the page
    fn bound<E: MapEngine>(options: E::Options) -> (MapWidget<E>, Receiver<MapEvent>) {
        init_logging();
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut widget = MapWidgetBuilder::<E>::new()
            .with_state(MapState::new(40.4168, -3.7038, 10))
            .with_options(options)
            .with_sink(tx)
            .build();

        let mut node = HeadlessNode::new("map");
        let loader = PreloadedLoader::available();
        assert!(matches!(widget.bind(&mut node, &loader), BindOutcome::Bound));
        (widget, rx)
    }

    fn google_options() -> GoogleMapsOptions {
        GoogleMapsOptions::with_api_key("test-key")
    }

    fn titles<E: MapEngine>(widget: &MapWidget<E>) -> Vec<String> {
        widget.registry().iter().map(|r| r.title.clone()).collect()
    }

    // --- add / remove ----------------------------------------------------------------------------

    fn add_then_remove_first<E: MapEngine>(options: E::Options) {
        let (mut widget, _rx) = bound::<E>(options);

        widget.service("addMarker", &json!({"lat": 41.0, "lng": -3.0, "title": "A", "description": ""}));
        widget.service("addMarker", &json!({"lat": 42.0, "lng": -2.0, "title": "B", "description": "desc"}));

        let indices: Vec<_> = widget.registry().iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1]);

        widget.service("removeMarker", &json!({"index": 0}));
        assert_eq!(widget.registry().len(), 1);
        let remaining = widget.registry().get(0).unwrap();
        assert_eq!(remaining.index, 0);
        assert_eq!(remaining.title, "B");
        assert_eq!(remaining.description, "desc");
    }

    #[test]
    fn test_add_remove_openlayers() {
        add_then_remove_first::<OpenLayersEngine>(OpenLayersOptions::default());
    }

    #[test]
    fn test_add_remove_google() {
        add_then_remove_first::<GoogleMapsEngine>(google_options());
    }

    #[test]
    fn test_add_remove_leaflet() {
        add_then_remove_first::<LeafletEngine>(LeafletOptions::default());
    }

    #[test]
    fn test_engine_objects_follow_registry() {
        let (mut widget, _rx) = bound::<OpenLayersEngine>(OpenLayersOptions::default());
        for i in 0..4 {
            widget.add_marker(LatLng::new(40.0 + i as f64, -3.0), format!("m{}", i), "");
        }
        widget.remove_marker(1);
        widget.remove_marker(7);

        let engine = widget.engine().unwrap();
        assert_eq!(engine.feature_count(), 3);
        for record in widget.registry().iter() {
            assert_eq!(engine.feature(record.handle).unwrap().index, record.index);
        }
        assert_eq!(titles(&widget), vec!["m0", "m2", "m3"]);
    }

    #[test]
    fn test_clear_twice() {
        let (mut widget, _rx) = bound::<LeafletEngine>(LeafletOptions::default());
        widget.add_marker(LatLng::new(1.0, 1.0), "A", "");
        widget.add_marker(LatLng::new(2.0, 2.0), "B", "");

        assert_eq!(widget.clear_markers(), DispatchOutcome::Applied);
        assert!(widget.registry().is_empty());
        assert_eq!(widget.clear_markers(), DispatchOutcome::Applied);
        assert!(widget.registry().is_empty());
        assert_eq!(widget.engine().unwrap().marker_count(), 0);
    }

    // --- viewport --------------------------------------------------------------------------------

    #[test]
    fn test_set_map_view_bound() {
        let (mut widget, _rx) = bound::<LeafletEngine>(LeafletOptions::default());
        widget.service("setMapView", &json!({"lat": 48.8566, "lng": 2.3522, "zoom": 14}));

        let engine = widget.engine().unwrap();
        assert_eq!(engine.center(), [48.8566, 2.3522]);
        assert_eq!(engine.zoom(), 14);
        assert_eq!(widget.state().center(), LatLng::new(48.8566, 2.3522));
        assert_eq!(widget.state().zoom, 14);
    }

    #[test]
    fn test_set_map_view_openlayers_projects_center() {
        let (mut widget, _rx) = bound::<OpenLayersEngine>(OpenLayersOptions::default());
        widget.set_map_view(LatLng::new(48.8566, 2.3522), 14);

        let view = widget.engine().unwrap().view();
        let expected = LatLng::new(48.8566, 2.3522).to_mercator();
        assert!((view.center.x - expected.x).abs() < 1e-6);
        assert!((view.center.y - expected.y).abs() < 1e-6);
        assert_eq!(view.zoom, 14);
    }

    #[test]
    fn test_set_map_view_unbound_is_noop() {
        init_logging();
        let mut widget = MapWidgetBuilder::<GoogleMapsEngine>::new()
            .with_options(google_options())
            .build();

        let outcome = widget.service("setMapView", &json!({"lat": 48.8566, "lng": 2.3522, "zoom": 14}));
        assert_eq!(outcome, DispatchOutcome::Ignored);
        assert_eq!(widget.state(), &MapState::default());
        assert!(widget.engine().is_none());
    }

    #[test]
    fn test_latitude_property_moves_center() {
        let (mut widget, _rx) = bound::<GoogleMapsEngine>(google_options());
        assert_eq!(widget.set_property("latitude", &json!(10.5)), PropertyOutcome::Applied);
        assert_eq!(widget.engine().unwrap().center(), LatLng::new(10.5, -3.7038));
        assert_eq!(widget.engine().unwrap().zoom(), 10);
    }

    // --- controls and base layers ----------------------------------------------------------------

    #[test]
    fn test_controls_removed_as_unit_openlayers() {
        let (mut widget, _rx) = bound::<OpenLayersEngine>(OpenLayersOptions::default());
        assert_eq!(widget.engine().unwrap().controls().installed(), OL_CONTROLS);

        widget.set_property("showControls", &json!(false));
        assert!(widget.engine().unwrap().controls().installed().is_empty());

        widget.set_show_controls(true);
        assert_eq!(widget.engine().unwrap().controls().installed(), OL_CONTROLS);
    }

    #[test]
    fn test_controls_removed_as_unit_google() {
        let (mut widget, _rx) = bound::<GoogleMapsEngine>(google_options());
        assert_eq!(widget.engine().unwrap().controls().installed(), GOOGLE_CONTROLS);

        widget.set_property("showControls", &json!(false));
        assert!(widget.engine().unwrap().controls().installed().is_empty());

        widget.set_property("showControls", &json!(true));
        assert_eq!(widget.engine().unwrap().controls().installed(), GOOGLE_CONTROLS);
    }

    #[test]
    fn test_controls_removed_as_unit_leaflet() {
        let (mut widget, _rx) = bound::<LeafletEngine>(LeafletOptions::default());
        assert_eq!(widget.engine().unwrap().controls().installed(), LEAFLET_CONTROLS);
        widget.set_show_controls(false);
        assert!(!widget.engine().unwrap().controls().is_visible());
    }

    #[test]
    fn test_map_type_switch_keeps_markers() {
        let (mut widget, _rx) = bound::<OpenLayersEngine>(OpenLayersOptions::default());
        widget.add_marker(LatLng::new(41.0, -3.0), "A", "");

        widget.set_property("mapType", &json!("satellite"));
        widget.set_property("mapType", &json!("terrain"));
        widget.set_property("mapType", &json!("osm"));

        let engine = widget.engine().unwrap();
        assert_eq!(engine.base_layers().active(), Some(MapType::Standard));
        assert_eq!(engine.base_layers().len(), 3);
        assert_eq!(engine.feature_count(), 1);
        assert_eq!(widget.registry().len(), 1);
    }

    #[test]
    fn test_map_type_switch_keeps_markers_google() {
        let (mut widget, _rx) = bound::<GoogleMapsEngine>(google_options());
        widget.add_marker(LatLng::new(41.0, -3.0), "A", "");
        widget.add_marker(LatLng::new(42.0, -2.0), "B", "desc");

        widget.set_property("mapType", &json!("satellite"));
        assert_eq!(widget.engine().unwrap().map_type_id(), MapTypeId::Satellite);
        widget.set_property("mapType", &json!("hybrid"));
        assert_eq!(widget.engine().unwrap().map_type_id(), MapTypeId::Hybrid);
        widget.set_property("mapType", &json!("terrain"));
        widget.set_property("mapType", &json!("roadmap"));

        let engine = widget.engine().unwrap();
        assert_eq!(engine.map_type_id(), MapTypeId::Roadmap);
        assert_eq!(engine.marker_count(), 2);
        assert_eq!(titles(&widget), vec!["A", "B"]);
    }

    #[test]
    fn test_unknown_map_type_falls_back() {
        let (mut widget, _rx) = bound::<LeafletEngine>(LeafletOptions::default());
        widget.set_property("mapType", &json!("watercolor"));
        assert_eq!(
            widget.engine().unwrap().tile_layers().active(),
            Some(MapType::Standard)
        );
    }

    // --- events ----------------------------------------------------------------------------------

    fn click_on_marker<E: MapEngine>(options: E::Options) {
        let (mut widget, rx) = bound::<E>(options);
        let index = widget.add_marker(LatLng::new(41.0, -3.0), "A", "").unwrap();

        widget.click_at(LatLng::new(41.0, -3.0));

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events, vec![MapEvent::MarkerClick { marker_index: index }]);
    }

    #[test]
    fn test_marker_click_openlayers() {
        click_on_marker::<OpenLayersEngine>(OpenLayersOptions::default());
    }

    #[test]
    fn test_marker_click_google() {
        click_on_marker::<GoogleMapsEngine>(google_options());
    }

    #[test]
    fn test_marker_click_leaflet() {
        click_on_marker::<LeafletEngine>(LeafletOptions::default());
    }

    /// Position `pixels` screen pixels due north of `origin` at `zoom`
    fn north_of(origin: LatLng, pixels: f64, zoom: u8) -> LatLng {
        let projected = origin.to_mercator();
        LatLng::from_mercator(mapbridge::Point::new(
            projected.x,
            projected.y + pixels * WebMercator::meters_per_pixel(zoom),
        ))
    }

    fn click_north_of_marker<E: MapEngine>(options: E::Options, pixels: f64) -> MapEvent {
        let (mut widget, rx) = bound::<E>(options);
        let marker = LatLng::new(60.0, 10.0);
        widget.add_marker(marker, "A", "");

        let event = widget.click_at(north_of(marker, pixels, 10)).unwrap();
        assert_eq!(rx.try_iter().count(), 1);
        event
    }

    #[test]
    fn test_click_tolerance_agrees_across_engines() {
        for pixels in [5.0, 15.0] {
            let events = [
                click_north_of_marker::<OpenLayersEngine>(OpenLayersOptions::default(), pixels),
                click_north_of_marker::<GoogleMapsEngine>(google_options(), pixels),
                click_north_of_marker::<LeafletEngine>(LeafletOptions::default(), pixels),
            ];
            for event in &events {
                match (pixels < 10.0, event) {
                    (true, MapEvent::MarkerClick { marker_index: 0 }) => {}
                    (false, MapEvent::MapClick { latitude, .. }) => assert!(*latitude > 60.0),
                    _ => panic!("{}px north of the marker gave {:?}", pixels, events),
                }
            }
        }
    }

    #[test]
    fn test_markers_at_poles_openlayers() {
        let (mut widget, rx) = bound::<OpenLayersEngine>(OpenLayersOptions::default());
        for i in 0..20 {
            let lat = if i % 2 == 0 { 90.0 } else { -90.0 };
            assert_eq!(widget.add_marker(LatLng::new(lat, i as f64), "pole", ""), Some(i));
        }
        for i in 0..20 {
            widget.add_marker(LatLng::new(i as f64, i as f64 - 10.0), "ordinary", "");
        }
        assert_eq!(widget.engine().unwrap().feature_count(), 40);

        assert_eq!(
            widget.click_at(LatLng::new(-90.0, 3.0)),
            Some(MapEvent::MarkerClick { marker_index: 3 })
        );
        assert_eq!(
            widget.click_at(LatLng::new(90.0, 4.0)),
            Some(MapEvent::MarkerClick { marker_index: 4 })
        );
        assert_eq!(rx.try_iter().count(), 2);

        for _ in 0..10 {
            assert_eq!(widget.remove_marker(0), DispatchOutcome::Applied);
        }
        assert_eq!(widget.registry().len(), 30);
        assert_eq!(widget.engine().unwrap().feature_count(), 30);
        assert_eq!(widget.clear_markers(), DispatchOutcome::Applied);
        assert_eq!(widget.engine().unwrap().feature_count(), 0);
    }

    #[test]
    fn test_marker_click_reports_renumbered_index() {
        let (mut widget, rx) = bound::<GoogleMapsEngine>(google_options());
        widget.add_marker(LatLng::new(10.0, 10.0), "A", "");
        widget.add_marker(LatLng::new(20.0, 20.0), "B", "");
        widget.add_marker(LatLng::new(30.0, 30.0), "C", "");
        widget.remove_marker(0);

        widget.click_at(LatLng::new(30.0, 30.0));
        widget.click_marker(0);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                MapEvent::MarkerClick { marker_index: 1 },
                MapEvent::MarkerClick { marker_index: 0 },
            ]
        );
    }

    #[test]
    fn test_map_click_reports_canonical_coordinates() {
        let (mut widget, rx) = bound::<OpenLayersEngine>(OpenLayersOptions::default());
        widget.click_at(LatLng::new(37.7749, -122.4194));

        match rx.try_recv().unwrap() {
            MapEvent::MapClick {
                latitude,
                longitude,
            } => {
                assert!((latitude - 37.7749).abs() < 1e-9);
                assert!((longitude + 122.4194).abs() < 1e-9);
            }
            other => panic!("expected a map click, got {:?}", other),
        }
        assert!(rx.try_recv().is_err());
        assert!(widget.registry().is_empty());
    }

    #[test]
    fn test_each_click_emits_exactly_one_event() {
        let (mut widget, rx) = bound::<LeafletEngine>(LeafletOptions::default());
        widget.set_property("allowMarkerCreationOnClick", &json!(true));

        let points = [
            LatLng::new(41.0, -3.0),
            LatLng::new(41.0, -3.0),
            LatLng::new(41.0001, -3.0001),
            LatLng::new(-33.8688, 151.2093),
            LatLng::new(0.0, 0.0),
            LatLng::new(-33.8688, 151.2093),
        ];
        for point in points {
            widget.click_at(point);
            let events: Vec<_> = rx.try_iter().collect();
            assert_eq!(events.len(), 1, "click at {:?} produced {:?}", point, events);
        }

        // three distinct spots created markers, the repeats hit them
        assert_eq!(widget.registry().len(), 3);
    }

    #[test]
    fn test_click_creation_emits_map_click_first() {
        let (mut widget, rx) = bound::<OpenLayersEngine>(OpenLayersOptions::default());
        widget.set_allow_marker_creation_on_click(true);

        let event = widget.click_at(LatLng::new(45.0, 7.0)).unwrap();
        assert!(matches!(event, MapEvent::MapClick { .. }));
        assert_eq!(rx.try_iter().count(), 1);

        let created = widget.registry().get(0).unwrap();
        assert_eq!(created.title, "New marker");
        assert_eq!(created.description, "");
        assert!(created.position.approx_eq(&LatLng::new(45.0, 7.0), 1e-9));

        // the same spot now resolves to the new marker
        let event = widget.click_at(LatLng::new(45.0, 7.0)).unwrap();
        assert_eq!(event, MapEvent::MarkerClick { marker_index: 0 });
    }

    #[test]
    fn test_popups_open_on_marker_click() {
        let (mut widget, _rx) = bound::<LeafletEngine>(LeafletOptions::default());
        widget.add_marker(LatLng::new(41.0, -3.0), "A", "Meeting point");
        widget.click_marker(0);

        let handle = widget.registry().get(0).unwrap().handle;
        let marker = widget.engine().unwrap().marker(handle).unwrap();
        assert!(marker.popup.as_ref().unwrap().open);
    }

    // --- configuration and lifecycle -------------------------------------------------------------

    #[test]
    fn test_google_requires_api_key() {
        init_logging();
        let mut widget = MapWidgetBuilder::<GoogleMapsEngine>::new().build();
        let mut node = HeadlessNode::new("gmap");
        let loader = PreloadedLoader::available();

        assert!(matches!(widget.bind(&mut node, &loader), BindOutcome::Failed));
        assert_eq!(widget.phase(), WidgetPhase::Failed);
        assert!(node.error().unwrap().contains("API key"));
        assert_eq!(widget.clear_markers(), DispatchOutcome::Ignored);
    }

    #[test]
    fn test_api_key_immutable_after_bind() {
        init_logging();
        let mut widget = MapWidgetBuilder::<GoogleMapsEngine>::new().build();
        assert_eq!(
            widget.set_property("apiKey", &json!("first")),
            PropertyOutcome::Applied
        );

        let mut node = HeadlessNode::new("gmap");
        let loader = PreloadedLoader::available();
        assert!(matches!(widget.bind(&mut node, &loader), BindOutcome::Bound));

        assert_eq!(
            widget.set_property("apiKey", &json!("second")),
            PropertyOutcome::Rejected
        );
        assert_eq!(widget.options().api_key, "first");
    }

    #[test]
    fn test_leaflet_missing_library_shows_error() {
        init_logging();
        let mut widget = MapWidgetBuilder::<LeafletEngine>::new().build();
        let mut node = HeadlessNode::new("lmap");
        let loader = PreloadedLoader::missing();

        assert!(matches!(widget.bind(&mut node, &loader), BindOutcome::Failed));
        assert!(node.error().unwrap().contains("Leaflet"));
        assert!(loader.requests().is_empty());
    }

    #[test]
    fn test_leaflet_tile_provider_property() {
        let (mut widget, _rx) = bound::<LeafletEngine>(LeafletOptions::default());
        widget.set_property("mapType", &json!("satellite"));
        assert_eq!(
            widget.set_property("tileProvider", &json!("esri")),
            PropertyOutcome::Applied
        );

        let layer = widget.engine().unwrap().tile_layer().unwrap();
        assert!(layer.spec.url_template.contains("World_Imagery"));
        assert!(layer.on_map);
    }

    #[test]
    fn test_seeded_markers() {
        init_logging();
        let mut widget = MapWidgetBuilder::<OpenLayersEngine>::new().build();
        let mut node = HeadlessNode::new("map").with_attribute(
            "data-markers",
            r#"[{"lat": 41.0, "lng": -3.0, "title": "A"}, {"lat": 42.0, "lng": -2.0, "description": "d"}]"#,
        );
        let loader = PreloadedLoader::available();
        widget.bind(&mut node, &loader);

        assert_eq!(titles(&widget), vec!["A", ""]);
        assert_eq!(widget.registry().get(1).unwrap().description, "d");
    }

    #[test]
    fn test_malformed_seed_does_not_fail_bind() {
        init_logging();
        let mut widget = MapWidgetBuilder::<LeafletEngine>::new().build();
        let mut node = HeadlessNode::new("lmap").with_attribute("data-markers", "[{lat: oops");
        let loader = PreloadedLoader::available();

        assert!(matches!(widget.bind(&mut node, &loader), BindOutcome::Bound));
        assert!(widget.registry().is_empty());
        assert!(node.error().is_none());
    }

    #[test]
    fn test_unbind_releases_markers() {
        let (mut widget, rx) = bound::<GoogleMapsEngine>(google_options());
        widget.add_marker(LatLng::new(1.0, 1.0), "A", "");
        widget.add_marker(LatLng::new(2.0, 2.0), "B", "");

        widget.unbind();
        assert_eq!(widget.phase(), WidgetPhase::TornDown);
        assert!(widget.registry().is_empty());
        assert!(widget.engine().is_none());

        assert_eq!(widget.add_marker(LatLng::new(3.0, 3.0), "C", ""), None);
        assert_eq!(widget.click_at(LatLng::new(1.0, 1.0)), None);
        assert!(rx.try_recv().is_err());
    }
}
