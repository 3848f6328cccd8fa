//! Provider client tests against an in-process stub server.

mod common;

use common::StubProvider;
use serde_json::json;
use tripstop_core::{Coordinate, SearchParams, TravelMode, TripError};
use tripstop_google::{GeminiClient, GeminiConfig, Geocoder, GoogleConfig, PlacesClient, RoutesClient};

const ROUTES_PATH: &str = "/directions/v2:computeRoutes";
const PLACES_PATH: &str = "/v1/places:searchText";
const GEOCODE_PATH: &str = "/maps/api/geocode/json";

async fn google(stub: &StubProvider) -> GoogleConfig {
    GoogleConfig::new("test-key").with_base_url(&stub.start().await)
}

#[tokio::test]
async fn computes_route_between_coordinate_pairs() {
    let stub = StubProvider::default();
    stub.respond(
        ROUTES_PATH,
        200,
        json!({
            "routes": [{
                "duration": "5400s",
                "distanceMeters": 80000,
                "polyline": {"encodedPolyline": "_p~iF~ps|U_ulLnnqC"},
                "legs": [{"steps": []}]
            }]
        }),
    );
    let client = RoutesClient::new(&google(&stub).await).unwrap();

    let route = client
        .compute_route("40.0,-75.0", "40.5,-75.5", TravelMode::Drive)
        .await
        .unwrap();

    assert_eq!(route.duration_seconds, 5400);
    assert_eq!(route.distance_meters, 80000);
    assert_eq!(route.distance, "80.0 km");
    assert_eq!(route.duration, "90 mins");
    assert_eq!(route.origin_coord, Coordinate::new(40.0, -75.0));
    assert_eq!(route.destination_coord, Coordinate::new(40.5, -75.5));
    assert!(stub.requests_to(GEOCODE_PATH).is_empty());

    let sent = &stub.requests_to(ROUTES_PATH)[0];
    assert_eq!(sent.headers["x-goog-api-key"], "test-key");
    assert_eq!(sent.body["travelMode"], "DRIVE");
    assert_eq!(sent.body["routingPreference"], "TRAFFIC_AWARE");
    assert_eq!(sent.body["origin"]["location"]["latLng"]["latitude"], 40.0);
}

#[tokio::test]
async fn walking_route_omits_routing_preference() {
    let stub = StubProvider::default();
    stub.respond(
        ROUTES_PATH,
        200,
        json!({"routes": [{"duration": 600, "distanceMeters": 900, "polyline": {"encodedPolyline": "x"}}]}),
    );
    let client = RoutesClient::new(&google(&stub).await).unwrap();

    let route = client
        .compute_route("40.0,-75.0", "40.01,-75.01", TravelMode::Walk)
        .await
        .unwrap();

    assert_eq!(route.duration_seconds, 600);
    let sent = &stub.requests_to(ROUTES_PATH)[0];
    assert_eq!(sent.body["travelMode"], "WALK");
    assert!(sent.body.get("routingPreference").is_none());
}

#[tokio::test]
async fn routes_error_status_is_passed_through() {
    let stub = StubProvider::default();
    stub.respond(ROUTES_PATH, 429, json!({"error": {"message": "quota"}}));
    let client = RoutesClient::new(&google(&stub).await).unwrap();

    let err = client
        .compute_route("40.0,-75.0", "40.5,-75.5", TravelMode::Drive)
        .await
        .unwrap_err();

    match err {
        TripError::Upstream(upstream) => {
            assert_eq!(upstream.status, 429);
            assert!(upstream.body.contains("quota"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn out_of_range_coordinates_fail_validation() {
    let stub = StubProvider::default();
    let client = RoutesClient::new(&google(&stub).await).unwrap();

    let err = client
        .compute_route("95.0,10.0", "40.5,-75.5", TravelMode::Drive)
        .await
        .unwrap_err();

    assert!(matches!(err, TripError::Validation(_)));
    assert!(stub.requests_to(ROUTES_PATH).is_empty());
}

#[tokio::test]
async fn geocodes_free_text_addresses() {
    let stub = StubProvider::default();
    stub.respond(
        GEOCODE_PATH,
        200,
        json!({"status": "OK", "results": [{"geometry": {"location": {"lat": 39.95, "lng": -75.16}}}]}),
    );
    let geocoder = Geocoder::new(&google(&stub).await).unwrap();

    let coordinate = geocoder.resolve("Philadelphia, PA").await.unwrap();

    assert_eq!(coordinate, Coordinate::new(39.95, -75.16));
    let sent = &stub.requests_to(GEOCODE_PATH)[0];
    assert!(sent.query.contains("key=test-key"));
    assert!(stub.requests_to(PLACES_PATH).is_empty());
}

#[tokio::test]
async fn denied_geocoding_falls_back_to_places() {
    let stub = StubProvider::default();
    stub.respond(
        GEOCODE_PATH,
        200,
        json!({"status": "REQUEST_DENIED", "error_message": "This API is not activated"}),
    );
    stub.respond(
        PLACES_PATH,
        200,
        json!({"places": [{"location": {"latitude": 40.71, "longitude": -74.0}}]}),
    );
    let geocoder = Geocoder::new(&google(&stub).await).unwrap();

    let coordinate = geocoder.resolve("New York, NY").await.unwrap();

    assert_eq!(coordinate, Coordinate::new(40.71, -74.0));
    let fallback = &stub.requests_to(PLACES_PATH)[0];
    assert_eq!(fallback.body["textQuery"], "New York, NY");
    assert_eq!(fallback.body["maxResultCount"], 1);
}

#[tokio::test]
async fn unknown_address_is_a_resolution_error() {
    let stub = StubProvider::default();
    stub.respond(GEOCODE_PATH, 200, json!({"status": "ZERO_RESULTS", "results": []}));
    let geocoder = Geocoder::new(&google(&stub).await).unwrap();

    let err = geocoder.resolve("nowhere at all").await.unwrap_err();

    match err {
        TripError::Resolution(message) => assert!(message.contains("ZERO_RESULTS")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(stub.requests_to(PLACES_PATH).is_empty());
}

#[tokio::test]
async fn place_search_computes_detours_when_origin_given() {
    let stub = StubProvider::default();
    stub.respond(
        PLACES_PATH,
        200,
        json!({
            "places": [{
                "id": "p1",
                "displayName": {"text": "Blue Moon Cafe"},
                "formattedAddress": "1 Main St",
                "location": {"latitude": 40.2, "longitude": -75.2},
                "primaryType": "cafe",
                "rating": 4.6,
                "userRatingCount": 312,
                "currentOpeningHours": {"openNow": true},
                "priceLevel": "PRICE_LEVEL_MODERATE"
            }],
            "routingSummaries": [{
                "legs": [{"duration": "330s", "distanceMeters": 2500}],
                "directionsUri": "https://maps.example/dir"
            }]
        }),
    );
    let client = PlacesClient::new(&google(&stub).await).unwrap();
    let params = SearchParams::new("coffee", "_p~iF~ps|U").with_origin(Coordinate::new(40.0, -75.0));

    let result = client.search(&params).await.unwrap();

    assert_eq!(result.total_results, 1);
    let place = &result.places[0];
    assert_eq!(place.name, "Blue Moon Cafe");
    assert_eq!(place.detour_minutes, Some(5.5));
    assert_eq!(place.detour_distance.as_deref(), Some("2.5 km"));
    assert_eq!(place.price_level, Some(2));
    assert!(place.is_open);

    let sent = &stub.requests_to(PLACES_PATH)[0];
    let mask = sent.headers["x-goog-fieldmask"].to_str().unwrap();
    assert!(mask.ends_with(",routingSummaries"));
    assert_eq!(sent.body["routingParameters"]["origin"]["latitude"], 40.0);
}

#[tokio::test]
async fn place_search_surfaces_provider_status() {
    let stub = StubProvider::default();
    stub.respond(PLACES_PATH, 403, json!({"error": {"status": "PERMISSION_DENIED"}}));
    let client = PlacesClient::new(&google(&stub).await).unwrap();

    let err = client
        .search(&SearchParams::new("gas", "abc"))
        .await
        .unwrap_err();

    match err {
        TripError::Upstream(upstream) => {
            assert_eq!(upstream.status, 403);
            assert!(upstream.body.contains("PERMISSION_DENIED"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn place_search_rejects_empty_query_without_calling_out() {
    let stub = StubProvider::default();
    let client = PlacesClient::new(&google(&stub).await).unwrap();

    let err = client
        .search(&SearchParams::new("  ", "abc"))
        .await
        .unwrap_err();

    assert!(matches!(err, TripError::Validation(_)));
    assert!(stub.requests_to(PLACES_PATH).is_empty());
}

#[tokio::test]
async fn gemini_returns_candidate_text() {
    let stub = StubProvider::default();
    stub.respond(
        "/gemini",
        200,
        json!({"candidates": [{"content": {"parts": [{"text": "{\"stopsPlan\""}, {"text": ": []}"}]}}]}),
    );
    let base = stub.start().await;
    let config = GeminiConfig {
        url: format!("{base}/gemini"),
        ..GeminiConfig::new(Some("gem-key".to_string()))
    };
    let client = GeminiClient::from_config(&config).unwrap().unwrap();

    let text = client.generate("rank these").await.unwrap();

    assert_eq!(text, "{\"stopsPlan\": []}");
    let sent = &stub.requests_to("/gemini")[0];
    assert!(sent.query.contains("key=gem-key"));
    assert_eq!(sent.body["contents"][0]["parts"][0]["text"], "rank these");
}
