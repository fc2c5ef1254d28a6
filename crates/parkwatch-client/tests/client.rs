//! Integration tests for `CarParkClient` using wiremock HTTP mocks.

use parkwatch_client::{CarParkClient, OccupancyClient, OccupancyError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> CarParkClient {
    CarParkClient::with_base_url("test-key", 30, base_url)
        .expect("client construction should not fail")
}

fn facility_body(id: &str, spots: &str, occupied: &str) -> serde_json::Value {
    serde_json::json!({
        "tsn": "2155384",
        "spots": spots,
        "zones": [],
        "ParkID": "1",
        "location": {
            "suburb": "Revesby",
            "address": "The River Road",
            "latitude": "-33.95107517",
            "longitude": "151.0168491"
        },
        "occupancy": {
            "loop": null,
            "total": occupied,
            "monthlies": null,
            "open_gate": null,
            "transients": occupied
        },
        "MessageDate": "2025-07-01T07:58:12",
        "facility_id": id,
        "facility_name": "Park&Ride - Revesby",
        "tfnsw_facility_id": "221210TPR001"
    })
}

#[tokio::test]
async fn fetch_sends_api_key_and_parses_object() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/carpark"))
        .and(query_param("facility", "9"))
        .and(header("authorization", "apikey test-key"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(facility_body("9", "864", "800")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let snap = client.fetch("9").await.expect("should parse facility");

    assert_eq!(snap.total_spaces, 864);
    assert_eq!(snap.occupied, 800);
    assert_eq!(snap.available_spots(), 64);
    assert_eq!(snap.facility.facility_id, "9");
    assert_eq!(snap.facility.display_name(), "Revesby");
}

#[tokio::test]
async fn fetch_uses_first_element_of_array_body() {
    let server = MockServer::start().await;

    let body = serde_json::json!([
        facility_body("8", "1059", "12"),
        facility_body("8", "1", "1"),
    ]);
    Mock::given(method("GET"))
        .and(path("/carpark"))
        .and(query_param("facility", "8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let snap = client.fetch("8").await.expect("array body");
    assert_eq!(snap.total_spaces, 1059);
    assert_eq!(snap.occupied, 12);
}

#[tokio::test]
async fn fetch_empty_array_is_no_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/carpark"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.fetch("7").await.unwrap_err();
    assert!(matches!(err, OccupancyError::NoData), "got {err:?}");
}

#[tokio::test]
async fn fetch_server_error_is_network() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/carpark"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.fetch("7").await.unwrap_err();
    assert!(matches!(err, OccupancyError::Network(_)), "got {err:?}");
    assert_eq!(err.kind(), "network");
}

#[tokio::test]
async fn fetch_malformed_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/carpark"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.fetch("7").await.unwrap_err();
    assert!(matches!(err, OccupancyError::Decode { .. }), "got {err:?}");
}

#[tokio::test]
async fn fetch_wrong_shape_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/carpark"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "unexpected": true })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.fetch("7").await.unwrap_err();
    assert!(matches!(err, OccupancyError::Decode { .. }), "got {err:?}");
}

#[tokio::test]
async fn fetch_blank_id_is_rejected_without_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.fetch("  ").await.unwrap_err();
    assert!(matches!(err, OccupancyError::InvalidRequest(_)), "got {err:?}");
}

#[tokio::test]
async fn fetch_all_returns_id_name_map() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "6": "Park&Ride - Gordon Henry St (north)",
        "7": "Park&Ride - Kiama",
        "1": "Park&Ride - Tallawong (historical only)"
    });
    Mock::given(method("GET"))
        .and(path("/carpark"))
        .and(header("authorization", "apikey test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let all = client.fetch_all().await.expect("listing");
    assert_eq!(all.len(), 3);
    assert_eq!(all["7"], "Park&Ride - Kiama");

    let current = parkwatch_client::exclude_historical(all);
    assert_eq!(current.len(), 2);
    assert!(!current.contains_key("1"));
}
