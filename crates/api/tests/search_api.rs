//! Integration tests for `POST /api/v1/search` and the catalog reads.

mod common;

use std::time::Duration;

use awardfare_core::flight::CabinClass;
use awardfare_core::testkit::{award_on, cash_on};
use awardfare_core::usage::Identity;
use axum::http::StatusCode;
use common::{bearer, body_json, build_test_app, days_from_today, get, post_json, TestApp};
use serde_json::json;

const IP: &str = "203.0.113.7";

fn seed_business_route(app: &TestApp, days_out: u64) {
    let date = days_from_today(days_out);
    let mut fare = cash_on("JFK", "NRT", "UA", "UA79", CabinClass::Business, 4250.0);
    fare.departure_date = date;
    app.flights.add_fare(fare);

    let mut award = award_on(
        "JFK",
        "NRT",
        "UA",
        "UA79",
        "united_mileageplus",
        CabinClass::Business,
        70_000,
    );
    award.departure_date = date;
    app.flights.add_award(award);
}

fn business_search(days_out: u64) -> serde_json::Value {
    json!({
        "origin": "JFK",
        "departureDate": days_from_today(days_out).to_string(),
        "cabinClass": "business",
        "paymentType": "both",
        "selectedPrograms": ["chase_ur"],
    })
}

// ---------------------------------------------------------------------------
// Successful searches
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_returns_ranked_cash_and_valued_award() {
    let app = build_test_app();
    seed_business_route(&app, 20);

    let response = post_json(app.router, "/api/v1/search", business_search(20), IP, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["searchId"].is_string());
    assert_eq!(json["origin"], "JFK");
    assert_eq!(json["destination"], "TYO");
    assert_eq!(json["cabinClass"], "business");
    assert_eq!(json["passengers"], 1);
    assert!(json["return"].as_array().unwrap().is_empty());
    assert!(json["unavailable"].as_array().unwrap().is_empty());

    let outbound = json["outbound"].as_array().unwrap();
    assert_eq!(outbound.len(), 2);

    assert_eq!(outbound[0]["type"], "cash");
    assert_eq!(outbound[0]["price"]["amount"], 4250.0);
    assert_eq!(outbound[0]["price"]["currency"], "USD");

    assert_eq!(outbound[1]["type"], "award");
    assert_eq!(outbound[1]["award"]["milesRequired"], 70_000);
    assert_eq!(outbound[1]["value"]["centsPerPoint"], 1.8);
    assert_eq!(outbound[1]["value"]["estimatedCashValue"], 1260);
    assert_eq!(outbound[1]["transfer"]["sourceProgram"], "chase_ur");
    assert_eq!(outbound[1]["transfer"]["transferTimeHours"], 0);
}

#[tokio::test]
async fn return_leg_is_searched_when_requested() {
    let app = build_test_app();
    seed_business_route(&app, 20);
    let mut back = cash_on("HND", "JFK", "NH", "NH10", CabinClass::Business, 3900.0);
    back.departure_date = days_from_today(30);
    app.flights.add_fare(back);

    let mut body = business_search(20);
    body["returnDate"] = json!(days_from_today(30).to_string());

    let response = post_json(app.router, "/api/v1/search", body, IP, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let inbound = json["return"].as_array().unwrap();
    assert_eq!(inbound.len(), 1);
    assert_eq!(inbound[0]["flightNumber"], "NH10");
}

#[tokio::test]
async fn admitted_search_is_recorded_in_history() {
    let app = build_test_app();
    seed_business_route(&app, 20);

    let response = post_json(app.router, "/api/v1/search", business_search(20), IP, None).await;
    let search_id = body_json(response).await["searchId"]
        .as_str()
        .unwrap()
        .to_string();

    // History is written by a detached task.
    let mut entries = app.history.entries();
    for _ in 0..50 {
        if !entries.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        entries = app.history.entries();
    }

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].search_id, search_id);
    assert_eq!(entries[0].identity, Identity::Ip(IP.into()));
    assert_eq!(entries[0].request.held_programs, vec!["chase_ur"]);
}

#[tokio::test]
async fn history_failure_does_not_fail_the_search() {
    let app = build_test_app();
    seed_business_route(&app, 20);
    app.history.fail(true);

    let response = post_json(app.router, "/api/v1/search", business_search(20), IP, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_origin_is_a_validation_error() {
    let app = build_test_app();
    let body = json!({ "departureDate": days_from_today(5).to_string() });

    let response = post_json(app.router, "/api/v1/search", body, IP, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Origin and departure date are required");
}

#[tokio::test]
async fn malformed_date_is_a_validation_error() {
    let app = build_test_app();
    let body = json!({ "origin": "JFK", "departureDate": "next tuesday" });

    let response = post_json(app.router, "/api/v1/search", body, IP, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn validation_failures_do_not_count_against_the_limit() {
    let app = build_test_app();
    let body = json!({ "origin": "JFK" });

    post_json(app.router, "/api/v1/search", body, IP, None).await;

    let month = chrono::Utc::now().format("%Y-%m").to_string();
    assert_eq!(app.usage.count(&Identity::Ip(IP.into()), &month).await, 0);
}

#[tokio::test]
async fn unknown_cabin_is_a_validation_error() {
    let app = build_test_app();
    let mut body = business_search(5);
    body["cabinClass"] = json!("suite");

    let response = post_json(app.router, "/api/v1/search", body, IP, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn non_numeric_passengers_is_a_validation_error() {
    let app = build_test_app();
    let mut body = business_search(5);
    body["passengers"] = json!("two");

    let response = post_json(app.router, "/api/v1/search", body, IP, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn origin_in_tokyo_is_rejected_without_counting() {
    let app = build_test_app();
    let mut body = business_search(5);
    body["origin"] = json!("HND");

    let response = post_json(app.router, "/api/v1/search", body, IP, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let month = chrono::Utc::now().format("%Y-%m").to_string();
    assert_eq!(app.usage.count(&Identity::Ip(IP.into()), &month).await, 0);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = build_test_app();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/search")
        .header("content-type", "application/json")
        .header("x-forwarded-for", IP)
        .body(axum::body::Body::from("{\"origin\": "))
        .unwrap();

    let response = tower::ServiceExt::oneshot(app.router, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Usage policy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn eleventh_free_search_in_a_month_is_rejected() {
    let app = build_test_app();
    let month = chrono::Utc::now().format("%Y-%m").to_string();
    app.usage
        .set_count(&Identity::Ip(IP.into()), &month, 10)
        .await;

    let response = post_json(app.router, "/api/v1/search", business_search(5), IP, None).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let json = body_json(response).await;
    assert_eq!(json["code"], "SEARCH_LIMIT_EXCEEDED");
    assert_eq!(json["upgradeUrl"], "/pricing");
}

#[tokio::test]
async fn counters_are_per_ip() {
    let app = build_test_app();
    let month = chrono::Utc::now().format("%Y-%m").to_string();
    app.usage
        .set_count(&Identity::Ip(IP.into()), &month, 10)
        .await;

    let response = post_json(
        app.router,
        "/api/v1/search",
        business_search(5),
        "198.51.100.4",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn free_tier_cannot_search_beyond_sixty_days() {
    let app = build_test_app();

    let response = post_json(app.router, "/api/v1/search", business_search(61), IP, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "DATE_RANGE_EXCEEDED");
    assert_eq!(json["upgradeUrl"], "/pricing");
}

#[tokio::test]
async fn pro_token_lifts_limits() {
    let app = build_test_app();
    let month = chrono::Utc::now().format("%Y-%m").to_string();
    app.usage.set_count(&Identity::User(42), &month, 250).await;
    seed_business_route(&app, 200);

    let token = bearer(42, "pro");
    let response = post_json(
        app.router,
        "/api/v1/search",
        business_search(200),
        IP,
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.usage.count(&Identity::User(42), &month).await, 251);
}

#[tokio::test]
async fn free_token_keeps_free_limits() {
    let app = build_test_app();
    let token = bearer(7, "free");

    let response = post_json(
        app.router,
        "/api/v1/search",
        business_search(90),
        IP,
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "DATE_RANGE_EXCEEDED");
}

#[tokio::test]
async fn invalid_token_is_unauthorized() {
    let app = build_test_app();

    let response = post_json(
        app.router,
        "/api/v1/search",
        business_search(5),
        IP,
        Some("Bearer not-a-jwt"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

// ---------------------------------------------------------------------------
// Upstream failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn all_sources_failing_is_service_unavailable() {
    let app = build_test_app();
    app.flights.fail_fares(true);
    app.flights.fail_awards(true);

    let response = post_json(app.router, "/api/v1/search", business_search(5), IP, None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn one_failing_source_returns_partial_results() {
    let app = build_test_app();
    seed_business_route(&app, 20);
    app.flights.fail_awards(true);

    let response = post_json(app.router, "/api/v1/search", business_search(20), IP, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["outbound"].as_array().unwrap().len(), 1);
    assert_eq!(json["unavailable"], json!(["outbound.award"]));
}

#[tokio::test]
async fn repeated_search_is_served_from_cache() {
    let app = build_test_app();
    seed_business_route(&app, 20);

    let first = post_json(
        app.router.clone(),
        "/api/v1/search",
        business_search(20),
        IP,
        None,
    )
    .await;
    let second = post_json(app.router, "/api/v1/search", business_search(20), IP, None).await;

    let first = body_json(first).await;
    let second = body_json(second).await;
    assert_eq!(first["outbound"], second["outbound"]);
    assert_ne!(first["searchId"], second["searchId"]);
    assert_eq!(app.flights.fare_queries(), 1);
    assert_eq!(app.flights.award_queries(), 1);
    assert_eq!(app.cache.writes(), 2);
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transfer_partners_lists_direct_edges() {
    let app = build_test_app();

    let response = get(app.router, "/api/v1/search/transfer-partners/capital_one").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["program"], "capital_one");
    let partners = json["partners"].as_array().unwrap();
    assert_eq!(partners.len(), 2);
    assert_eq!(partners[0]["destinationProgram"], "air_canada_aeroplan");
    assert_eq!(partners[0]["transferRatio"], 1.0);
}

#[tokio::test]
async fn transfer_partners_of_unknown_program_is_empty() {
    let app = build_test_app();

    let response = get(app.router, "/api/v1/search/transfer-partners/unknown").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["partners"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn valuations_are_listed() {
    let app = build_test_app();

    let response = get(app.router, "/api/v1/search/valuations").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let valuations = json["valuations"].as_array().unwrap();
    assert_eq!(valuations.len(), 20);
    assert!(valuations.iter().any(|v| v["program"] == "ana_mileage_club"
        && v["cabinClass"] == "first"
        && v["centsPerPoint"] == 2.5));
}
