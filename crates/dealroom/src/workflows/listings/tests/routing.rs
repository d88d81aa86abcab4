use super::common::*;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::workflows::identity::ACTOR_HEADER;
use crate::workflows::listings::listing_router;

#[tokio::test]
async fn create_requires_an_actor() {
    let h = harness();
    let router = listing_router(h.service.clone());

    let response = router
        .oneshot(
            Request::post("/api/v1/listings")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_vec(&stockholm_it_listing()).expect("serialize"),
                ))
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn anonymous_detail_omits_identity_fields() {
    let h = harness();
    let listing = h
        .service
        .create(&seller(), stockholm_it_listing())
        .expect("listing created");
    let router = listing_router(h.service.clone());

    let response = router
        .oneshot(
            Request::get(format!("/api/v1/listings/{}", listing.id))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["access"], json!("public"));
    assert_eq!(payload["title"], json!("Lönsamt IT-konsultbolag"));
    assert!(payload.get("company_name").is_none());
    assert!(payload.get("registry_number").is_none());
}

#[tokio::test]
async fn status_route_maps_invalid_moves_to_conflict() {
    let h = harness();
    let listing = h
        .service
        .create(&seller(), stockholm_it_listing())
        .expect("listing created");
    let router = listing_router(h.service.clone());

    let response = router
        .oneshot(
            Request::post(format!("/api/v1/listings/{}/status", listing.id))
                .header(header::CONTENT_TYPE, "application/json")
                .header(ACTOR_HEADER, "seller-1")
                .body(Body::from(json!({"action": "publish"}).to_string()))
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["code"], json!("invalid_state"));
}

#[tokio::test]
async fn profile_round_trip_and_matches() {
    let h = harness();
    h.service
        .create(&seller(), stockholm_it_listing())
        .expect("listing created");
    let router = listing_router(h.service.clone());

    let response = router
        .clone()
        .oneshot(
            Request::put("/api/v1/buyer-profile")
                .header(header::CONTENT_TYPE, "application/json")
                .header(ACTOR_HEADER, "buyer-1")
                .body(Body::from(
                    serde_json::to_vec(&stockholm_it_preferences()).expect("serialize"),
                ))
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(
            Request::get("/api/v1/matches")
                .header(ACTOR_HEADER, "buyer-1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let matches = payload.as_array().expect("array");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["match_score"], json!(100));
}
