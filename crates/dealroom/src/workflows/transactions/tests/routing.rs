use super::common::*;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::workflows::identity::ACTOR_HEADER;
use crate::workflows::transactions::transaction_router;

#[tokio::test]
async fn detail_reports_role_and_schedule() {
    let h = harness();
    let router = transaction_router(h.service.clone());

    let response = router
        .oneshot(
            Request::get(format!("/api/v1/transactions/{}", h.record.transaction.id))
                .header(ACTOR_HEADER, "buyer-1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["role"], json!("buyer"));
    assert_eq!(payload["transaction"]["agreed_price"], json!(50_000_000));
    assert_eq!(payload["milestones"].as_array().map(Vec::len), Some(9));
    assert_eq!(payload["payments"][1]["kind"], json!("MAIN_PAYMENT"));
}

#[tokio::test]
async fn stage_route_accepts_an_empty_body() {
    let h = harness();
    let router = transaction_router(h.service.clone());
    let uri = format!("/api/v1/transactions/{}/stage", h.record.transaction.id);

    let response = router
        .clone()
        .oneshot(
            Request::post(uri.as_str())
                .header(ACTOR_HEADER, "seller-1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["stage"], json!("NDA_IN_FORCE"));

    let response = router
        .oneshot(
            Request::post(uri.as_str())
                .header(ACTOR_HEADER, "seller-1")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"stage": "LOI_SIGNED"}).to_string()))
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn stranger_gets_forbidden() {
    let h = harness();
    let router = transaction_router(h.service.clone());

    let response = router
        .oneshot(
            Request::get(format!(
                "/api/v1/transactions/{}/activity",
                h.record.transaction.id
            ))
            .header(ACTOR_HEADER, "stranger")
            .body(Body::empty())
            .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invitee_declines_through_the_team_route() {
    let h = harness();
    let router = transaction_router(h.service.clone());
    let team_uri = format!("/api/v1/transactions/{}/team", h.record.transaction.id);

    let response = router
        .clone()
        .oneshot(
            Request::post(team_uri.as_str())
                .header(ACTOR_HEADER, "buyer-1")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"party_id": "broker-1"}).to_string()))
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .oneshot(
            Request::post(format!("{team_uri}/decline"))
                .header(ACTOR_HEADER, "broker-1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], json!("declined"));
}
