use crate::infra::{deserialize_optional_date, guess_media_type, AppState, DealServices};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{Duration, Local, NaiveDate};
use dealroom::error::AppError;
use dealroom::workflows::documents::document_router_with_guesser;
use dealroom::workflows::error::LifecycleError;
use dealroom::workflows::listings::listing_router;
use dealroom::workflows::loi::loi_router;
use dealroom::workflows::messaging::messaging_router;
use dealroom::workflows::nda::nda_router;
use dealroom::workflows::transactions::{
    transaction_router, PaymentKind, ResponsibleParty, ScheduleBlueprint,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub(crate) struct SchedulePreviewRequest {
    pub(crate) agreed_price: u64,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) start: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SchedulePreview {
    pub(crate) agreed_price: u64,
    pub(crate) start: NaiveDate,
    pub(crate) milestones: Vec<MilestonePreview>,
    pub(crate) payments: Vec<PaymentPreview>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MilestonePreview {
    pub(crate) key: &'static str,
    pub(crate) title: &'static str,
    pub(crate) due_date: NaiveDate,
    pub(crate) responsible: ResponsibleParty,
}

#[derive(Debug, Serialize)]
pub(crate) struct PaymentPreview {
    pub(crate) kind: PaymentKind,
    pub(crate) amount: u64,
    pub(crate) due_date: NaiveDate,
    pub(crate) description: &'static str,
}

/// Deal schedule a signed offer at `agreed_price` would receive if opened on `start`.
pub(crate) fn schedule_preview(
    agreed_price: u64,
    start: NaiveDate,
) -> Result<SchedulePreview, LifecycleError> {
    if agreed_price == 0 {
        return Err(LifecycleError::validation(["agreed_price"]));
    }

    let blueprint = ScheduleBlueprint::standard();
    let milestones = blueprint
        .milestones()
        .iter()
        .map(|template| MilestonePreview {
            key: template.key,
            title: template.title,
            due_date: start + Duration::days(template.offset_days),
            responsible: template.responsible,
        })
        .collect();
    let payments = blueprint
        .payments()
        .iter()
        .zip(blueprint.split(agreed_price))
        .map(|(template, amount)| PaymentPreview {
            kind: template.kind,
            amount,
            due_date: start + Duration::days(template.offset_days),
            description: template.description,
        })
        .collect();

    Ok(SchedulePreview {
        agreed_price,
        start,
        milestones,
        payments,
    })
}

pub(crate) fn with_deal_routes(services: &DealServices) -> Router {
    listing_router(services.listings.clone())
        .merge(nda_router(services.nda.clone()))
        .merge(loi_router(services.loi.clone()))
        .merge(transaction_router(services.transactions.clone()))
        .merge(messaging_router(services.messaging.clone()))
        .merge(document_router_with_guesser(
            services.documents.clone(),
            guess_media_type,
        ))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/schedule/preview", post(schedule_preview_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn schedule_preview_endpoint(
    Json(payload): Json<SchedulePreviewRequest>,
) -> Result<Json<SchedulePreview>, AppError> {
    let start = payload
        .start
        .unwrap_or_else(|| Local::now().date_naive());
    Ok(Json(schedule_preview(payload.agreed_price, start)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use dealroom::config::{DocumentConfig, LifecycleConfig};
    use dealroom::workflows::documents::{EncryptionKey, UploadPolicy};
    use tower::ServiceExt;

    fn sample_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid start date")
    }

    fn services() -> DealServices {
        let policy = UploadPolicy::default();
        let documents = DocumentConfig {
            encryption_key: EncryptionKey::from_bytes([3; 32]),
            ephemeral_key: false,
            max_upload_bytes: policy.max_bytes,
            storage_timeout: policy.storage_timeout,
        };
        DealServices::in_memory(&LifecycleConfig::default(), &documents)
    }

    #[test]
    fn schedule_preview_dates_follow_start() {
        let preview = schedule_preview(50_000_000, sample_start()).expect("preview builds");

        assert_eq!(preview.milestones.len(), 9);
        assert_eq!(preview.milestones[0].due_date, sample_start());
        assert_eq!(
            preview.milestones[8].due_date,
            sample_start() + Duration::days(90)
        );
        let amounts: Vec<u64> = preview.payments.iter().map(|p| p.amount).collect();
        assert_eq!(amounts, vec![5_000_000, 45_000_000]);
        assert_eq!(preview.payments[0].due_date, sample_start() + Duration::days(5));
    }

    #[test]
    fn schedule_preview_rejects_zero_price() {
        let err = schedule_preview(0, sample_start()).expect_err("zero price");
        assert_eq!(err.code(), "validation");
    }

    #[tokio::test]
    async fn schedule_preview_endpoint_uses_given_start() {
        let request = SchedulePreviewRequest {
            agreed_price: 1_000,
            start: Some(sample_start()),
        };

        let Json(body) = schedule_preview_endpoint(Json(request))
            .await
            .expect("preview builds");

        assert_eq!(body.start, sample_start());
        assert_eq!(body.payments[0].amount, 100);
        assert_eq!(body.payments[1].amount, 900);
    }

    #[tokio::test]
    async fn merged_router_serves_health_and_lifecycle_routes() {
        let app = with_deal_routes(&services());

        let health = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(health.status(), StatusCode::OK);

        let listings = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/listings")
                    .header("x-actor-id", "buyer-1")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(listings.status(), StatusCode::OK);
    }
}
