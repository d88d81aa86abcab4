use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::domain::{DocumentStatus, DocumentUpload};
use super::repository::{AccessAuditLog, DocumentRepository};
use super::service::DocumentService;
use super::storage::BlobStore;
use crate::workflows::identity::CallerContext;
use crate::workflows::ids::{DocumentId, TransactionId};
use crate::workflows::transactions::TransactionRepository;

/// Fallback used when the client sends no usable `Content-Type`, keyed by filename.
pub type MediaTypeGuesser = fn(&str) -> Option<String>;

pub(crate) struct DocumentRouterState<S, B> {
    service: Arc<DocumentService<S, B>>,
    guess: Option<MediaTypeGuesser>,
}

impl<S, B> Clone for DocumentRouterState<S, B> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            guess: self.guess,
        }
    }
}

pub fn document_router<S, B>(service: Arc<DocumentService<S, B>>) -> Router
where
    S: TransactionRepository + DocumentRepository + AccessAuditLog + 'static,
    B: BlobStore + 'static,
{
    build_router(service, None)
}

/// Same routes, inferring missing media types from the uploaded filename.
pub fn document_router_with_guesser<S, B>(
    service: Arc<DocumentService<S, B>>,
    guess: MediaTypeGuesser,
) -> Router
where
    S: TransactionRepository + DocumentRepository + AccessAuditLog + 'static,
    B: BlobStore + 'static,
{
    build_router(service, Some(guess))
}

fn build_router<S, B>(service: Arc<DocumentService<S, B>>, guess: Option<MediaTypeGuesser>) -> Router
where
    S: TransactionRepository + DocumentRepository + AccessAuditLog + 'static,
    B: BlobStore + 'static,
{
    // One byte over the policy limit still reaches the policy check and gets its error body.
    let body_limit = service.policy().max_bytes.saturating_add(1);
    Router::new()
        .route(
            "/api/v1/transactions/:transaction_id/documents",
            get(list_handler::<S, B>)
                .post(upload_handler::<S, B>)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/api/v1/transactions/:transaction_id/documents/:document_id",
            get(download_handler::<S, B>),
        )
        .route(
            "/api/v1/transactions/:transaction_id/access-log",
            get(access_log_handler::<S, B>),
        )
        .with_state(DocumentRouterState { service, guess })
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UploadParams {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
}

pub(crate) async fn list_handler<S, B>(
    State(state): State<DocumentRouterState<S, B>>,
    caller: CallerContext,
    Path(transaction_id): Path<String>,
) -> Response
where
    S: TransactionRepository + DocumentRepository + AccessAuditLog + 'static,
    B: BlobStore + 'static,
{
    match state.service.list(&caller, &TransactionId(transaction_id)) {
        Ok(documents) => (StatusCode::OK, Json(documents)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn upload_handler<S, B>(
    State(state): State<DocumentRouterState<S, B>>,
    caller: CallerContext,
    Path(transaction_id): Path<String>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: TransactionRepository + DocumentRepository + AccessAuditLog + 'static,
    B: BlobStore + 'static,
{
    let filename = params.filename.unwrap_or_default();
    let declared = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .filter(|value| !value.starts_with("application/octet-stream"));
    let media_type = declared
        .or_else(|| state.guess.and_then(|guess| guess(&filename)))
        .unwrap_or_default();

    let upload = DocumentUpload {
        title: params.title,
        filename,
        media_type,
        status: params.status.unwrap_or_default(),
        bytes: body.to_vec(),
    };

    match state
        .service
        .upload(&caller, &TransactionId(transaction_id), upload)
        .await
    {
        Ok(meta) => (StatusCode::CREATED, Json(meta)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn download_handler<S, B>(
    State(state): State<DocumentRouterState<S, B>>,
    caller: CallerContext,
    Path((transaction_id, document_id)): Path<(String, String)>,
) -> Response
where
    S: TransactionRepository + DocumentRepository + AccessAuditLog + 'static,
    B: BlobStore + 'static,
{
    let result = state
        .service
        .download(
            &caller,
            &TransactionId(transaction_id),
            &DocumentId(document_id),
        )
        .await;

    match result {
        Ok(document) => {
            let mut headers = HeaderMap::new();
            if let Ok(value) = HeaderValue::from_str(&document.meta.media_type) {
                headers.insert(header::CONTENT_TYPE, value);
            }
            let disposition = format!(
                "attachment; filename=\"{}\"",
                document.meta.filename.replace('"', "")
            );
            if let Ok(value) = HeaderValue::from_str(&disposition) {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            (StatusCode::OK, headers, document.bytes).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn access_log_handler<S, B>(
    State(state): State<DocumentRouterState<S, B>>,
    caller: CallerContext,
    Path(transaction_id): Path<String>,
) -> Response
where
    S: TransactionRepository + DocumentRepository + AccessAuditLog + 'static,
    B: BlobStore + 'static,
{
    match state
        .service
        .access_log(&caller, &TransactionId(transaction_id))
    {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(err) => err.into_response(),
    }
}
