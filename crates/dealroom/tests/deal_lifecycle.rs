//! End-to-end deal flow over the public HTTP surface: a listing is published, disclosed under a
//! confidentiality agreement, negotiated through a letter of intent and worked as a transaction
//! with encrypted documents.

mod common {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, Response, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use dealroom::config::LifecycleConfig;
    use dealroom::workflows::documents::{
        document_router, DocumentCipher, DocumentService, EncryptionKey, UploadPolicy,
    };
    use dealroom::workflows::identity::ACTOR_HEADER;
    use dealroom::workflows::listings::{listing_router, ListingService};
    use dealroom::workflows::loi::{loi_router, LoiService};
    use dealroom::workflows::memory::{InMemoryBlobStore, InMemoryDealStore, RecordingNotifier};
    use dealroom::workflows::messaging::{messaging_router, MessagingService};
    use dealroom::workflows::nda::{nda_router, NdaService};
    use dealroom::workflows::transactions::{transaction_router, TransactionService};

    pub(super) struct DealRoom {
        pub(super) app: Router,
        pub(super) blobs: Arc<InMemoryBlobStore>,
        pub(super) notifier: Arc<RecordingNotifier>,
    }

    pub(super) fn deal_room() -> DealRoom {
        let config = LifecycleConfig::default();
        let store = Arc::new(InMemoryDealStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let blobs = Arc::new(InMemoryBlobStore::new());
        let policy = UploadPolicy {
            max_bytes: 64 * 1024,
            storage_timeout: Duration::from_secs(5),
        };

        let app = listing_router(Arc::new(ListingService::new(
            store.clone(),
            notifier.clone(),
            &config,
        )))
        .merge(nda_router(Arc::new(NdaService::new(
            store.clone(),
            notifier.clone(),
            &config,
        ))))
        .merge(loi_router(Arc::new(LoiService::new(
            store.clone(),
            notifier.clone(),
        ))))
        .merge(transaction_router(Arc::new(TransactionService::new(
            store.clone(),
            notifier.clone(),
        ))))
        .merge(messaging_router(Arc::new(MessagingService::new(
            store.clone(),
            notifier.clone(),
        ))))
        .merge(document_router(Arc::new(DocumentService::new(
            store,
            blobs.clone(),
            DocumentCipher::new(EncryptionKey::from_bytes([11; 32])),
            policy,
        ))));

        DealRoom {
            app,
            blobs,
            notifier,
        }
    }

    impl DealRoom {
        pub(super) async fn call(
            &self,
            method: &str,
            uri: &str,
            actor: &str,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let builder = Request::builder()
                .method(method)
                .uri(uri)
                .header(ACTOR_HEADER, actor);
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string())),
                None => builder.body(Body::empty()),
            }
            .expect("request builds");
            let response = self.send(request).await;
            let status = response.status();
            (status, read_json(response).await)
        }

        pub(super) async fn send(&self, request: Request<Body>) -> Response<Body> {
            self.app
                .clone()
                .oneshot(request)
                .await
                .expect("router responds")
        }
    }

    pub(super) async fn read_json(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        }
    }

    pub(super) fn id_of(payload: &Value) -> String {
        payload["id"]
            .as_str()
            .map(str::to_string)
            .expect("payload carries an id")
    }
}

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use dealroom::workflows::identity::ACTOR_HEADER;
use serde_json::json;

use common::{deal_room, id_of, read_json};

const SELLER: &str = "seller-7";
const BUYER: &str = "buyer-7";
const OUTSIDER: &str = "buyer-8";

#[tokio::test]
async fn listing_moves_from_teaser_to_closed_deal_room() {
    let room = deal_room();

    let (status, listing) = room
        .call(
            "POST",
            "/api/v1/listings",
            SELLER,
            Some(json!({
                "confidential": { "company_name": "Bageri Nord AB" },
                "business_type": "bakery",
                "region": "Umeå",
                "industry": "Food",
                "description": "Family bakery with three shops.",
                "price_min": 8_000_000,
                "price_max": 12_000_000,
                "publish": true
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let listing_id = id_of(&listing);
    let listing_uri = format!("/api/v1/listings/{listing_id}");

    let (status, teaser) = room.call("GET", &listing_uri, BUYER, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(teaser.get("company_name").is_none());

    let (status, _) = room
        .call(
            "POST",
            &format!("{listing_uri}/lois"),
            BUYER,
            Some(json!({ "proposed_price": 9_000_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, nda) = room
        .call("POST", &format!("{listing_uri}/nda-requests"), BUYER, None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let nda_id = id_of(&nda);

    let (status, decided) = room
        .call(
            "POST",
            &format!("/api/v1/nda-requests/{nda_id}/transition"),
            SELLER,
            Some(json!({ "status": "approved" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decided["status"], json!("approved"));

    let (_, disclosed) = room.call("GET", &listing_uri, BUYER, None).await;
    assert_eq!(disclosed["company_name"], json!("Bageri Nord AB"));
    let (_, still_teaser) = room.call("GET", &listing_uri, OUTSIDER, None).await;
    assert!(still_teaser.get("company_name").is_none());

    let (status, _) = room
        .call(
            "POST",
            &format!("{listing_uri}/messages"),
            BUYER,
            Some(json!({ "recipient_id": SELLER, "body": "When can we visit?" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, loi) = room
        .call(
            "POST",
            &format!("{listing_uri}/lois"),
            BUYER,
            Some(json!({ "proposed_price": 9_000_000, "cash_at_closing_pct": 90 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let loi_id = id_of(&loi);

    let (status, approval) = room
        .call(
            "POST",
            &format!("/api/v1/lois/{loi_id}/decision"),
            SELLER,
            Some(json!({ "action": "approve" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let transaction_id = approval["transaction"]["transaction"]["id"]
        .as_str()
        .map(str::to_string)
        .expect("transaction id");
    let amounts: Vec<u64> = approval["transaction"]["payments"]
        .as_array()
        .expect("payments")
        .iter()
        .filter_map(|payment| payment["amount"].as_u64())
        .collect();
    assert_eq!(amounts, vec![900_000, 8_100_000]);
    assert!(room
        .notifier
        .events()
        .iter()
        .any(|event| event.template == "loi_signed"));

    let transaction_uri = format!("/api/v1/transactions/{transaction_id}");
    let (status, _) = room.call("GET", &transaction_uri, OUTSIDER, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let upload = Request::post(format!(
        "{transaction_uri}/documents?filename=accounts-2024.pdf&title=Accounts%202024"
    ))
    .header(ACTOR_HEADER, SELLER)
    .header(header::CONTENT_TYPE, "application/pdf")
    .body(Body::from(&b"%PDF-1.4 bakery accounts"[..]))
    .expect("request builds");
    let response = room.send(upload).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let document = read_json(response).await;
    let document_id = id_of(&document);

    let download = Request::get(format!("{transaction_uri}/documents/{document_id}"))
        .header(ACTOR_HEADER, BUYER)
        .body(Body::empty())
        .expect("request builds");
    let response = room.send(download).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    assert_eq!(&bytes[..], b"%PDF-1.4 bakery accounts");
    assert_eq!(room.blobs.len(), 1);

    let (status, _) = room
        .call("GET", &format!("{transaction_uri}/documents"), OUTSIDER, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, trail) = room
        .call("GET", &format!("{transaction_uri}/access-log"), SELLER, None)
        .await;
    let actions: Vec<&str> = trail
        .as_array()
        .expect("trail")
        .iter()
        .filter_map(|entry| entry["action"].as_str())
        .collect();
    assert_eq!(actions, vec!["upload", "download", "unauthorized_attempt"]);

    for expected in ["NDA_IN_FORCE", "DD_IN_PROGRESS"] {
        let (status, advanced) = room
            .call("POST", &format!("{transaction_uri}/stage"), BUYER, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(advanced["stage"], json!(expected));
    }
    let (status, closed) = room
        .call(
            "POST",
            &format!("{transaction_uri}/stage"),
            SELLER,
            Some(json!({ "stage": "CLOSED" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["stage"], json!("CLOSED"));

    let (status, _) = room
        .call("POST", &format!("{transaction_uri}/stage"), SELLER, None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn messaging_stays_closed_without_disclosure() {
    let room = deal_room();

    let (_, listing) = room
        .call(
            "POST",
            "/api/v1/listings",
            SELLER,
            Some(json!({
                "anonymized_title": "Verkstad i Luleå",
                "region": "Luleå",
                "industry": "Manufacturing",
                "description": "Contract machining.",
                "publish": true
            })),
        )
        .await;
    let listing_id = id_of(&listing);

    let (status, body) = room
        .call(
            "POST",
            &format!("/api/v1/listings/{listing_id}/messages"),
            BUYER,
            Some(json!({ "recipient_id": SELLER, "body": "Hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], json!("unauthorized"));

    let (status, _) = room
        .call(
            "GET",
            &format!("/api/v1/listings/{listing_id}/messages/{SELLER}"),
            BUYER,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
