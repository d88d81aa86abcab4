use chrono::NaiveDate;
use dealroom::config::{DocumentConfig, LifecycleConfig};
use dealroom::workflows::documents::{DocumentCipher, DocumentService};
use dealroom::workflows::listings::ListingService;
use dealroom::workflows::loi::LoiService;
use dealroom::workflows::memory::{InMemoryBlobStore, InMemoryDealStore};
use dealroom::workflows::messaging::MessagingService;
use dealroom::workflows::nda::NdaService;
use dealroom::workflows::notify::{Notification, Notifier, NotifyError};
use dealroom::workflows::transactions::TransactionService;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Notification sink for deployments without a mail or push provider wired in.
#[derive(Debug, Default, Clone)]
pub(crate) struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        info!(
            recipient = %notification.recipient,
            channel = ?notification.channel,
            template = %notification.template,
            details = ?notification.details,
            "notification queued"
        );
        Ok(())
    }
}

pub(crate) type Store = InMemoryDealStore;
pub(crate) type Outbox = LoggingNotifier;

/// Every lifecycle service sharing one store, notifier and blob store.
#[derive(Clone)]
pub(crate) struct DealServices {
    pub(crate) listings: Arc<ListingService<Store, Outbox>>,
    pub(crate) nda: Arc<NdaService<Store, Outbox>>,
    pub(crate) loi: Arc<LoiService<Store, Outbox>>,
    pub(crate) transactions: Arc<TransactionService<Store, Outbox>>,
    pub(crate) messaging: Arc<MessagingService<Store, Outbox>>,
    pub(crate) documents: Arc<DocumentService<Store, InMemoryBlobStore>>,
}

impl DealServices {
    pub(crate) fn in_memory(lifecycle: &LifecycleConfig, documents: &DocumentConfig) -> Self {
        let store = Arc::new(InMemoryDealStore::new());
        let notifier = Arc::new(LoggingNotifier);
        let blobs = Arc::new(InMemoryBlobStore::new());

        Self {
            listings: Arc::new(ListingService::new(
                store.clone(),
                notifier.clone(),
                lifecycle,
            )),
            nda: Arc::new(NdaService::new(store.clone(), notifier.clone(), lifecycle)),
            loi: Arc::new(LoiService::new(store.clone(), notifier.clone())),
            transactions: Arc::new(TransactionService::new(store.clone(), notifier.clone())),
            messaging: Arc::new(MessagingService::new(store.clone(), notifier)),
            documents: Arc::new(DocumentService::new(
                store,
                blobs,
                DocumentCipher::new(documents.encryption_key.clone()),
                documents.upload_policy(),
            )),
        }
    }
}

/// Media type for an upload sent without a usable `Content-Type`, inferred from its filename.
pub(crate) fn guess_media_type(filename: &str) -> Option<String> {
    mime_guess::from_path(filename)
        .first()
        .map(|media| media.essence_str().to_string())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
