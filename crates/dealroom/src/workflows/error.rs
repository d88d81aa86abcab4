use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use super::repository::RepositoryError;

/// Record families referenced by not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Listing,
    BuyerProfile,
    NdaRequest,
    Loi,
    Transaction,
    Milestone,
    Document,
    TeamMember,
}

impl EntityKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::BuyerProfile => "buyer profile",
            Self::NdaRequest => "nda request",
            Self::Loi => "letter of intent",
            Self::Transaction => "transaction",
            Self::Milestone => "milestone",
            Self::Document => "document",
            Self::TeamMember => "team member",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Distinguishable conflict signals so callers can branch without matching on messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    DuplicateRequest,
    InvalidState {
        current: &'static str,
        expected: &'static str,
    },
    Expired,
    StaleWrite,
    /// The buyer already has a deal on this listing.
    DealExists,
}

impl ConflictKind {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DuplicateRequest => "already_exists",
            Self::InvalidState { .. } => "invalid_state",
            Self::Expired => "expired",
            Self::StaleWrite => "stale_write",
            Self::DealExists => "deal_exists",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateRequest => write!(f, "an open request already exists"),
            Self::InvalidState { current, expected } => {
                write!(f, "already {current} (requires {expected})")
            }
            Self::Expired => write!(f, "request has expired"),
            Self::StaleWrite => write!(f, "record changed concurrently, retry"),
            Self::DealExists => write!(f, "a transaction is already open for these parties"),
        }
    }
}

/// Error taxonomy shared by the lifecycle services.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("missing or invalid fields: {}", .fields.join(", "))]
    Validation { fields: Vec<String> },
    #[error("not permitted: {0}")]
    Unauthorized(String),
    #[error("conflict: {0}")]
    Conflict(ConflictKind),
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl LifecycleError {
    pub fn validation<I, F>(fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        Self::Validation {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized(reason.into())
    }

    pub fn not_found(entity: EntityKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid_state(current: &'static str, expected: &'static str) -> Self {
        Self::Conflict(ConflictKind::InvalidState { current, expected })
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Unauthorized(_) => "unauthorized",
            Self::Conflict(kind) => kind.code(),
            Self::NotFound { .. } => "not_found",
            Self::Repository(RepositoryError::Conflict) => "already_exists",
            Self::Repository(RepositoryError::StaleWrite) => "stale_write",
            Self::Repository(RepositoryError::NotFound) => "not_found",
            Self::Repository(RepositoryError::Unavailable(_)) => "unavailable",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_)
            | Self::Repository(RepositoryError::Conflict)
            | Self::Repository(RepositoryError::StaleWrite) => StatusCode::CONFLICT,
            Self::NotFound { .. } | Self::Repository(RepositoryError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            Self::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Compare-and-set failures surface as conflicts instead of storage faults.
pub(crate) fn stale_as_conflict(err: RepositoryError) -> LifecycleError {
    match err {
        RepositoryError::StaleWrite => LifecycleError::Conflict(ConflictKind::StaleWrite),
        other => LifecycleError::Repository(other),
    }
}

impl IntoResponse for LifecycleError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut payload = json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        if let LifecycleError::Validation { fields } = &self {
            payload["fields"] = json!(fields);
        }
        (status, Json(payload)).into_response()
    }
}
