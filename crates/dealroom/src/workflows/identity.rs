use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::ids::PartyId;

/// Header carrying the actor id resolved by the upstream identity provider.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Acting party passed explicitly into every lifecycle operation.
///
/// Relationships (owner, buyer, seller, advisor, team member) are always resolved against stored
/// records, never taken from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    pub actor_id: PartyId,
}

impl CallerContext {
    pub fn new(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: PartyId(actor_id.into()),
        }
    }

    pub fn is(&self, party: &PartyId) -> bool {
        &self.actor_id == party
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        match actor {
            Some(actor) => Ok(CallerContext::new(actor)),
            None => {
                let payload = json!({
                    "error": format!("missing {ACTOR_HEADER} header"),
                    "code": "unauthenticated",
                });
                Err((StatusCode::UNAUTHORIZED, Json(payload)).into_response())
            }
        }
    }
}
