use axum::{extract::State, Extension, Json};
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::format::serialize_object_id;
use crate::auth::Claims;
use crate::database::{Collection, Filter, Projection, Repository};
use crate::handlers::ApiResult;
use crate::middleware::{ApiQuery, Valid};
use crate::state::AppState;
use crate::types::KitchenEntry;

#[derive(Debug, Deserialize)]
pub struct CartQuery {
    pub email: Option<String>,
}

/// Whether add-to-kitchen stored a new entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AddStatus {
    #[serde(rename = "added")]
    Added,
    #[serde(rename = "Already added")]
    AlreadyAdded,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenAddition {
    pub acknowledged: bool,
    #[serde(serialize_with = "serialize_object_id")]
    pub inserted_id: ObjectId,
    pub status: AddStatus,
}

/// GET /cart?email= - kitchen entries owned by an email; no email means no entries
pub async fn list(ApiQuery(query): ApiQuery<CartQuery>, State(state): State<AppState>) -> ApiResult<Vec<Value>> {
    let email = match query.email.filter(|e| !e.is_empty()) {
        Some(email) => email,
        None => return Ok(Json(Vec::new())),
    };

    let entries = Repository::new(Collection::Kitchen, state.store.as_ref())
        .select_any(Filter::field("email", email), Projection::Full)
        .await?;
    Ok(Json(entries))
}

/// POST /add-to-kitchen - save a recipe once per (recipieId, email)
pub async fn add(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Valid(entry): Valid<KitchenEntry>,
) -> ApiResult<KitchenAddition> {
    let key = doc! { "recipieId": entry.recipie_id.as_str(), "email": entry.email.as_str() };
    let outcome = Repository::new(Collection::Kitchen, state.store.as_ref())
        .create_if_absent(key, entry.into_fields())
        .await?;

    let status = if outcome.inserted {
        AddStatus::Added
    } else {
        AddStatus::AlreadyAdded
    };
    tracing::debug!("Kitchen entry {} {:?} for {:?}", outcome.id, status, claims.payload);

    Ok(Json(KitchenAddition {
        acknowledged: true,
        inserted_id: outcome.id,
        status,
    }))
}
