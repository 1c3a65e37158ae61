use axum::{extract::State, Extension, Json};
use serde_json::Value;

use crate::auth::Claims;
use crate::database::store::{DeleteOutcome, UpdateOutcome};
use crate::database::{Collection, Projection, Repository};
use crate::handlers::utils::{parse_object_id, RECIPE_LIST_EXCLUDED};
use crate::handlers::ApiResult;
use crate::middleware::{ApiPath, Valid};
use crate::state::AppState;
use crate::types::RecipeUpdate;

/// GET /recipies - all recipes without video, tags and instructions
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Value>> {
    let recipes = Repository::new(Collection::Recipes, state.store.as_ref())
        .select_all(Projection::Exclude(RECIPE_LIST_EXCLUDED))
        .await?;
    Ok(Json(recipes))
}

/// PUT /recipie/:id - set the given fields, creating the recipe if it does not exist
pub async fn update(
    ApiPath(id): ApiPath<String>,
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Valid(RecipeUpdate(fields)): Valid<RecipeUpdate>,
) -> ApiResult<UpdateOutcome> {
    let id = parse_object_id(&id)?;
    let outcome = Repository::new(Collection::Recipes, state.store.as_ref())
        .upsert_one(id, fields)
        .await?;
    tracing::info!(
        "Updated recipe {} (matched {}, upserted {}) for {:?}",
        id,
        outcome.matched_count,
        outcome.upserted_count,
        claims.payload
    );
    Ok(Json(outcome))
}

/// DELETE /recipie/:id
pub async fn remove(
    ApiPath(id): ApiPath<String>,
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<DeleteOutcome> {
    let id = parse_object_id(&id)?;
    let outcome = Repository::new(Collection::Recipes, state.store.as_ref())
        .delete_one(id)
        .await?;
    tracing::info!("Deleted recipe {} ({} removed) for {:?}", id, outcome.deleted_count, claims.payload);
    Ok(Json(outcome))
}
