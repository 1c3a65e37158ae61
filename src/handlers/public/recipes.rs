use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;

use crate::database::store::InsertOneOutcome;
use crate::database::{Collection, Filter, Projection, Repository};
use crate::handlers::utils::parse_object_id;
use crate::handlers::ApiResult;
use crate::middleware::{ApiPath, Valid};
use crate::state::AppState;
use crate::types::RecipeDocument;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecipes {
    pub category_info: Option<Value>,
    pub foods: Vec<Value>,
}

/// GET /recipie/:category - recipes and category info whose strCategory matches, ignoring case
pub async fn by_category(ApiPath(category): ApiPath<String>, State(state): State<AppState>) -> ApiResult<CategoryRecipes> {
    let recipes = Repository::new(Collection::Recipes, state.store.as_ref());
    let categories = Repository::new(Collection::Categories, state.store.as_ref());

    let (foods, category_info) = tokio::try_join!(
        recipes.select_any(Filter::pattern("strCategory", &category), Projection::Full),
        categories.select_one(Filter::pattern("strCategory", &category)),
    )?;

    Ok(Json(CategoryRecipes { category_info, foods }))
}

/// GET /recipies/:id - a single recipe with every field, or null
pub async fn show(ApiPath(id): ApiPath<String>, State(state): State<AppState>) -> ApiResult<Option<Value>> {
    let id = parse_object_id(&id)?;
    let recipe = Repository::new(Collection::Recipes, state.store.as_ref())
        .select_one(Filter::Id(id))
        .await?;
    Ok(Json(recipe))
}

/// POST /recipie - store the body as a new recipe
pub async fn create(
    State(state): State<AppState>,
    Valid(RecipeDocument(fields)): Valid<RecipeDocument>,
) -> ApiResult<InsertOneOutcome> {
    let outcome = Repository::new(Collection::Recipes, state.store.as_ref())
        .create_one(fields)
        .await?;
    tracing::info!("Created recipe {}", outcome.inserted_id);
    Ok(Json(outcome))
}
