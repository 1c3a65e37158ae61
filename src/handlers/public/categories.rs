use axum::{extract::State, Json};
use serde_json::Value;

use crate::database::{Collection, Projection, Repository};
use crate::handlers::ApiResult;
use crate::state::AppState;

/// GET /categories - every category document
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Value>> {
    let categories = Repository::new(Collection::Categories, state.store.as_ref())
        .select_all(Projection::Full)
        .await?;
    Ok(Json(categories))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::database::DatabaseError;
    use crate::testing::TestContext;

    #[tokio::test]
    async fn store_failure_is_a_generic_server_error() {
        let ctx = TestContext::failing(|| DatabaseError::ConfigMissing("DB_USER"));
        let (status, body) = ctx.send(Method::GET, "/categories", None, None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({ "success": false, "message": "Database error occurred", "code": "INTERNAL_SERVER_ERROR" })
        );
    }

    #[tokio::test]
    async fn unreachable_database_is_unavailable() {
        let ctx = TestContext::failing(|| DatabaseError::ConnectionError("server selection timeout".to_string()));
        let (status, body) = ctx.send(Method::GET, "/categories", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "SERVICE_UNAVAILABLE");

        let (status, _) = ctx.send(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
