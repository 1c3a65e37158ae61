use axum::{extract::State, Json};

use crate::database::store::DeleteOutcome;
use crate::database::{Collection, Repository};
use crate::handlers::utils::parse_object_id;
use crate::handlers::ApiResult;
use crate::middleware::ApiPath;
use crate::state::AppState;

/// DELETE /cart/:id - remove one kitchen entry
pub async fn remove(ApiPath(id): ApiPath<String>, State(state): State<AppState>) -> ApiResult<DeleteOutcome> {
    let id = parse_object_id(&id)?;
    let outcome = Repository::new(Collection::Kitchen, state.store.as_ref())
        .delete_one(id)
        .await?;
    tracing::info!("Deleted kitchen entry {} ({} removed)", id, outcome.deleted_count);
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use mongodb::bson::doc;

    use crate::database::Collection;
    use crate::testing::TestContext;

    #[tokio::test]
    async fn removing_a_kitchen_entry_needs_no_token() {
        let ctx = TestContext::new();
        let ids = ctx
            .store
            .seed(
                Collection::Kitchen,
                [
                    doc! { "recipieId": "abc", "email": "u1@x.com" },
                    doc! { "recipieId": "def", "email": "u1@x.com" },
                ],
            )
            .await;

        let (status, outcome) = ctx.send(Method::DELETE, &format!("/cart/{}", ids[0].to_hex()), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["deletedCount"], 1);
        assert_eq!(ctx.store.count(Collection::Kitchen).await, 1);
    }

    #[tokio::test]
    async fn undecodable_id_gets_a_json_error() {
        let ctx = TestContext::new();
        let (status, body) = ctx.send(Method::DELETE, "/cart/%FF", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "BAD_REQUEST");
    }
}
