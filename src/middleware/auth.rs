use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{cookie_value, verify_token};
use crate::error::ApiError;
use crate::state::AppState;

/// Token gate for protected routes.
///
/// Reads the auth cookie, verifies signature and expiry, and inserts the decoded
/// [`crate::auth::Claims`] into the request extensions. A missing cookie is a 401,
/// a token that fails verification is a 403. Never touches the store.
pub async fn require_token(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let security = &state.config.security;

    let token = cookie_value(request.headers(), &security.cookie_name).ok_or_else(|| {
        tracing::debug!("Rejected {} {}: no auth cookie", request.method(), request.uri().path());
        ApiError::unauthorized("Unauthorized")
    })?;

    let claims = verify_token(&token, security).map_err(|e| {
        tracing::warn!("Rejected {} {}: {}", request.method(), request.uri().path(), e);
        ApiError::forbidden(e.to_string())
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::http::{Method, StatusCode};
    use chrono::{Duration, Utc};
    use mongodb::bson::{oid::ObjectId, Document};
    use serde_json::json;

    use crate::auth::{sign_claims, Claims};
    use crate::database::store::{
        Collection, ConditionalInsert, DeleteOutcome, DocumentStore, Filter, InsertOneOutcome, Projection,
        UpdateOutcome,
    };
    use crate::database::DatabaseError;
    use crate::state::AppState;
    use crate::testing::{TestContext, TEST_SECRET};

    /// Fails the test if the gate lets a request reach the store
    struct UnreachableStore;

    #[async_trait]
    impl DocumentStore for UnreachableStore {
        async fn find(&self, _: Collection, _: Filter, _: Projection) -> Result<Vec<Document>, DatabaseError> {
            panic!("store reached")
        }
        async fn find_one(&self, _: Collection, _: Filter) -> Result<Option<Document>, DatabaseError> {
            panic!("store reached")
        }
        async fn insert_one(&self, _: Collection, _: Document) -> Result<InsertOneOutcome, DatabaseError> {
            panic!("store reached")
        }
        async fn update_one(&self, _: Collection, _: ObjectId, _: Document, _: bool) -> Result<UpdateOutcome, DatabaseError> {
            panic!("store reached")
        }
        async fn delete_one(&self, _: Collection, _: ObjectId) -> Result<DeleteOutcome, DatabaseError> {
            panic!("store reached")
        }
        async fn insert_if_absent(&self, _: Collection, _: Document, _: Document) -> Result<ConditionalInsert, DatabaseError> {
            panic!("store reached")
        }
        async fn ping(&self) -> Result<(), DatabaseError> {
            panic!("store reached")
        }
        async fn shutdown(&self) {}
    }

    fn gated_context() -> TestContext {
        let mut ctx = TestContext::new();
        ctx.state = AppState {
            store: Arc::new(UnreachableStore),
            config: ctx.state.config.clone(),
        };
        ctx
    }

    fn protected_requests() -> Vec<(Method, String, Option<serde_json::Value>)> {
        let id = ObjectId::new().to_hex();
        vec![
            (Method::GET, "/recipies".to_string(), None),
            (Method::GET, "/cart?email=u1@x.com".to_string(), None),
            (
                Method::POST,
                "/add-to-kitchen".to_string(),
                Some(json!({ "recipieId": "abc", "email": "u1@x.com" })),
            ),
            (Method::PUT, format!("/recipie/{}", id), Some(json!({ "strMeal": "Soup" }))),
            (Method::DELETE, format!("/recipie/{}", id), None),
        ]
    }

    #[tokio::test]
    async fn missing_cookie_is_unauthorized_without_store_access() {
        let ctx = gated_context();
        for (method, uri, body) in protected_requests() {
            let (status, body) = ctx.send(method.clone(), &uri, None, body).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
            assert_eq!(body["success"], false);
            assert_eq!(body["message"], "Unauthorized");
        }
    }

    #[tokio::test]
    async fn tampered_token_is_forbidden() {
        let ctx = gated_context();
        let mut token = ctx.token();
        token.push('x');
        let cookie = format!("token={}", token);

        for (method, uri, body) in protected_requests() {
            let (status, body) = ctx.send(method.clone(), &uri, Some(&cookie), body).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{} {}", method, uri);
            assert_eq!(body["success"], false);
        }
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_forbidden() {
        let ctx = gated_context();
        let claims = Claims::new(json!({ "uid": "u1" }).as_object().cloned().unwrap(), Utc::now(), 10);
        let token = sign_claims(&claims, "not-the-server-secret").unwrap();

        let (status, _) = ctx.send(Method::GET, "/recipies", Some(&format!("token={}", token)), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn expired_token_is_forbidden() {
        let ctx = gated_context();
        let claims = Claims::new(
            json!({ "uid": "u1" }).as_object().cloned().unwrap(),
            Utc::now() - Duration::hours(11),
            10,
        );
        let token = sign_claims(&claims, TEST_SECRET).unwrap();

        let (status, body) = ctx.send(Method::GET, "/recipies", Some(&format!("token={}", token)), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn valid_token_reaches_the_handler() {
        let ctx = TestContext::new();
        let (status, body) = ctx.send(Method::GET, "/recipies", Some(&ctx.cookie()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn bearer_header_is_not_accepted() {
        let ctx = gated_context();
        let request = axum::http::Request::get("/recipies")
            .header("authorization", format!("Bearer {}", ctx.token()))
            .body(axum::body::Body::empty())
            .unwrap();
        let response = tower::ServiceExt::oneshot(ctx.app(), request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
