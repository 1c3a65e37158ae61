use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use mongodb::bson::{oid::ObjectId, Document};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::auth::issue_token;
use crate::config::AppConfig;
use crate::database::store::{
    Collection, ConditionalInsert, DeleteOutcome, DocumentStore, Filter, InsertOneOutcome, Projection, UpdateOutcome,
};
use crate::database::{DatabaseError, MemoryStore};
use crate::state::AppState;

pub const TEST_SECRET: &str = "test-access-token-secret";

/// Router plus direct handles on its store, for oneshot tests
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
}

impl TestContext {
    /// Context whose store fails every call with the error `fail` builds
    pub fn failing(fail: fn() -> DatabaseError) -> Self {
        let mut ctx = Self::new();
        ctx.state = AppState {
            store: Arc::new(FailingStore(fail)),
            config: ctx.state.config.clone(),
        };
        ctx
    }

    pub fn new() -> Self {
        let mut config = AppConfig::development();
        config.security.token_secret = TEST_SECRET.to_string();

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), config);
        Self { store, state }
    }

    pub fn app(&self) -> Router {
        crate::app(self.state.clone())
    }

    /// A valid token for `{ uid: "u1" }`
    pub fn token(&self) -> String {
        let payload = json!({ "uid": "u1" }).as_object().cloned().unwrap_or_default();
        issue_token(payload, &self.state.config.security)
            .expect("test secret is configured")
            .token
    }

    pub fn cookie(&self) -> String {
        format!("{}={}", self.state.config.security.cookie_name, self.token())
    }

    /// Send one request through a fresh router and decode the JSON body (Null when empty)
    pub async fn send(&self, method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self.app().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}

/// Store whose every operation returns the same error
pub struct FailingStore(pub fn() -> DatabaseError);

#[async_trait]
impl DocumentStore for FailingStore {
    async fn find(&self, _: Collection, _: Filter, _: Projection) -> Result<Vec<Document>, DatabaseError> {
        Err((self.0)())
    }
    async fn find_one(&self, _: Collection, _: Filter) -> Result<Option<Document>, DatabaseError> {
        Err((self.0)())
    }
    async fn insert_one(&self, _: Collection, _: Document) -> Result<InsertOneOutcome, DatabaseError> {
        Err((self.0)())
    }
    async fn update_one(&self, _: Collection, _: ObjectId, _: Document, _: bool) -> Result<UpdateOutcome, DatabaseError> {
        Err((self.0)())
    }
    async fn delete_one(&self, _: Collection, _: ObjectId) -> Result<DeleteOutcome, DatabaseError> {
        Err((self.0)())
    }
    async fn insert_if_absent(&self, _: Collection, _: Document, _: Document) -> Result<ConditionalInsert, DatabaseError> {
        Err((self.0)())
    }
    async fn ping(&self) -> Result<(), DatabaseError> {
        Err((self.0)())
    }
    async fn shutdown(&self) {}
}
