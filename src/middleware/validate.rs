use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Request bodies that check their own invariants after parsing
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

/// JSON body extractor that rejects malformed input with a structured 400
/// and then runs [`Validate::validate`]. Every mutating route takes its body through this.
#[derive(Debug, Clone)]
pub struct Valid<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}
