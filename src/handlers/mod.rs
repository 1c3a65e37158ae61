// handlers/mod.rs - two security tiers
//
// Public (no auth) → Protected (token cookie required)
pub mod protected; // Routes layered with middleware::require_token
pub mod public;    // Open routes, including token issuance
pub mod utils;

use axum::Json;

use crate::error::ApiError;

/// Handlers reply with the raw store result as JSON, or a structured error
pub type ApiResult<T> = Result<Json<T>, ApiError>;
