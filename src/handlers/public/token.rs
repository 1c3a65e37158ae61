use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::auth::{issue_token, token_cookie};
use crate::error::ApiError;
use crate::middleware::Valid;
use crate::state::AppState;
use crate::types::TokenPayload;

/// POST /jwt - sign the request body into a token
///
/// The token is returned twice: as an http-only cookie for the browser and as
/// `{ success: true, token }` in the body.
pub async fn issue(
    State(state): State<AppState>,
    Valid(TokenPayload(payload)): Valid<TokenPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let security = &state.config.security;
    let issued = issue_token(payload, security)?;
    tracing::info!("Issued token expiring at {}", issued.expires_at);

    let cookie = token_cookie(&issued, security);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "success": true, "token": issued.token })),
    ))
}
