use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::SecurityConfig;

/// Claims carried by an access token: whatever the caller asked to sign, plus timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub payload: Map<String, Value>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(payload: Map<String, Value>, issued_at: DateTime<Utc>, expiry_hours: i64) -> Self {
        Self {
            payload,
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::hours(expiry_hours)).timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("{0}")]
    Verification(#[from] jsonwebtoken::errors::Error),
}

/// A freshly signed token together with its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn sign_claims(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Sign the payload with the configured secret and expiry
pub fn issue_token(payload: Map<String, Value>, security: &SecurityConfig) -> Result<IssuedToken, JwtError> {
    let now = Utc::now();
    let claims = Claims::new(payload, now, security.token_expiry_hours);
    let token = sign_claims(&claims, &security.token_secret)?;

    Ok(IssuedToken {
        token,
        expires_at: now + Duration::hours(security.token_expiry_hours),
    })
}

/// Check signature and expiry, returning the decoded claims
pub fn verify_token(token: &str, security: &SecurityConfig) -> Result<Claims, JwtError> {
    if security.token_secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.token_secret.as_bytes());
    // Payloads are caller-defined, so an `aud` claim is carried, not enforced
    let mut validation = Validation::default();
    validation.validate_aud = false;

    let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
    Ok(token_data.claims)
}

/// Set-Cookie value carrying the token: http-only, root path, lifetime as both Max-Age and Expires
pub fn token_cookie(issued: &IssuedToken, security: &SecurityConfig) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; Expires={}; HttpOnly",
        security.cookie_name,
        issued.token,
        security.token_expiry_hours * 3600,
        issued.expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
    );
    if security.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Find a cookie value by name across all Cookie headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
