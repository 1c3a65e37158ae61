//! Request bodies accepted by the API and their validation rules

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::middleware::Validate;

/// Claims the token issuer sets itself and will not take from callers
const RESERVED_CLAIMS: [&str; 3] = ["exp", "iat", "nbf"];

/// Arbitrary JSON object to be signed into a token
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct TokenPayload(pub Map<String, Value>);

impl Validate for TokenPayload {
    fn validate(&self) -> Result<(), ApiError> {
        match RESERVED_CLAIMS.iter().find(|claim| self.0.contains_key(**claim)) {
            Some(claim) => Err(ApiError::invalid_field(*claim, "reserved claim is set by the server")),
            None => Ok(()),
        }
    }
}

/// Recipe document as sent by clients; stored verbatim
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct RecipeDocument(pub Map<String, Value>);

impl Validate for RecipeDocument {
    fn validate(&self) -> Result<(), ApiError> {
        check_document_keys(&self.0)
    }
}

/// Fields to `$set` on an existing recipe
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct RecipeUpdate(pub Map<String, Value>);

impl Validate for RecipeUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            return Err(ApiError::validation_error("Update body must contain at least one field", None));
        }
        check_document_keys(&self.0)
    }
}

/// A recipe saved to a user's kitchen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitchenEntry {
    #[serde(rename = "recipieId")]
    pub recipie_id: String,
    pub email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KitchenEntry {
    /// All fields as one document, key fields included
    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = self.extra;
        fields.insert("recipieId".to_string(), Value::String(self.recipie_id));
        fields.insert("email".to_string(), Value::String(self.email));
        fields
    }
}

impl Validate for KitchenEntry {
    fn validate(&self) -> Result<(), ApiError> {
        if self.recipie_id.trim().is_empty() {
            return Err(ApiError::invalid_field("recipieId", "must not be empty"));
        }
        if self.email.trim().is_empty() {
            return Err(ApiError::invalid_field("email", "must not be empty"));
        }
        check_document_keys(&self.extra)
    }
}

/// Ids are assigned by the server and operator keys would be interpreted by the store
fn check_document_keys(fields: &Map<String, Value>) -> Result<(), ApiError> {
    for key in fields.keys() {
        if key == "_id" {
            return Err(ApiError::invalid_field(key.as_str(), "is assigned by the server"));
        }
        if key.starts_with('$') {
            return Err(ApiError::invalid_field(key.as_str(), "field names must not start with '$'"));
        }
    }
    Ok(())
}
