use mongodb::bson::oid::ObjectId;

use crate::error::ApiError;

/// Fields left out of recipe listings
pub const RECIPE_LIST_EXCLUDED: &[&str] = &["strYoutube", "strTags", "strInstructions"];

/// Parse a path id; malformed ids are a client error, not a store failure
pub fn parse_object_id(id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id.trim()).map_err(|_| ApiError::bad_request(format!("Invalid id '{}'", id)))
}
