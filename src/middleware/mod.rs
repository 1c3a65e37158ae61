pub mod auth;
pub mod extract;
pub mod validate;

pub use auth::require_token;
pub use extract::{ApiPath, ApiQuery};
pub use validate::{Valid, Validate};
