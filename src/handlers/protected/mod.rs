// handlers/protected/mod.rs - Protected handlers (token cookie required)
//
// Every route here is layered with middleware::require_token, so handlers can
// rely on a verified crate::auth::Claims in the request extensions.

pub mod kitchen;
pub mod recipes;
