// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, read-only catalog routes, and the two open mutations
// (recipe creation and kitchen entry removal) that the front end calls anonymously.

pub mod cart;
pub mod categories;
pub mod health;
pub mod recipes;
pub mod token;
