//! Shared types for the order system: entity identifiers, money amounts,
//! and the per-request caller identity.

pub mod auth;
pub mod types;

pub use auth::{BearerToken, Caller, Role};
pub use types::{Money, OrderId, ProductId, UserId};
