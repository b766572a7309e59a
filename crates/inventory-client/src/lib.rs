//! Implementations of the order side's inventory boundary.
//!
//! [`HttpInventoryClient`] crosses the process boundary over HTTP with a
//! bounded per-call timeout and translates transport and status outcomes
//! into the domain taxonomy. [`LocalInventoryClient`] bridges the same
//! trait onto an in-process [`inventory::ProductService`] for
//! single-binary deployments.

pub mod http;
pub mod local;

pub use http::HttpInventoryClient;
pub use local::LocalInventoryClient;
