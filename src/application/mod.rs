//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Handlers take their collaborators as `Arc<dyn Port>` at construction.

pub mod handlers;

pub use handlers::*;
