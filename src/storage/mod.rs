//! Storage layer
//!
//! Generic repositories over SurrealDB or an in-process map.

pub mod factory;
pub mod memory;
pub mod repository;

#[cfg(feature = "surrealdb")]
pub mod surrealdb;

pub use factory::{Repositories, StorageBackend, StorageFactory};
