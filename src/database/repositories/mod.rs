//! Repository layer for database access.
//!
//! This module implements the Repository Pattern to abstract all database
//! interactions, creating a clean and maintainable data access layer.

pub mod item;
pub mod publish_queue;
pub mod task;

pub use item::*;
pub use publish_queue::*;
pub use task::*;
