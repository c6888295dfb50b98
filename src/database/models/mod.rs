//! Database models for clipflow.
//!
//! These models map directly to the database schema and handle
//! serialization/deserialization of JSON fields.

pub mod item;
pub mod publish_job;
pub mod task;

pub use item::*;
pub use publish_job::*;
pub use task::*;
