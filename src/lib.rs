//! clipflow library crate.
//!
//! Short-form content pipeline core: item/task lifecycle tracking, the
//! publish scheduling queue, per-platform daily rate limiting, and the
//! discovery-side viral filter.

pub mod config;
pub mod database;
pub mod discovery;
pub mod error;
pub mod pipeline;
pub mod publishing;
pub mod utils;

pub use config::PipelineConfig;
pub use error::{Error, Result};
