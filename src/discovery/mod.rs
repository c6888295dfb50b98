//! Discovery-side rules.
//!
//! The discovery collaborator itself (platform API fetch) lives outside
//! this crate; only the candidate gate that decides what enters the
//! pipeline lives here.

pub mod filter;

pub use filter::{FilterConfig, FilterStats, RawVideo, ViralCandidate, filter_candidates};
