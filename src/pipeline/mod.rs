//! Pipeline lifecycle rules.

pub mod transitions;

pub use transitions::StatusMachine;
