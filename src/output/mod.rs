//! Output routing between colored text, plain text, JSON and quiet modes.

pub mod context;

pub use context::{OutputContext, OutputMode};
