//! Message building utilities for tool responses.
//!
//! Readable output is markdown the platform renders for analysts.

mod builder;

pub use builder::TableBuilder;
