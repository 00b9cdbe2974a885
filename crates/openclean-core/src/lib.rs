#![forbid(unsafe_code)]
//! openclean-core: values, rows, and schemas shared by every stage of a data
//! stream pipeline.
//!
//! Design intent:
//! - Pure data; no IO and no operator logic lives here.
//! - Columns carry a stable identifier and a display name. Every crate resolves
//!   column references through [`schema::Schema::resolve`] so that the identity
//!   model is applied uniformly.
//! - Terminal results (`DataFrame`, `Counter`) are defined here so that callers
//!   can use them without depending on the operator crate.

pub mod config;
pub mod counter;
pub mod error;
pub mod frame;
pub mod id;
pub mod prelude;
pub mod schema;
pub mod types;

pub use error::{Error, Result};
