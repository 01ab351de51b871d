//! CLI command implementations.

pub mod capabilities;
pub mod common;
pub mod run;
pub mod validate;
pub mod version;
