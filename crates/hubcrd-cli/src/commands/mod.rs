//! CLI commands

pub mod kinds;
pub mod validate;
