//! Command implementations.

pub mod compute;
pub mod experiments;
pub mod models;
