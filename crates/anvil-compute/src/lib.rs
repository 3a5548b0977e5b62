//! Anvil Compute
//!
//! Management client for attaching and detaching a managed Spark compute
//! pool. Every operation is a one-shot create-or-update, delete, or get
//! against the workspace's compute path; no local state is retained.

pub mod client;
pub mod error;

pub use client::{ComputeClient, ComputeIdentity, ComputeResource, SparkComputeSpec, API_VERSION};
pub use error::{ComputeError, ComputeResult};
