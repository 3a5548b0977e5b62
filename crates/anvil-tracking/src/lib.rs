//! Anvil Tracking
//!
//! REST client for the workspace's experiment-tracking service. Endpoints
//! hang off the workspace tracking base URL under the fixed
//! `api/2.0/mlflow` suffix; responses are plain JSON objects with a named
//! list field.

pub mod client;
pub mod error;

pub use client::{Experiment, Run, RunInfo, TrackingClient, MLFLOW_API_SUFFIX};
pub use error::{TrackingError, TrackingResult};
