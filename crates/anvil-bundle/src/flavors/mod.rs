//! Built-in model flavors.
//!
//! A flavor names the convention for serializing one model family inside a
//! bundle. Heterogeneous native formats all come back as `Box<dyn
//! Predictor>` and are invoked identically by serving code.

mod linear;
mod lookup;

pub use linear::{load_linear_artifact, LinearFlavor, LinearModel, LINEAR_ARTIFACT_LOADER, LINEAR_FLAVOR};
pub use lookup::{LookupFlavor, LookupModel, LOOKUP_FLAVOR};
