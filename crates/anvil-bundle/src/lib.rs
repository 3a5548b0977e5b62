//! Anvil Bundle
//!
//! The model bundle contract: directory-shaped artifacts whose manifest is
//! the single source of truth for reconstructing a callable predictor.
//!
//! - Manifest and entry points (`BundleManifest`, `EntryPoint`)
//! - Artifact staging, resolution, and digest verification
//! - Registry filesystem layout (`RegistryLayout`)
//! - Loader registry and built-in flavors (`LoaderRegistry`)
//! - Versioned, immutable model store (`ModelStore`)

pub mod artifacts;
pub mod error;
pub mod flavors;
pub mod layout;
pub mod loader;
pub mod manifest;
pub mod store;

pub use artifacts::{
    resolve_artifacts, sha256_file, stage_artifact, stage_source, verify_artifacts,
    ArtifactEntry, ARTIFACTS_DIR, SOURCES_DIR,
};
pub use error::{BundleError, BundleResult};
pub use flavors::{
    load_linear_artifact, LinearFlavor, LinearModel, LookupFlavor, LookupModel,
    LINEAR_ARTIFACT_LOADER, LINEAR_FLAVOR, LOOKUP_FLAVOR,
};
pub use layout::RegistryLayout;
pub use loader::{Flavor, LoaderFn, LoaderRegistry, PredictorHandle};
pub use manifest::{BundleManifest, EntryPoint, MANIFEST_FILE, MANIFEST_FORMAT};
pub use store::{LogEntryPoint, LogModelRequest, ModelEntry, ModelStore, EMBEDDED_STATE_FILE};
