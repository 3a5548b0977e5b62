//! Loader registry: resolves a manifest entry point into a live predictor.
//!
//! The registry maps symbolic ids to statically registered factories. A
//! bundle never names a module to import; an unknown id fails with
//! `LoaderResolution`.

use crate::artifacts::resolve_artifacts;
use crate::error::{BundleError, BundleResult};
use crate::flavors::{LinearFlavor, LookupFlavor, LINEAR_ARTIFACT_LOADER};
use crate::manifest::{BundleManifest, EntryPoint};
use anvil_abstraction::{Frame, LoadContext, Predictor, Signature};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A deferred loader: invoked at load time with the resolved path of the
/// entry point's artifact (or the bundle directory when none is named).
pub type LoaderFn = Arc<dyn Fn(&Path) -> BundleResult<Box<dyn Predictor>> + Send + Sync>;

/// A named convention for reconstructing a predictor from embedded adapter
/// state.
pub trait Flavor: Send + Sync {
    /// Registered flavor id.
    fn id(&self) -> &'static str;

    /// Deserializes embedded state back into a predictor.
    ///
    /// # Errors
    /// Returns a `BundleError` if the state does not describe a valid
    /// model of this flavor.
    fn load_embedded(
        &self,
        state: &Value,
        ctx: &LoadContext,
    ) -> BundleResult<Box<dyn Predictor>>;
}

/// Registry of flavors and deferred loaders.
pub struct LoaderRegistry {
    flavors: BTreeMap<String, Arc<dyn Flavor>>,
    loaders: BTreeMap<String, LoaderFn>,
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LoaderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self { flavors: BTreeMap::new(), loaders: BTreeMap::new() }
    }

    /// Creates a registry with the built-in flavors and loaders.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register_flavor(Arc::new(LinearFlavor));
        registry.register_flavor(Arc::new(LookupFlavor));
        registry.register_loader(
            LINEAR_ARTIFACT_LOADER,
            Arc::new(|data: &Path| crate::flavors::load_linear_artifact(data)),
        );
        registry
    }

    /// Registers a flavor under its id, replacing any previous entry.
    pub fn register_flavor(&mut self, flavor: Arc<dyn Flavor>) {
        self.flavors.insert(flavor.id().to_string(), flavor);
    }

    /// Registers a deferred loader under a symbolic id.
    pub fn register_loader(&mut self, id: impl Into<String>, loader: LoaderFn) {
        self.loaders.insert(id.into(), loader);
    }

    /// Resolves a manifest into a predictor handle.
    ///
    /// Every declared artifact is resolved before any factory runs, so a
    /// broken bundle fails with `UnresolvedArtifact` without executing
    /// loader code.
    ///
    /// # Errors
    /// `UnresolvedArtifact` for missing artifact files, `LoaderResolution`
    /// for unregistered ids, `InvalidManifest` when the entry point names
    /// an undeclared artifact.
    pub fn resolve(
        &self,
        manifest: &BundleManifest,
        bundle_dir: &Path,
    ) -> BundleResult<PredictorHandle> {
        let artifacts = resolve_artifacts(bundle_dir, &manifest.artifacts)?;
        let ctx = LoadContext::new(bundle_dir.to_path_buf(), artifacts);

        let mut predictor = match &manifest.entry_point {
            EntryPoint::Embedded { flavor, state } => {
                let f = self.flavors.get(flavor).ok_or_else(|| {
                    BundleError::LoaderResolution(format!("unknown flavor '{flavor}'"))
                })?;
                let state_path = bundle_dir.join(state);
                if !state_path.exists() {
                    return Err(BundleError::Artifact(format!(
                        "embedded state missing: {}",
                        state_path.display()
                    )));
                }
                let value: Value = serde_json::from_slice(&std::fs::read(&state_path)?)?;
                f.load_embedded(&value, &ctx)?
            }
            EntryPoint::Deferred { loader, artifact } => {
                let l = self.loaders.get(loader).ok_or_else(|| {
                    BundleError::LoaderResolution(format!("unknown loader '{loader}'"))
                })?;
                let data = match artifact {
                    Some(name) => ctx
                        .artifact_path(name)
                        .ok_or_else(|| {
                            BundleError::InvalidManifest(format!(
                                "entry point references undeclared artifact '{name}'"
                            ))
                        })?
                        .to_path_buf(),
                    None => ctx.bundle_dir.clone(),
                };
                l(&data)?
            }
        };

        predictor.load_context(&ctx)?;
        Ok(PredictorHandle::new(predictor, manifest.signature.clone()))
    }
}

/// A loaded predictor plus the signature it was logged with.
///
/// The handle is the serving-side view of a bundle: it enforces the
/// declared signature at both edges and delegates inference to the
/// reconstructed predictor.
pub struct PredictorHandle {
    predictor: Box<dyn Predictor>,
    signature: Option<Signature>,
}

impl fmt::Debug for PredictorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredictorHandle")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl PredictorHandle {
    #[must_use]
    pub fn new(predictor: Box<dyn Predictor>, signature: Option<Signature>) -> Self {
        Self { predictor, signature }
    }

    /// The signature declared at logging time, if any.
    #[must_use]
    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// Runs inference, validating input and output against the declared
    /// signature.
    ///
    /// # Errors
    /// Returns `BundleError::SignatureMismatch` for nonconforming frames;
    /// the handle remains usable afterwards.
    pub fn predict(&self, input: &Frame) -> BundleResult<Frame> {
        if let Some(sig) = &self.signature {
            sig.validate_input(input)?;
        }
        let output = self.predictor.predict(input)?;
        if let Some(sig) = &self.signature {
            sig.validate_output(&output)?;
        }
        Ok(output)
    }
}
