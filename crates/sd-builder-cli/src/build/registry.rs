//! Explicit step table built once at startup.

use std::collections::BTreeMap;
use std::sync::Arc;

use sd_builder_bundler::{BundlerBackend, RolldownBackend};

use crate::build::step::{BuildStep, StepDescriptor, StepId};
use crate::build::steps::{
    AllScriptsStep, AppAssetsStep, AppChangelogStep, AppConfigStep, AppVersionStep, MainHtmlStep,
    VendorFontsStep, VendorStylesStep,
};
use crate::error::BuildError;

/// Maps each [`StepId`] to its implementation.
#[derive(Default)]
pub struct StepRegistry {
    steps: BTreeMap<StepId, Arc<dyn BuildStep>>,
}

impl StepRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every standard step, bundling scripts with Rolldown.
    pub fn standard() -> Self {
        Self::with_backend(Arc::new(RolldownBackend::new()))
    }

    /// Every standard step, bundling scripts with `backend`.
    pub fn with_backend(backend: Arc<dyn BundlerBackend>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(MainHtmlStep));
        registry.register(Arc::new(AllScriptsStep::new(backend)));
        registry.register(Arc::new(AppAssetsStep));
        registry.register(Arc::new(AppVersionStep));
        registry.register(Arc::new(AppChangelogStep));
        registry.register(Arc::new(VendorStylesStep));
        registry.register(Arc::new(VendorFontsStep));
        registry.register(Arc::new(AppConfigStep));
        registry
    }

    /// Register `step` under its descriptor id, returning any step it replaced.
    pub fn register(&mut self, step: Arc<dyn BuildStep>) -> Option<Arc<dyn BuildStep>> {
        let id = step.descriptor().id;
        self.steps.insert(id, step)
    }

    pub fn get(&self, id: StepId) -> Result<Arc<dyn BuildStep>, BuildError> {
        self.steps
            .get(&id)
            .cloned()
            .ok_or(BuildError::NotRegistered(id))
    }

    pub fn contains(&self, id: StepId) -> bool {
        self.steps.contains_key(&id)
    }

    pub fn descriptors(&self) -> Vec<StepDescriptor> {
        self.steps.values().map(|step| step.descriptor()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.steps.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::steps::RESERVED_ASSET_DIRS;

    #[test]
    fn test_standard_registers_every_step() {
        let registry = StepRegistry::standard();
        assert_eq!(registry.len(), StepId::ALL.len());
        for id in StepId::ALL {
            assert!(registry.contains(id), "{} missing", id);
        }
    }

    #[test]
    fn test_outputs_have_one_owner() {
        let registry = StepRegistry::standard();
        let descriptors = registry.descriptors();
        for (i, a) in descriptors.iter().enumerate() {
            for b in &descriptors[i + 1..] {
                assert_ne!(a.output, b.output, "{} and {} share an output", a.id, b.id);

                let (outer, inner) = if b.output.starts_with(&format!("{}/", a.output)) {
                    (a, b)
                } else if a.output.starts_with(&format!("{}/", b.output)) {
                    (b, a)
                } else {
                    continue;
                };

                // Only app-assets may contain other outputs, and only under
                // directories it never writes to.
                assert_eq!(outer.id, StepId::AppAssets, "{} contains {}", outer.id, inner.id);
                let subdir = inner.output[outer.output.len() + 1..]
                    .split('/')
                    .next()
                    .unwrap();
                assert!(
                    RESERVED_ASSET_DIRS.contains(&subdir),
                    "{} writes into {}/{}, which app-assets copies",
                    inner.id,
                    outer.output,
                    subdir
                );
            }
        }
    }

    #[test]
    fn test_missing_step_is_not_registered_error() {
        let registry = StepRegistry::new();
        assert!(matches!(
            registry.get(StepId::MainHtml),
            Err(BuildError::NotRegistered(StepId::MainHtml))
        ));
    }
}
