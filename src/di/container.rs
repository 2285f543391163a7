//! Deployment context: the per-run service container.
//!
//! Each product-deployment run owns its own context instance — resolver,
//! strategy provider, store, event pipeline, and activator — so runs never
//! interfere through global state and tests are fully isolated.

use super::traits::{DeploymentStrategyProvider, Resolver};
use crate::activator::EntityActivator;
use crate::core::DockhandResult;
use crate::events::EventPipeline;
use crate::store::ProductConfigurationStore;
use std::sync::{Arc, RwLock};

/// Services for one product-deployment run.
///
/// The store sits behind a single-writer, multiple-reader lock scoped to
/// one product installation: configuration queries may run in parallel,
/// while `set`/`remove`/`save` are mutually exclusive with each other and
/// with any concurrent store access through the same context. The lock is
/// held per store operation, not for a whole orchestrator run; a writer
/// sharing the context can interleave between packages of a run, and every
/// state it observes is a consistent completed prefix.
#[derive(Clone)]
pub struct DeploymentContext {
    pub resolver: Arc<dyn Resolver>,
    pub strategy: Arc<dyn DeploymentStrategyProvider>,
    pub store: Arc<RwLock<ProductConfigurationStore>>,
    pub pipeline: Arc<EventPipeline>,
    pub activator: Arc<EntityActivator>,
}

impl DeploymentContext {
    /// Create a context with injected boundary implementations and a fresh
    /// pipeline and activator.
    pub fn new(
        resolver: Arc<dyn Resolver>,
        strategy: Arc<dyn DeploymentStrategyProvider>,
        store: ProductConfigurationStore,
    ) -> Self {
        Self {
            resolver,
            strategy,
            store: Arc::new(RwLock::new(store)),
            pipeline: Arc::new(EventPipeline::new()),
            activator: Arc::new(EntityActivator::new()),
        }
    }

    /// Instantiate the handler registered under `key` in the activator and
    /// attach it to the event pipeline. Used when persisted configuration
    /// names handlers to run for this product.
    pub fn attach_handler(&self, key: &str) -> DockhandResult<()> {
        let handler = self.activator.activate(key)?;
        self.pipeline.register(key, handler);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DockhandError, DockhandResult};
    use crate::events::EventHandler;
    use crate::graph::ResolvedPackage;
    use crate::package::{InstallableFileInfo, PackageId, VersionedPackageInfo};
    use async_trait::async_trait;
    use std::path::Path;
    use tempfile::TempDir;

    struct EmptyResolver;

    #[async_trait]
    impl Resolver for EmptyResolver {
        async fn resolve(&self, _requests: &[PackageId]) -> DockhandResult<Vec<ResolvedPackage>> {
            Ok(Vec::new())
        }
    }

    struct EmptyStrategy;

    impl DeploymentStrategyProvider for EmptyStrategy {
        fn candidate_files(
            &self,
            _package: &VersionedPackageInfo,
            _package_path: &Path,
        ) -> DockhandResult<Vec<InstallableFileInfo>> {
            Ok(Vec::new())
        }
    }

    struct NoopHandler;
    impl EventHandler for NoopHandler {}

    fn context(dir: &TempDir) -> DeploymentContext {
        let store = ProductConfigurationStore::load(dir.path()).unwrap();
        DeploymentContext::new(Arc::new(EmptyResolver), Arc::new(EmptyStrategy), store)
    }

    #[test]
    fn test_attach_handler_from_activator() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        ctx.activator
            .register("Audit.Handler", || Arc::new(NoopHandler));

        ctx.attach_handler("Audit.Handler").unwrap();
    }

    #[test]
    fn test_attach_unknown_handler_fails() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let result = ctx.attach_handler("Ghost.Handler");
        assert!(matches!(result, Err(DockhandError::TypeNotFound(_))));
    }
}
