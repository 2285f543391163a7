//! Lifecycle event pipeline.
//!
//! Every mutating deployment step is wrapped in before/after event dispatch.
//! Handlers are polymorphic over a capability set: the trait has one
//! default-no-op method per event category, so a handler implements only
//! the categories it cares about.
//!
//! "Before" handlers receive a mutable payload (the pending file list); a
//! fault there aborts the pending operation, since the payload may be left
//! inconsistent. "After" and notification handlers are isolated from each
//! other: a fault is logged and remaining handlers still run.

use crate::core::{DockhandError, DockhandResult};
use crate::package::{InstallableFileInfo, PackageId};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Capability set for deployment lifecycle handlers
#[allow(unused_variables)]
pub trait EventHandler: Send + Sync {
    /// May edit the list of files about to be installed
    fn before_install(
        &self,
        package: &PackageId,
        files: &mut Vec<InstallableFileInfo>,
    ) -> DockhandResult<()> {
        Ok(())
    }

    fn after_install(
        &self,
        package: &PackageId,
        files: &[InstallableFileInfo],
    ) -> DockhandResult<()> {
        Ok(())
    }

    /// May edit the list of file paths about to be removed
    fn before_uninstall(
        &self,
        package: &PackageId,
        files: &mut Vec<String>,
    ) -> DockhandResult<()> {
        Ok(())
    }

    fn after_uninstall(&self, package: &PackageId) -> DockhandResult<()> {
        Ok(())
    }

    fn before_maintenance(&self, package: &PackageId) -> DockhandResult<()> {
        Ok(())
    }

    fn after_maintenance(&self, package: &PackageId) -> DockhandResult<()> {
        Ok(())
    }

    /// Notification that a package's payload arrived in the staging area
    fn after_download(&self, package: &PackageId, staged_path: &Path) -> DockhandResult<()> {
        Ok(())
    }
}

/// Dispatches lifecycle events synchronously, in registration order.
///
/// Registration may race with dispatch; dispatch snapshots the registry
/// under the read lock so handlers never observe mutation mid-iteration.
#[derive(Default)]
pub struct EventPipeline {
    handlers: RwLock<Vec<(String, Arc<dyn EventHandler>)>>,
}

impl EventPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a name. Names are how persisted
    /// configuration refers to handlers; duplicates are allowed and fire in
    /// registration order.
    pub fn register(&self, name: impl Into<String>, handler: Arc<dyn EventHandler>) {
        let name = name.into();
        tracing::debug!(handler = %name, "registering event handler");
        self.handlers
            .write()
            .expect("event handler registry poisoned")
            .push((name, handler));
    }

    /// Unregister all handlers with the given name
    pub fn unregister(&self, name: &str) {
        self.handlers
            .write()
            .expect("event handler registry poisoned")
            .retain(|(n, _)| n != name);
    }

    fn snapshot(&self) -> Vec<(String, Arc<dyn EventHandler>)> {
        self.handlers
            .read()
            .expect("event handler registry poisoned")
            .clone()
    }

    /// Dispatch a "before" event. The first handler fault aborts with
    /// `EventHandlerFailed`; the payload may already be half-edited.
    fn dispatch_before<F>(&self, event: &str, package: &PackageId, mut call: F) -> DockhandResult<()>
    where
        F: FnMut(&dyn EventHandler) -> DockhandResult<()>,
    {
        for (name, handler) in self.snapshot() {
            if let Err(e) = call(handler.as_ref()) {
                tracing::warn!(handler = %name, event, package = %package.name, error = %e,
                    "before-event handler failed; aborting pending operation");
                return Err(DockhandError::EventHandlerFailed {
                    package: package.name.clone(),
                    event: event.to_string(),
                    message: e.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Dispatch an "after"/notification event. Handler faults are logged
    /// and do not prevent remaining handlers from running.
    fn dispatch_after<F>(&self, event: &str, package: &PackageId, mut call: F)
    where
        F: FnMut(&dyn EventHandler) -> DockhandResult<()>,
    {
        for (name, handler) in self.snapshot() {
            if let Err(e) = call(handler.as_ref()) {
                tracing::warn!(handler = %name, event, package = %package.name, error = %e,
                    "event handler failed; continuing with remaining handlers");
            }
        }
    }

    pub fn before_install(
        &self,
        package: &PackageId,
        files: &mut Vec<InstallableFileInfo>,
    ) -> DockhandResult<()> {
        self.dispatch_before("before-install", package, |h| {
            h.before_install(package, files)
        })
    }

    pub fn after_install(&self, package: &PackageId, files: &[InstallableFileInfo]) {
        self.dispatch_after("after-install", package, |h| h.after_install(package, files));
    }

    pub fn before_uninstall(
        &self,
        package: &PackageId,
        files: &mut Vec<String>,
    ) -> DockhandResult<()> {
        self.dispatch_before("before-uninstall", package, |h| {
            h.before_uninstall(package, files)
        })
    }

    pub fn after_uninstall(&self, package: &PackageId) {
        self.dispatch_after("after-uninstall", package, |h| h.after_uninstall(package));
    }

    pub fn before_maintenance(&self, package: &PackageId) -> DockhandResult<()> {
        self.dispatch_before("before-maintenance", package, |h| {
            h.before_maintenance(package)
        })
    }

    pub fn after_maintenance(&self, package: &PackageId) {
        self.dispatch_after("after-maintenance", package, |h| h.after_maintenance(package));
    }

    pub fn after_download(&self, package: &PackageId, staged_path: &Path) {
        self.dispatch_after("after-download", package, |h| {
            h.after_download(package, staged_path)
        });
    }
}
