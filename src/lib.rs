//! Dockhand — package deployment orchestration for plugin-style applications.
//!
//! Given a set of requested packages, Dockhand computes an install/uninstall
//! dependency order, stages and applies file changes with conflict handling,
//! fires lifecycle events around each mutating step, and persists a
//! product-level record of installed packages, files, and dependency edges.
//!
//! Version resolution against a package feed, manifest parsing, and plugin
//! loading are external collaborators injected through [`di::DeploymentContext`].

/// Core error and path types.
pub mod core;

/// Package identity and file value types.
pub mod package;

/// Dependency graph and ordering traversals.
pub mod graph;

/// File-conflict resolution policy.
pub mod conflict;

/// Persisted product configuration store.
pub mod store;

/// Lifecycle event pipeline.
pub mod events;

/// Named handler activation registry.
pub mod activator;

/// Dependency injection infrastructure.
pub mod di;

/// Deployment orchestration.
pub mod deploy;

pub use crate::core::{DockhandError, DockhandResult};

pub use activator::EntityActivator;
pub use conflict::{ConflictPolicy, ConflictResolver};
pub use deploy::{DeploymentOrchestrator, Operation, RunReport, RunStep};
pub use di::DeploymentContext;
pub use events::{EventHandler, EventPipeline};
pub use graph::{OrderingMode, PackageGraph, ResolvedPackage};
pub use package::{InstallableFileInfo, PackageId, VersionedPackageInfo};
pub use store::{PackageConfiguration, ProductConfigurationStore};
