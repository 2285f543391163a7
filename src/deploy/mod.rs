//! Deployment orchestration.
//!
//! The top-level coordinator: accepts a requested operation, asks the
//! external resolver for a dependency list, builds and orders the graph,
//! and drives each package through its before-event / conflict-resolve /
//! apply / after-event cycle, persisting the product record as it goes.
//!
//! On failure inside the per-package loop, already-applied packages are
//! not rolled back; the persisted record reflects exactly the filesystem
//! state that was reached. Consistency, not atomicity, is the guarantee.

pub mod apply;
pub mod strategy;

pub use apply::FileApplier;
pub use strategy::StagedTreeStrategy;

use crate::conflict::{ConflictPolicy, ConflictResolver};
use crate::core::DockhandError;
use crate::di::DeploymentContext;
use crate::graph::{order, OrderingMode, PackageGraph};
use crate::package::{FileAction, PackageId, VersionedPackageInfo};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// The mutating operations a run can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Install,
    Update,
    Uninstall,
}

/// The step a run had reached when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStep {
    Resolving,
    Ordering,
    Staging,
    BeforeEvent,
    ConflictResolution,
    Apply,
    AfterEvent,
    Persisting,
}

impl fmt::Display for RunStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStep::Resolving => "resolving",
            RunStep::Ordering => "ordering",
            RunStep::Staging => "staging",
            RunStep::BeforeEvent => "before-event",
            RunStep::ConflictResolution => "conflict-resolution",
            RunStep::Apply => "apply",
            RunStep::AfterEvent => "after-event",
            RunStep::Persisting => "persisting",
        };
        write!(f, "{}", name)
    }
}

/// Structured failure: which package, at which step, with what error.
/// `package` is absent for failures before the per-package loop.
#[derive(Debug)]
pub struct RunFailure {
    pub package: Option<PackageId>,
    pub step: RunStep,
    pub error: DockhandError,
}

/// Outcome of one orchestrator run. `completed` lists the packages that
/// finished their full before/apply/after cycle and were persisted, so
/// callers can retry the remainder or uninstall the partial set.
#[derive(Debug)]
pub struct RunReport {
    pub operation: Operation,
    pub completed: Vec<PackageId>,
    /// Target paths that were conflicted during this run, per package,
    /// regardless of how policy resolved them
    pub conflicts: Vec<(PackageId, String)>,
    pub failure: Option<RunFailure>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// Drives install, update, and uninstall runs against one product
pub struct DeploymentOrchestrator {
    ctx: DeploymentContext,
    /// Staging area holding one directory per package payload
    package_root: PathBuf,
    /// Mirror of the store's product root; the applier and the store must
    /// agree on where files land
    product_root: PathBuf,
    policy: ConflictPolicy,
}

impl DeploymentOrchestrator {
    pub fn new(ctx: DeploymentContext, package_root: &Path) -> Self {
        let product_root = ctx
            .store
            .read()
            .expect("product store lock poisoned")
            .product_root()
            .to_path_buf();
        Self {
            ctx,
            package_root: package_root.to_path_buf(),
            product_root,
            policy: ConflictPolicy::keep_existing(),
        }
    }

    /// Use a non-default conflict policy for this orchestrator's runs
    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Execute one logical operation over a set of requested packages.
    ///
    /// The per-package loop is sequential in graph order: later packages'
    /// conflict resolution depends on the store state left by earlier ones.
    /// The store lock is taken per store operation rather than for the whole
    /// run, so a concurrent writer on the same context interleaves only at
    /// package boundaries, where the persisted record matches the filesystem.
    pub async fn run(&self, operation: Operation, requests: &[PackageId]) -> RunReport {
        tracing::info!(?operation, requested = requests.len(), "starting deployment run");
        match operation {
            Operation::Install | Operation::Update => self.deploy(operation, requests).await,
            Operation::Uninstall => self.uninstall(requests),
        }
    }

    async fn deploy(&self, operation: Operation, requests: &[PackageId]) -> RunReport {
        let fail = |completed: Vec<PackageId>,
                    conflicts: Vec<(PackageId, String)>,
                    package,
                    step,
                    error| RunReport {
            operation,
            completed,
            conflicts,
            failure: Some(RunFailure {
                package,
                step,
                error,
            }),
        };

        let resolved = match self.ctx.resolver.resolve(requests).await {
            Ok(resolved) => resolved,
            Err(e) => return fail(Vec::new(), Vec::new(), None, RunStep::Resolving, e),
        };
        let graph = match PackageGraph::from_resolved(&resolved) {
            Ok(graph) => graph,
            Err(e) => return fail(Vec::new(), Vec::new(), None, RunStep::Resolving, e),
        };
        let ordered = match order(&graph, OrderingMode::BottomToTop) {
            Ok(ordered) => ordered,
            Err(e) => return fail(Vec::new(), Vec::new(), None, RunStep::Ordering, e),
        };

        let is_update = operation == Operation::Update;
        let resolver = ConflictResolver::new(self.policy.clone());
        let applier = FileApplier::new(&self.product_root);
        let mut completed = Vec::new();
        let mut conflicts: Vec<(PackageId, String)> = Vec::new();

        for id in ordered {
            let Some(node) = graph.get_node(&id.name) else {
                continue;
            };
            let versioned =
                VersionedPackageInfo::new(node.package.clone(), node.resolved_version.clone());

            // An install skips packages already present at the resolved
            // version; an update reapplies them.
            if !is_update {
                let current = self
                    .read_store(|s| s.get_configuration(&id).map(|c| c.resolved_version));
                if current.as_deref() == Some(node.resolved_version.as_str()) {
                    tracing::debug!(package = %id.name, version = %node.resolved_version,
                        "already installed; skipping");
                    continue;
                }
            }

            let staged = self.package_root.join(&node.package.name);
            self.ctx.pipeline.after_download(&id, &staged);

            if is_update {
                if let Err(e) = self.ctx.pipeline.before_maintenance(&id) {
                    return fail(completed, conflicts, Some(id), RunStep::BeforeEvent, e);
                }
            }

            let mut files = match self.ctx.strategy.candidate_files(&versioned, &staged) {
                Ok(files) => files,
                Err(e) => return fail(completed, conflicts, Some(id), RunStep::Staging, e),
            };

            if let Err(e) = self.ctx.pipeline.before_install(&id, &mut files) {
                return fail(completed, conflicts, Some(id), RunStep::BeforeEvent, e);
            }

            let resolved_files = {
                let store = self.ctx.store.read().expect("product store lock poisoned");
                match resolver.resolve(&id, files, &store) {
                    Ok(resolved) => resolved,
                    Err(e) => return fail(completed, conflicts, Some(id), RunStep::ConflictResolution, e),
                }
            };

            let applied = match applier.apply(&id, &resolved_files) {
                Ok(applied) => applied,
                Err(e) => return fail(completed, conflicts, Some(id), RunStep::Apply, e),
            };

            self.ctx.pipeline.after_install(&id, &resolved_files);
            if is_update {
                self.ctx.pipeline.after_maintenance(&id);
            }

            let dependencies: BTreeSet<String> = node
                .dependencies
                .iter()
                .filter_map(|&dep| graph.nodes().get(dep))
                .map(|dep| dep.package.name.clone())
                .collect();

            let persisted = {
                let mut store = self.ctx.store.write().expect("product store lock poisoned");
                store
                    .set(&versioned, applied, dependencies)
                    .and_then(|_| store.save())
            };
            if let Err(e) = persisted {
                return fail(completed, conflicts, Some(id), RunStep::Persisting, e);
            }

            for file in resolved_files.iter().filter(|f| f.conflict) {
                conflicts.push((id.clone(), file.target_path.clone()));
            }
            tracing::info!(package = %id.name, version = %node.resolved_version,
                files = resolved_files.iter().filter(|f| f.action == FileAction::Copy).count(),
                conflicts = resolved_files.iter().filter(|f| f.conflict).count(),
                "package deployed");
            completed.push(id);
        }

        RunReport {
            operation,
            completed,
            conflicts,
            failure: None,
        }
    }

    fn uninstall(&self, requests: &[PackageId]) -> RunReport {
        let fail = |completed: Vec<PackageId>, package, step, error| RunReport {
            operation: Operation::Uninstall,
            completed,
            conflicts: Vec::new(),
            failure: Some(RunFailure {
                package,
                step,
                error,
            }),
        };

        let graph = {
            let store = self.ctx.store.read().expect("product store lock poisoned");
            match store.build_graph() {
                Ok(graph) => graph,
                Err(e) => return fail(Vec::new(), None, RunStep::Resolving, e),
            }
        };
        // Dependents first, restricted to the requested set: transitive
        // dependencies stay installed unless explicitly requested.
        let ordered = match order(&graph, OrderingMode::TopToBottom) {
            Ok(ordered) => ordered,
            Err(e) => return fail(Vec::new(), None, RunStep::Ordering, e),
        };
        let requested: BTreeSet<String> = requests.iter().map(|r| r.key()).collect();

        let resolver = ConflictResolver::new(self.policy.clone());
        let applier = FileApplier::new(&self.product_root);
        let mut completed = Vec::new();

        for id in ordered.into_iter().filter(|id| requested.contains(&id.key())) {
            // Reject before any filesystem mutation if a stored dependent
            // still needs the package. Dependents inside this run's removal
            // set were already removed (top-to-bottom order), so anything
            // left is a genuine blocker.
            let blocker = self.read_store(|s| s.dependent_of(&id));
            if let Some(dependent) = blocker {
                return fail(
                    completed,
                    Some(id.clone()),
                    RunStep::ConflictResolution,
                    DockhandError::PackageInUse {
                        package: id.name.clone(),
                        dependent: dependent.name,
                    },
                );
            }

            let mut plan = {
                let store = self.ctx.store.read().expect("product store lock poisoned");
                resolver.plan_removal(&id, &store)
            };

            if let Err(e) = self.ctx.pipeline.before_uninstall(&id, &mut plan) {
                return fail(completed, Some(id), RunStep::BeforeEvent, e);
            }

            if let Err(e) = applier.remove(&id, &plan) {
                return fail(completed, Some(id), RunStep::Apply, e);
            }

            self.ctx.pipeline.after_uninstall(&id);

            let persisted = {
                let mut store = self.ctx.store.write().expect("product store lock poisoned");
                store.remove(&id).and_then(|_| store.save())
            };
            if let Err(e) = persisted {
                return fail(completed, Some(id), RunStep::Persisting, e);
            }

            tracing::info!(package = %id.name, files = plan.len(), "package uninstalled");
            completed.push(id);
        }

        RunReport {
            operation: Operation::Uninstall,
            completed,
            conflicts: Vec::new(),
            failure: None,
        }
    }

    fn read_store<T>(&self, f: impl FnOnce(&crate::store::ProductConfigurationStore) -> T) -> T {
        f(&self.ctx.store.read().expect("product store lock poisoned"))
    }
}
