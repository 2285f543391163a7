//! Trait definitions for the external collaborator boundaries.
//!
//! The engine never resolves version ranges or parses package manifests
//! itself; those live behind these traits and are injected through the
//! `DeploymentContext`.

use crate::core::DockhandResult;
use crate::graph::ResolvedPackage;
use crate::package::{InstallableFileInfo, PackageId, VersionedPackageInfo};
use async_trait::async_trait;
use std::path::Path;

/// External resolver boundary.
///
/// Input: requested identities (name, version range, prerelease flag).
/// Output: a closed flat dependency list with concrete versions, ready to
/// be built into a graph. A failure names the unsatisfiable identity.
/// Network I/O and retry policy live behind this trait, never in the core.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, requests: &[PackageId]) -> DockhandResult<Vec<ResolvedPackage>>;
}

/// Deployment-strategy provider boundary.
///
/// Describes what a package *would* install from its staged payload,
/// before conflict resolution.
pub trait DeploymentStrategyProvider: Send + Sync {
    fn candidate_files(
        &self,
        package: &VersionedPackageInfo,
        package_path: &Path,
    ) -> DockhandResult<Vec<InstallableFileInfo>>;
}
