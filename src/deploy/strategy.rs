//! Default deployment-strategy provider for staged package trees.
//!
//! Walks a staged package directory and describes every file as a copy
//! candidate. The top-level directory names map to file types the way
//! conventional package layouts do (`lib/`, `content/`, `tools/`,
//! `config/`); everything else is custom content.

use crate::core::DockhandResult;
use crate::di::DeploymentStrategyProvider;
use crate::package::{FileType, InstallableFileInfo, VersionedPackageInfo};
use std::path::Path;
use walkdir::WalkDir;

/// Strategy provider reading candidates from a staged directory tree
#[derive(Debug, Default)]
pub struct StagedTreeStrategy;

impl StagedTreeStrategy {
    pub fn new() -> Self {
        Self
    }

    fn classify(relative: &Path) -> FileType {
        let top = relative
            .components()
            .next()
            .map(|c| c.as_os_str().to_string_lossy().to_lowercase());
        match top.as_deref() {
            Some("lib") | Some("bin") => FileType::Library,
            Some("content") => FileType::Content,
            Some("tools") => FileType::Tool,
            Some("config") => FileType::Config,
            _ => FileType::Custom,
        }
    }
}

impl DeploymentStrategyProvider for StagedTreeStrategy {
    fn candidate_files(
        &self,
        package: &VersionedPackageInfo,
        package_path: &Path,
    ) -> DockhandResult<Vec<InstallableFileInfo>> {
        let mut candidates = Vec::new();
        if !package_path.exists() {
            tracing::warn!(package = %package.id.name, path = %package_path.display(),
                "staged package directory missing; no candidate files");
            return Ok(candidates);
        }
        for entry in WalkDir::new(package_path).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(package_path)
                .map_err(|e| crate::core::DockhandError::Path(e.to_string()))?;
            let target = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            candidates.push(InstallableFileInfo::candidate(
                entry.path(),
                target,
                Self::classify(relative),
            ));
        }
        tracing::debug!(package = %package.id.name, files = candidates.len(),
            "enumerated candidate files");
        Ok(candidates)
    }
}
