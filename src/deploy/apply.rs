//! Filesystem apply step.
//!
//! The only blocking I/O inside the per-package loop. Copies are not
//! cancellable mid-file; cancellation is honored only at package-loop
//! boundaries.

use crate::core::path::ensure_dir;
use crate::core::DockhandResult;
use crate::package::{FileAction, InstallableFileInfo, PackageId};
use std::fs;
use std::path::{Path, PathBuf};

/// Applies resolved file changes under a product root
pub struct FileApplier {
    product_root: PathBuf,
}

impl FileApplier {
    pub fn new(product_root: &Path) -> Self {
        Self {
            product_root: product_root.to_path_buf(),
        }
    }

    /// Apply a package's resolved files.
    ///
    /// Copies `Copy` files (creating parent directories), deletes `Delete`
    /// targets, skips `None`. Returns the target paths this package now
    /// owns, in apply order.
    pub fn apply(
        &self,
        package: &PackageId,
        files: &[InstallableFileInfo],
    ) -> DockhandResult<Vec<String>> {
        let mut applied = Vec::new();
        for file in files {
            let target = self.product_root.join(&file.target_path);
            match file.action {
                FileAction::Copy => {
                    if let Some(parent) = target.parent() {
                        ensure_dir(parent)?;
                    }
                    fs::copy(&file.source_path, &target)?;
                    tracing::debug!(package = %package.name, path = %file.target_path, "copied file");
                    applied.push(file.target_path.clone());
                }
                FileAction::Delete => {
                    if target.exists() {
                        fs::remove_file(&target)?;
                        tracing::debug!(package = %package.name, path = %file.target_path, "deleted file");
                    }
                }
                FileAction::None => {}
            }
        }
        Ok(applied)
    }

    /// Remove a planned set of file paths, pruning directories that become
    /// empty. Already-missing files are logged and skipped.
    pub fn remove(&self, package: &PackageId, paths: &[String]) -> DockhandResult<()> {
        for path in paths {
            let target = self.product_root.join(path);
            if target.exists() {
                fs::remove_file(&target)?;
                tracing::debug!(package = %package.name, path = %path, "removed file");
            } else {
                tracing::warn!(package = %package.name, path = %path, "file already missing on removal");
            }
            self.prune_empty_dirs(target.parent());
        }
        Ok(())
    }

    fn prune_empty_dirs(&self, mut dir: Option<&Path>) {
        while let Some(current) = dir {
            if current == self.product_root || !current.starts_with(&self.product_root) {
                break;
            }
            match fs::read_dir(current) {
                Ok(mut entries) => {
                    if entries.next().is_some() || fs::remove_dir(current).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
            dir = current.parent();
        }
    }
}
