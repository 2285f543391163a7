//! File-conflict resolution.
//!
//! Before a package's files are applied, each candidate target path is
//! checked against the product record. Files owned by another package are
//! conflicts; policy decides whether the existing file is kept, overridden,
//! or whether the whole package's apply step is rejected. File application
//! per package is all-or-nothing.

use crate::core::{DockhandError, DockhandResult};
use crate::package::{
    ConflictResolution, FileAction, FileType, InstallableFileInfo, PackageId,
};
use crate::store::ProductConfigurationStore;
use std::collections::HashSet;

/// Policy applied to files whose target path is owned by another package.
///
/// The default keeps the existing file. Callers may permit `Override` for
/// specific file types, or reject any cross-package conflict outright.
#[derive(Debug, Clone, Default)]
pub struct ConflictPolicy {
    /// File types for which overwriting another package's file is permitted
    pub override_types: HashSet<FileType>,
    /// Reject the whole package on any cross-package conflict
    pub fail_on_conflict: bool,
}

impl ConflictPolicy {
    /// The default policy: keep existing files, never fail
    pub fn keep_existing() -> Self {
        Self::default()
    }

    /// Permit overriding files of the given type
    pub fn with_override(mut self, file_type: FileType) -> Self {
        self.override_types.insert(file_type);
        self
    }

    /// Reject any cross-package conflict instead of resolving it
    pub fn strict() -> Self {
        Self {
            override_types: HashSet::new(),
            fail_on_conflict: true,
        }
    }
}

/// Decides per-file actions for a package against the current product record
pub struct ConflictResolver {
    policy: ConflictPolicy,
}

impl ConflictResolver {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self { policy }
    }

    /// Resolve a package's candidate files against the store.
    ///
    /// - Unowned target: copy, no conflict.
    /// - Owned by the same package: copy, no conflict (update-in-place).
    /// - Owned by another package: conflict. Policy either keeps the
    ///   existing file (`action = None`), overrides it (ownership will
    ///   transfer when the store is updated), or fails the whole package
    ///   with `FileConflict` naming the path and both owners.
    pub fn resolve(
        &self,
        package: &PackageId,
        candidates: Vec<InstallableFileInfo>,
        store: &ProductConfigurationStore,
    ) -> DockhandResult<Vec<InstallableFileInfo>> {
        let mut resolved = Vec::with_capacity(candidates.len());
        for mut file in candidates {
            match store.owner_of(&file.target_path) {
                None => {
                    file.action = FileAction::Copy;
                    file.conflict = false;
                }
                Some(owner) if owner == package => {
                    file.action = FileAction::Copy;
                    file.conflict = false;
                }
                Some(owner) => {
                    file.conflict = true;
                    if self.policy.fail_on_conflict {
                        return Err(DockhandError::FileConflict {
                            path: file.target_path.clone(),
                            owner: owner.name.clone(),
                            package: package.name.clone(),
                        });
                    }
                    if self.policy.override_types.contains(&file.file_type) {
                        file.action = FileAction::Copy;
                        file.resolution = ConflictResolution::Override;
                        tracing::warn!(
                            package = %package.name,
                            owner = %owner.name,
                            path = %file.target_path,
                            "overriding file owned by another package"
                        );
                    } else {
                        file.action = FileAction::None;
                        file.resolution = ConflictResolution::KeepExisting;
                        tracing::warn!(
                            package = %package.name,
                            owner = %owner.name,
                            path = %file.target_path,
                            "keeping existing file owned by another package"
                        );
                    }
                }
            }
            resolved.push(file);
        }
        Ok(resolved)
    }

    /// Plan an uninstall: the files owned exclusively by this package.
    /// Paths also listed under another package are retained on disk.
    pub fn plan_removal(
        &self,
        package: &PackageId,
        store: &ProductConfigurationStore,
    ) -> Vec<String> {
        store.get_installed_files(package, true)
    }
}
