//! File-level value types produced by the deployment-strategy provider and
//! mutated by the conflict resolver before filesystem apply.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Classification of an installable file, used to scope conflict policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Library,
    Content,
    Tool,
    Config,
    Custom,
}

/// What the apply step should do with a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    None,
    Copy,
    Delete,
}

/// How a detected conflict was (or should be) resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictResolution {
    Override,
    KeepExisting,
}

/// A candidate file a package would install, before and after conflict
/// resolution. `target_path` is relative to the product root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallableFileInfo {
    pub source_path: PathBuf,
    pub target_path: String,
    pub file_type: FileType,
    pub action: FileAction,
    #[serde(default)]
    pub conflict: bool,
    pub resolution: ConflictResolution,
}

impl InstallableFileInfo {
    /// A plain candidate: copy, no conflict, keep-existing resolution
    pub fn candidate(
        source_path: impl Into<PathBuf>,
        target_path: impl Into<String>,
        file_type: FileType,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            target_path: target_path.into(),
            file_type,
            action: FileAction::Copy,
            conflict: false,
            resolution: ConflictResolution::KeepExisting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_defaults() {
        let file = InstallableFileInfo::candidate("pkg/lib/a.dll", "bin/a.dll", FileType::Library);
        assert_eq!(file.action, FileAction::Copy);
        assert!(!file.conflict);
        assert_eq!(file.resolution, ConflictResolution::KeepExisting);
    }

    #[test]
    fn test_serde_round_trip() {
        let file = InstallableFileInfo::candidate("src/x.txt", "content/x.txt", FileType::Content);
        let yaml = serde_yaml::to_string(&file).unwrap();
        let back: InstallableFileInfo = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(file, back);
    }
}
