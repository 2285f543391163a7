use crate::core::error::DockhandResult;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the Dockhand metadata directory for a product (./.dockhand)
pub fn product_metadata_dir(product_root: &Path) -> PathBuf {
    product_root.join(".dockhand")
}

/// Get the persisted product configuration file (./.dockhand/product.yaml)
pub fn product_config_file(product_root: &Path) -> PathBuf {
    product_metadata_dir(product_root).join("product.yaml")
}

/// Ensure a directory exists, creating it and any parents if necessary
pub fn ensure_dir(path: &Path) -> DockhandResult<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Write a file atomically using the write-new-then-rename pattern.
///
/// The content is written to a temporary sibling first and renamed over the
/// destination, so a crash mid-save never leaves a truncated record.
pub fn atomic_write(path: &Path, content: &str) -> DockhandResult<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_paths() {
        let root = Path::new("/srv/product");
        assert_eq!(
            product_metadata_dir(root),
            PathBuf::from("/srv/product/.dockhand")
        );
        assert_eq!(
            product_config_file(root),
            PathBuf::from("/srv/product/.dockhand/product.yaml")
        );
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/deeper/record.yaml");
        atomic_write(&target, "contents: yes\n").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "contents: yes\n");
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("record.yaml");
        atomic_write(&target, "first").unwrap();
        atomic_write(&target, "second").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "second");
        assert!(!target.with_extension("tmp").exists());
    }
}
