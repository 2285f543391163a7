pub mod files;
pub mod id;

pub use files::{ConflictResolution, FileAction, FileType, InstallableFileInfo};
pub use id::{PackageId, VersionedPackageInfo};
