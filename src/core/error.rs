use thiserror::Error;

pub type DockhandResult<T> = Result<T, DockhandError>;

#[derive(Error, Debug)]
pub enum DockhandError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Package error: {0}")]
    Package(String),

    /// The dependency relation is not acyclic. Raised at edge-add time and
    /// re-validated defensively during traversal.
    #[error("Circular dependency detected: {0}")]
    CycleDetected(String),

    /// Two packages claim the same installed file path and the policy offers
    /// no resolution. The whole package's apply step is aborted.
    #[error("File conflict on '{path}': owned by '{owner}', requested by '{package}'")]
    FileConflict {
        path: String,
        owner: String,
        package: String,
    },

    /// A declared dependency has no stored configuration entry. Dependencies
    /// must be installed, hence persisted, before their dependents.
    #[error("Package '{package}' declares dependency '{dependency}' which is not installed")]
    DependencyNotFound { package: String, dependency: String },

    /// Another stored configuration still depends on this package.
    #[error("Package '{package}' is still required by '{dependent}'")]
    PackageInUse { package: String, dependent: String },

    /// A "before" event handler faulted; its mutable payload may be left
    /// inconsistent, so the pending operation is aborted.
    #[error("Event handler failed during '{event}' for package '{package}': {message}")]
    EventHandlerFailed {
        package: String,
        event: String,
        message: String,
    },

    /// The activator has no factory registered under the requested key.
    /// Activation failures are not transient and are never retried.
    #[error("No registered type for key '{0}'")]
    TypeNotFound(String),

    /// The external resolver could not satisfy a requested identity.
    #[error("Resolution failed: {0}")]
    Resolution(String),

    #[error("WalkDir error: {0}")]
    WalkDir(#[from] walkdir::Error),
}
