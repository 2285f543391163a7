//! Dependency injection infrastructure.
//!
//! Boundary traits for the external collaborators (resolver, deployment
//! strategy) and the per-run `DeploymentContext` that carries them together
//! with the store, event pipeline, and activator.

pub mod container;
pub mod traits;

pub use container::DeploymentContext;
pub use traits::{DeploymentStrategyProvider, Resolver};
