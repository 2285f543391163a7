//! Core error and path types shared across the crate.

pub mod error;
pub mod path;

pub use error::{DockhandError, DockhandResult};
