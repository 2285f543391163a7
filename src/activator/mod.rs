//! Late-bound handler activation.
//!
//! Persisted configuration refers to handlers by string key. Instead of
//! runtime reflection, an explicit registry maps keys to factory closures,
//! populated at startup by whatever loads plugins. Each deployment context
//! owns its own activator, so runs never interfere through shared state.

use crate::core::{DockhandError, DockhandResult};
use crate::events::EventHandler;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type HandlerFactory = Box<dyn Fn() -> Arc<dyn EventHandler> + Send + Sync>;

/// Registry of named handler factories
#[derive(Default)]
pub struct EntityActivator {
    factories: RwLock<HashMap<String, HandlerFactory>>,
}

impl EntityActivator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under a key, replacing any existing registration
    pub fn register<F>(&self, key: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn EventHandler> + Send + Sync + 'static,
    {
        let key = key.into();
        tracing::debug!(key = %key, "registering handler factory");
        self.factories
            .write()
            .expect("activator registry poisoned")
            .insert(key, Box::new(factory));
    }

    /// Instantiate the handler registered under a key.
    ///
    /// Fails with `TypeNotFound` for an unknown key. Activation failures
    /// are not transient and are never retried.
    pub fn activate(&self, key: &str) -> DockhandResult<Arc<dyn EventHandler>> {
        let factories = self.factories.read().expect("activator registry poisoned");
        factories
            .get(key)
            .map(|factory| factory())
            .ok_or_else(|| DockhandError::TypeNotFound(key.to_string()))
    }

    /// Whether a factory is registered under a key
    pub fn contains(&self, key: &str) -> bool {
        self.factories
            .read()
            .expect("activator registry poisoned")
            .contains_key(key)
    }
}
