//! Store-type registry
//!
//! Provides [`StoreTypeRegistry`] mapping store-type identifiers to
//! constructors, and a process-wide instance that backends register into.

use crate::error::ConnectError;
use crate::fs::{FsStore, FS_STORE_TYPE};
use cc_model::StoreInstance;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Zero-argument constructor producing a capability-negotiable instance
pub type StoreConstructor = Arc<dyn Fn() -> Box<dyn StoreInstance> + Send + Sync>;

static GLOBAL: Lazy<RwLock<StoreTypeRegistry>> =
    Lazy::new(|| RwLock::new(StoreTypeRegistry::with_defaults()));

/// Register a store type in the process-wide registry
///
/// Re-registering an identifier replaces the previous constructor.
pub fn register_store_type<F>(store_type: &str, constructor: F)
where
    F: Fn() -> Box<dyn StoreInstance> + Send + Sync + 'static,
{
    GLOBAL.write().register(store_type, constructor);
}

/// Snapshot of the process-wide registry
#[must_use]
pub fn global_store_types() -> StoreTypeRegistry {
    GLOBAL.read().clone()
}

/// Registry of store-type constructors
#[derive(Default, Clone)]
pub struct StoreTypeRegistry {
    constructors: BTreeMap<String, StoreConstructor>,
}

impl std::fmt::Debug for StoreTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreTypeRegistry")
            .field("store_types", &self.names())
            .finish()
    }
}

impl StoreTypeRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Create registry with the built-in store types
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(FS_STORE_TYPE, || Box::new(FsStore));
        registry
    }

    /// Register a constructor under `store_type`
    pub fn register<F>(&mut self, store_type: &str, constructor: F)
    where
        F: Fn() -> Box<dyn StoreInstance> + Send + Sync + 'static,
    {
        self.constructors
            .insert(store_type.to_string(), Arc::new(constructor));
    }

    /// Builder-style register
    #[must_use]
    pub fn with<F>(mut self, store_type: &str, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn StoreInstance> + Send + Sync + 'static,
    {
        self.register(store_type, constructor);
        self
    }

    /// Check if store type exists
    #[inline]
    #[must_use]
    pub fn contains(&self, store_type: &str) -> bool {
        self.constructors.contains_key(store_type)
    }

    /// Remove store type
    #[inline]
    pub fn remove(&mut self, store_type: &str) -> bool {
        self.constructors.remove(store_type).is_some()
    }

    /// Registered store-type identifiers, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Number of registered store types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Construct a fresh instance for the store named `store`
    ///
    /// # Errors
    /// Returns `ConnectError::UnknownStoreType` if `store_type` is not
    /// registered.
    pub fn create(&self, store: &str, store_type: &str) -> Result<Box<dyn StoreInstance>, ConnectError> {
        let constructor = self
            .constructors
            .get(store_type)
            .ok_or_else(|| ConnectError::UnknownStoreType {
                store: store.to_string(),
                store_type: store_type.to_string(),
            })?;
        Ok(constructor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PathOnly;

    impl StoreInstance for PathOnly {}

    #[test]
    fn registry_new_empty() {
        let registry = StoreTypeRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn registry_with_defaults() {
        let registry = StoreTypeRegistry::with_defaults();
        assert!(registry.contains(FS_STORE_TYPE));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_register_and_remove() {
        let mut registry = StoreTypeRegistry::new().with("PATH", || Box::new(PathOnly));
        assert!(registry.contains("PATH"));
        assert!(registry.create("s", "PATH").is_ok());

        assert!(registry.remove("PATH"));
        assert!(!registry.contains("PATH"));
        assert!(!registry.remove("PATH"));
    }

    #[test]
    fn registry_unknown_type() {
        let registry = StoreTypeRegistry::new();
        let err = registry.create("FFRD", "S3").err().unwrap();
        assert!(matches!(
            err,
            ConnectError::UnknownStoreType { store, store_type } if store == "FFRD" && store_type == "S3"
        ));
    }

    #[test]
    fn registry_names_sorted() {
        let registry = StoreTypeRegistry::new()
            .with("ZARR", || Box::new(PathOnly))
            .with("ARRAY", || Box::new(PathOnly));
        assert_eq!(registry.names(), vec!["ARRAY", "ZARR"]);
    }

    #[test]
    fn global_registry_accepts_registrations() {
        register_store_type("GLOBAL_TEST_PATH", || Box::new(PathOnly));
        let snapshot = global_store_types();
        assert!(snapshot.contains("GLOBAL_TEST_PATH"));
        assert!(snapshot.contains(FS_STORE_TYPE));
    }

    #[test]
    fn registry_debug() {
        let debug_str = format!("{:?}", StoreTypeRegistry::with_defaults());
        assert!(debug_str.contains("StoreTypeRegistry"));
        assert!(debug_str.contains(FS_STORE_TYPE));
    }
}
