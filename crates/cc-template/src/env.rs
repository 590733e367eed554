//! Environment lookup used by the `ENV` namespace

use std::collections::{BTreeMap, HashMap};

/// Source of environment variables
///
/// Abstracted so tests and embedders can supply a fixed environment instead
/// of mutating the process one.
pub trait Environment: Send + Sync {
    /// Value of `name`, if set
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl Environment for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}
