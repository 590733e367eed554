//! Action runners
//!
//! An [`ActionRunner`] implements the business logic behind one action name.
//! Runners are registered as factories so every dispatched action gets a
//! fresh value.

use crate::error::RunnerError;
use crate::io::IoScope;
use crate::manager::PluginManager;
use cc_model::{Action, Attributes};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;

/// Logic run for every action whose name it is registered under
pub trait ActionRunner {
    /// Run against the action's context
    ///
    /// # Errors
    /// Any error; dispatch stops unless [`continue_on_error`] is set.
    ///
    /// [`continue_on_error`]: ActionRunner::continue_on_error
    fn run(&mut self, ctx: &ActionContext<'_>) -> Result<(), RunnerError>;

    /// Whether dispatch continues after this runner fails
    fn continue_on_error(&self) -> bool {
        false
    }
}

/// Zero-argument runner factory
pub type RunnerFactory = Arc<dyn Fn() -> Box<dyn ActionRunner> + Send + Sync>;

static GLOBAL: Lazy<RwLock<ActionRegistry>> = Lazy::new(|| RwLock::new(ActionRegistry::new()));

/// Register a runner in the process-wide registry
pub fn register_action<F>(name: &str, factory: F)
where
    F: Fn() -> Box<dyn ActionRunner> + Send + Sync + 'static,
{
    GLOBAL.write().register(name, factory);
}

/// Snapshot of the process-wide registry
#[must_use]
pub fn global_actions() -> ActionRegistry {
    GLOBAL.read().clone()
}

/// Registry of runner factories keyed by action name
#[derive(Default, Clone)]
pub struct ActionRegistry {
    factories: BTreeMap<String, RunnerFactory>,
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}

impl ActionRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register a factory under `name`, replacing any previous one
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn ActionRunner> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(factory));
    }

    /// Builder-style register
    #[must_use]
    pub fn with<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn() -> Box<dyn ActionRunner> + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    /// Check if a runner is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Remove runner
    #[inline]
    pub fn remove(&mut self, name: &str) -> bool {
        self.factories.remove(name).is_some()
    }

    /// Registered action names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Number of registered runners
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Fresh runner for `name`
    #[must_use]
    pub fn create(&self, name: &str) -> Option<Box<dyn ActionRunner>> {
        self.factories.get(name).map(|factory| factory())
    }
}

/// Everything a runner sees while it runs
///
/// Dereferences to the action-scoped [`IoScope`], so every resolver and I/O
/// operation is available directly.
pub struct ActionContext<'a> {
    manager: &'a PluginManager,
    action: &'a Action,
    action_name: &'a str,
    io: IoScope<'a>,
}

impl std::fmt::Debug for ActionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionContext")
            .field("action_name", &self.action_name)
            .finish_non_exhaustive()
    }
}

impl<'a> ActionContext<'a> {
    pub(crate) fn new(manager: &'a PluginManager, action: &'a Action, action_name: &'a str, io: IoScope<'a>) -> Self {
        Self {
            manager,
            action,
            action_name,
            io,
        }
    }

    /// Owning manager
    #[inline]
    #[must_use]
    pub fn manager(&self) -> &'a PluginManager {
        self.manager
    }

    /// The action being run
    #[inline]
    #[must_use]
    pub fn action(&self) -> &'a Action {
        self.action
    }

    /// Registry key the runner was matched under
    #[inline]
    #[must_use]
    pub fn action_name(&self) -> &'a str {
        self.action_name
    }

    /// The action's own (substituted) attributes
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &'a Attributes {
        &self.action.io.attributes
    }

    /// Action-scoped resolver and I/O operations
    #[inline]
    #[must_use]
    pub fn io(&self) -> &IoScope<'a> {
        &self.io
    }

    /// Emit an info event tagged with the action name
    pub fn log(&self, message: &str) {
        tracing::info!(action = self.action_name, "{message}");
    }
}

impl<'a> Deref for ActionContext<'a> {
    type Target = IoScope<'a>;

    fn deref(&self) -> &Self::Target {
        &self.io
    }
}
