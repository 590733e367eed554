//! Scope chain resolution
//!
//! A [`ScopeChain`] is the ordered list of scope nodes searched when a store
//! or data source is looked up by name: the action node first, then the job
//! node. Local entries always shadow same-named entries further out, and a
//! miss is only reported once every node has been searched.

use crate::error::{ResolveError, ScopeError};
use crate::path::join_root;
use crate::payload::IoManager;
use crate::source::{DataSource, IoType};
use crate::store::DataStore;

/// Maximum number of nodes in a chain (job node + one action node)
pub const MAX_DEPTH: usize = 2;

/// Innermost-first chain of borrowed scope nodes
#[derive(Debug, Clone)]
pub struct ScopeChain<'a> {
    /// Innermost node first, job-level node last
    nodes: Vec<&'a IoManager>,
}

impl<'a> ScopeChain<'a> {
    /// Chain containing only the job-level node
    #[inline]
    #[must_use]
    pub fn root(job: &'a IoManager) -> Self {
        Self { nodes: vec![job] }
    }

    /// Chain with `node` attached below this one
    ///
    /// # Errors
    /// - `ScopeError::TooDeep` if this chain already holds an action node
    /// - `ScopeError::Cycle` if `node` is already part of the chain
    pub fn child(&self, node: &'a IoManager) -> Result<Self, ScopeError> {
        if self.nodes.len() >= MAX_DEPTH {
            return Err(ScopeError::TooDeep {
                depth: self.nodes.len(),
            });
        }
        if self.nodes.iter().any(|n| std::ptr::eq(*n, node)) {
            return Err(ScopeError::Cycle);
        }

        let mut nodes = Vec::with_capacity(self.nodes.len() + 1);
        nodes.push(node);
        nodes.extend(self.nodes.iter().copied());
        Ok(Self { nodes })
    }

    /// Number of nodes in the chain
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.nodes.len()
    }

    /// Innermost node
    #[inline]
    #[must_use]
    pub fn local(&self) -> &'a IoManager {
        self.nodes[0]
    }

    /// Job-level node
    #[inline]
    #[must_use]
    pub fn job(&self) -> &'a IoManager {
        self.nodes[self.nodes.len() - 1]
    }

    /// Iterate innermost-first
    pub fn iter(&self) -> impl Iterator<Item = &'a IoManager> + '_ {
        self.nodes.iter().copied()
    }

    /// Find a store by name, nearest scope first
    ///
    /// # Errors
    /// Returns `ResolveError::StoreNotFound` if no scope declares it.
    pub fn get_store(&self, name: &str) -> Result<&'a DataStore, ResolveError> {
        self.iter()
            .find_map(|node| node.local_store(name))
            .ok_or_else(|| ResolveError::StoreNotFound(name.to_string()))
    }

    /// Find a data source by name in the given set(s), nearest scope first
    ///
    /// # Errors
    /// Returns `ResolveError::DataSourceNotFound` if no scope declares it.
    pub fn get_data_source(&self, io_type: IoType, name: &str) -> Result<&'a DataSource, ResolveError> {
        let found = self
            .iter()
            .find_map(|node| node.local_data_source(io_type, name));

        if found.is_none() {
            tracing::debug!(name, %io_type, "data source not found in any scope");
        }
        found.ok_or_else(|| ResolveError::data_source(name, io_type))
    }

    /// Find an input data source by name
    ///
    /// # Errors
    /// Returns `ResolveError::DataSourceNotFound` if no scope declares it.
    #[inline]
    pub fn get_input_data_source(&self, name: &str) -> Result<&'a DataSource, ResolveError> {
        self.get_data_source(IoType::Input, name)
    }

    /// Find an output data source by name
    ///
    /// # Errors
    /// Returns `ResolveError::DataSourceNotFound` if no scope declares it.
    #[inline]
    pub fn get_output_data_source(&self, name: &str) -> Result<&'a DataSource, ResolveError> {
        self.get_data_source(IoType::Output, name)
    }

    /// Absolute path of a data-source path entry within a store
    ///
    /// Joins the store's `root` parameter (default `/`) with the data source's
    /// path and normalises the result.
    ///
    /// # Errors
    /// - `ResolveError::StoreNotFound` / `DataSourceNotFound` if either name
    ///   is unknown
    /// - `ResolveError::PathKeyNotFound` if the path key is absent
    pub fn get_absolute_path(
        &self,
        store_name: &str,
        source_name: &str,
        path_key: &str,
    ) -> Result<String, ResolveError> {
        let store = self.get_store(store_name)?;
        let source = self.get_data_source(IoType::Any, source_name)?;

        let relative = source
            .path(path_key)
            .ok_or_else(|| ResolveError::path_key(&source.name, path_key))?;

        Ok(join_root(&store.root(), relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attributes;
    use pretty_assertions::assert_eq;

    fn job() -> IoManager {
        IoManager::new()
            .with_store(
                DataStore::new("shared", "FS").with_params(Attributes::new().with("root", "/job")),
            )
            .with_store(DataStore::new("override", "FS"))
            .with_input(DataSource::new("terrain", "shared").with_path("default", "job/terrain.tif"))
            .with_output(DataSource::new("results", "shared").with_path("default", "out/results.csv"))
    }

    fn action() -> IoManager {
        IoManager::new()
            .with_store(
                DataStore::new("override", "MEM").with_params(Attributes::new().with("root", "/act")),
            )
            .with_input(DataSource::new("terrain", "override").with_path("default", "act/terrain.tif"))
    }

    #[test]
    fn local_entries_shadow_parent() {
        let job = job();
        let action = action();
        let chain = ScopeChain::root(&job).child(&action).unwrap();

        assert_eq!(chain.get_store("override").unwrap().store_type, "MEM");
        assert_eq!(chain.get_input_data_source("terrain").unwrap().store_name, "override");
    }

    #[test]
    fn parent_entries_still_resolve() {
        let job = job();
        let action = action();
        let chain = ScopeChain::root(&job).child(&action).unwrap();

        assert_eq!(chain.get_store("shared").unwrap().store_type, "FS");
        assert_eq!(chain.get_output_data_source("results").unwrap().store_name, "shared");
    }

    #[test]
    fn job_scope_never_sees_action_entries() {
        let job = job();
        let chain = ScopeChain::root(&job);

        assert_eq!(chain.get_store("override").unwrap().store_type, "FS");
        assert_eq!(chain.get_input_data_source("terrain").unwrap().store_name, "shared");
    }

    #[test]
    fn miss_after_full_chain_is_not_found() {
        let job = job();
        let action = action();
        let chain = ScopeChain::root(&job).child(&action).unwrap();

        assert!(matches!(
            chain.get_store("nope"),
            Err(ResolveError::StoreNotFound(name)) if name == "nope"
        ));
        assert!(matches!(
            chain.get_input_data_source("results"),
            Err(ResolveError::DataSourceNotFound { .. })
        ));
    }

    #[test]
    fn siblings_are_not_searched() {
        let job = job();
        let _sibling = action();
        let second = IoManager::new();
        let chain = ScopeChain::root(&job).child(&second).unwrap();

        // "terrain" from the sibling action is invisible; the job entry wins
        assert_eq!(chain.get_input_data_source("terrain").unwrap().store_name, "shared");
    }

    #[test]
    fn absolute_path_joins_root() {
        let job = job();
        let action = action();
        let chain = ScopeChain::root(&job).child(&action).unwrap();

        assert_eq!(
            chain.get_absolute_path("shared", "results", "default").unwrap(),
            "/job/out/results.csv"
        );
        assert_eq!(
            chain.get_absolute_path("override", "terrain", "default").unwrap(),
            "/act/act/terrain.tif"
        );
    }

    #[test]
    fn absolute_path_missing_key() {
        let job = job();
        let chain = ScopeChain::root(&job);

        assert!(matches!(
            chain.get_absolute_path("shared", "results", "other"),
            Err(ResolveError::PathKeyNotFound { key, .. }) if key == "other"
        ));
    }

    #[test]
    fn chain_rejects_cycles_and_depth() {
        let job = job();
        let action = action();
        let other = IoManager::new();

        let root = ScopeChain::root(&job);
        assert!(matches!(root.child(&job), Err(ScopeError::Cycle)));

        let chain = root.child(&action).unwrap();
        assert_eq!(chain.depth(), 2);
        assert!(matches!(chain.child(&other), Err(ScopeError::TooDeep { depth: 2 })));
    }

    #[test]
    fn chain_accessors() {
        let job = job();
        let action = action();
        let chain = ScopeChain::root(&job).child(&action).unwrap();

        assert!(std::ptr::eq(chain.local(), &action));
        assert!(std::ptr::eq(chain.job(), &job));
    }
}
