//! Plugin manager
//!
//! Owns the payload for the lifetime of the job. Building a manager runs the
//! whole initialisation sequence: connect every declared store, then rewrite
//! every attribute and path template. Only a fully initialised manager can
//! dispatch actions.

use crate::config::EnvConfig;
use crate::dispatch::{run_actions, RunReport};
use crate::error::{PluginError, PluginResult};
use crate::io::{CopyToLocalInput, CopyToRemoteInput, DataSourceOpInput, IoScope};
use crate::runner::{global_actions, ActionRegistry};
use cc_model::{ByteStream, DataSource, DataStore, IoType, Payload, ScopeChain, Session};
use cc_store::{connect_payload, global_store_types, StoreTypeRegistry};
use cc_template::{substitute_payload, Environment, ProcessEnv};
use std::io::Read;
use std::path::PathBuf;

/// Builder for [`PluginManager`]
///
/// Registries default to the process-wide ones, the environment to the
/// process environment.
#[derive(Default)]
pub struct PluginManagerBuilder {
    payload: Option<Payload>,
    store_types: Option<StoreTypeRegistry>,
    actions: Option<ActionRegistry>,
    env: Option<Box<dyn Environment>>,
}

impl std::fmt::Debug for PluginManagerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManagerBuilder")
            .field("has_payload", &self.payload.is_some())
            .field("store_types", &self.store_types)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

impl PluginManagerBuilder {
    /// Create builder with nothing set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the job descriptor
    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Use this store-type registry instead of the process-wide one
    #[must_use]
    pub fn with_store_registry(mut self, registry: StoreTypeRegistry) -> Self {
        self.store_types = Some(registry);
        self
    }

    /// Use this action registry instead of the process-wide one
    #[must_use]
    pub fn with_action_registry(mut self, registry: ActionRegistry) -> Self {
        self.actions = Some(registry);
        self
    }

    /// Resolve `ENV` tokens and `CC_*` settings from `env`
    #[must_use]
    pub fn with_environment(mut self, env: impl Environment + 'static) -> Self {
        self.env = Some(Box::new(env));
        self
    }

    /// Connect stores, substitute templates and return the manager
    ///
    /// # Errors
    /// - `PluginError::Config` if no payload was set
    /// - `PluginError::Scope` if an action scope cannot sit under the job
    /// - `PluginError::Connect` if any store fails to connect
    /// - `PluginError::Substitution` if any template fails to resolve
    pub fn build(self) -> PluginResult<PluginManager> {
        let mut payload = self
            .payload
            .ok_or_else(|| PluginError::config("no payload provided"))?;
        let store_types = self.store_types.unwrap_or_else(global_store_types);
        let actions = self.actions.unwrap_or_else(global_actions);
        let env = self.env.unwrap_or_else(|| Box::new(ProcessEnv) as Box<dyn Environment>);

        let job = ScopeChain::root(&payload.io);
        for action in &payload.actions {
            job.child(&action.io)?;
        }

        let summary = connect_payload(&payload, &store_types)?;
        substitute_payload(&mut payload, env.as_ref())?;

        let config = EnvConfig::from_env(env.as_ref());
        tracing::info!(
            manifest = config.manifest_id.as_deref().unwrap_or("-"),
            event = config.event_identifier.as_deref().unwrap_or("-"),
            stores = summary.total(),
            actions = payload.actions.len(),
            "plugin manager initialised"
        );

        Ok(PluginManager {
            payload,
            config,
            actions,
        })
    }
}

/// Initialised job: connected stores, substituted templates, runner registry
#[derive(Debug)]
pub struct PluginManager {
    payload: Payload,
    config: EnvConfig,
    actions: ActionRegistry,
}

impl PluginManager {
    /// Start building a manager
    #[inline]
    #[must_use]
    pub fn builder() -> PluginManagerBuilder {
        PluginManagerBuilder::new()
    }

    /// Initialise from the process environment
    ///
    /// Loads the payload from `{CC_ROOT}/{CC_MANIFEST_ID}/payload` and uses
    /// the process-wide registries.
    ///
    /// # Errors
    /// - `PluginError::Config` if `CC_ROOT` or `CC_MANIFEST_ID` is unset
    /// - `PluginError::Payload` if the descriptor cannot be read or decoded
    /// - anything [`PluginManagerBuilder::build`] returns
    pub fn from_env() -> PluginResult<Self> {
        let path = EnvConfig::from_env(&ProcessEnv).payload_path()?;
        tracing::info!(path = %path.display(), "loading payload");
        let payload = Payload::from_path(&path)?;
        Self::builder().with_payload(payload).build()
    }

    /// The substituted payload
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// `CC_*` settings captured at initialisation
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Event identifier of this job instance
    #[inline]
    #[must_use]
    pub fn event_identifier(&self) -> Option<&str> {
        self.config.event_identifier.as_deref()
    }

    /// Job-scoped resolver and I/O operations
    #[must_use]
    pub fn io(&self) -> IoScope<'_> {
        IoScope::new(ScopeChain::root(&self.payload.io))
    }

    /// Resolver and I/O operations scoped to the action at `index`
    ///
    /// # Errors
    /// - `PluginError::Config` if there is no action at `index`
    /// - `PluginError::Scope` if the chain cannot be built
    pub fn action_io(&self, index: usize) -> PluginResult<IoScope<'_>> {
        let action = self
            .payload
            .actions
            .get(index)
            .ok_or_else(|| PluginError::config(format!("no action at index {index}")))?;
        let chain = ScopeChain::root(&self.payload.io).child(&action.io)?;
        Ok(IoScope::new(chain))
    }

    /// Dispatch every action to its registered runner
    ///
    /// # Errors
    /// `PluginError::Dispatch` for the first runner failure that does not
    /// allow continuing.
    pub fn run_actions(&self) -> PluginResult<RunReport> {
        run_actions(self, &self.actions)
    }

    // -----------------------------------------------------------------------
    // Job-scoped wrappers
    // -----------------------------------------------------------------------

    /// See [`IoScope::get_store`]
    ///
    /// # Errors
    /// Returns `PluginError::Resolve` if no scope declares the store.
    pub fn get_store(&self, name: &str) -> PluginResult<&DataStore> {
        self.io().get_store(name)
    }

    /// See [`IoScope::get_data_source`]
    ///
    /// # Errors
    /// Returns `PluginError::Resolve` if no scope declares the data source.
    pub fn get_data_source(&self, io_type: IoType, name: &str) -> PluginResult<&DataSource> {
        self.io().get_data_source(io_type, name)
    }

    /// See [`IoScope::get_input_data_source`]
    ///
    /// # Errors
    /// Returns `PluginError::Resolve` if no scope declares the data source.
    pub fn get_input_data_source(&self, name: &str) -> PluginResult<&DataSource> {
        self.io().get_input_data_source(name)
    }

    /// See [`IoScope::get_output_data_source`]
    ///
    /// # Errors
    /// Returns `PluginError::Resolve` if no scope declares the data source.
    pub fn get_output_data_source(&self, name: &str) -> PluginResult<&DataSource> {
        self.io().get_output_data_source(name)
    }

    /// See [`IoScope::get_absolute_path`]
    ///
    /// # Errors
    /// Returns `PluginError::Resolve` if a name or the path key is unknown.
    pub fn get_absolute_path(&self, store_name: &str, source_name: &str, path_key: &str) -> PluginResult<String> {
        self.io().get_absolute_path(store_name, source_name, path_key)
    }

    /// See [`IoScope::get_store_as`]
    ///
    /// # Errors
    /// Returns `PluginError::Resolve` or `PluginError::SessionType`.
    pub fn get_store_as<T: Session>(&self, name: &str) -> PluginResult<&T> {
        self.io().get_store_as(name)
    }

    /// See [`IoScope::get_reader`]
    ///
    /// # Errors
    /// See [`IoScope::get_reader`].
    pub fn get_reader(&self, op: &DataSourceOpInput) -> PluginResult<ByteStream> {
        self.io().get_reader(op)
    }

    /// See [`IoScope::get`]
    ///
    /// # Errors
    /// See [`IoScope::get`].
    pub fn get(&self, op: &DataSourceOpInput) -> PluginResult<Vec<u8>> {
        self.io().get(op)
    }

    /// See [`IoScope::put`]
    ///
    /// # Errors
    /// See [`IoScope::put`].
    pub fn put(&self, op: &DataSourceOpInput, reader: &mut dyn Read) -> PluginResult<u64> {
        self.io().put(op, reader)
    }

    /// See [`IoScope::copy`]
    ///
    /// # Errors
    /// See [`IoScope::copy`].
    pub fn copy(&self, src: &DataSourceOpInput, dest: &DataSourceOpInput) -> PluginResult<u64> {
        self.io().copy(src, dest)
    }

    /// See [`IoScope::copy_file_to_local`]
    ///
    /// # Errors
    /// See [`IoScope::copy_file_to_local`].
    pub fn copy_file_to_local(&self, input: &CopyToLocalInput) -> PluginResult<Vec<PathBuf>> {
        self.io().copy_file_to_local(input)
    }

    /// See [`IoScope::copy_file_to_remote`]
    ///
    /// # Errors
    /// See [`IoScope::copy_file_to_remote`].
    pub fn copy_file_to_remote(&self, input: &CopyToRemoteInput) -> PluginResult<Vec<String>> {
        self.io().copy_file_to_remote(input)
    }
}
