//! CC Plugin
//!
//! The layer plugin code talks to inside a compute job. It initialises the
//! job from its payload, resolves logical store and data-source names through
//! the job/action scope chain, moves bytes between backends and dispatches
//! each declared action to a registered runner.
//!
//! # Example
//!
//! ```rust,ignore
//! use cc_plugin::{register_action, ActionContext, ActionRunner, DataSourceOpInput, PluginManager, RunnerError};
//!
//! struct Compute;
//!
//! impl ActionRunner for Compute {
//!     fn run(&mut self, ctx: &ActionContext<'_>) -> Result<(), RunnerError> {
//!         let terrain = ctx.get(&DataSourceOpInput::named("terrain", "default"))?;
//!         ctx.log(&format!("read {} bytes", terrain.len()));
//!         Ok(())
//!     }
//! }
//!
//! register_action("compute", || Box::new(Compute));
//!
//! let manager = PluginManager::from_env()?;
//! manager.run_actions()?.ensure_success()?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
mod dispatch;
mod error;
mod io;
mod manager;
mod runner;

// Re-exports
pub use config::EnvConfig;
pub use dispatch::{ActionOutcome, ActionState, RunReport};
pub use error::{Capability, PluginError, PluginResult, RunnerError};
pub use io::{CopyToLocalInput, CopyToRemoteInput, DataSourceOpInput, IoScope, RemoteTarget, SourceSelector};
pub use manager::{PluginManager, PluginManagerBuilder};
pub use runner::{global_actions, register_action, ActionContext, ActionRegistry, ActionRunner, RunnerFactory};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for writing action runners
    pub use crate::{
        register_action, ActionContext, ActionRunner, DataSourceOpInput, PluginError, PluginManager, PluginResult,
        RunnerError,
    };
    pub use cc_model::{Attributes, DataSource, IoType};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
