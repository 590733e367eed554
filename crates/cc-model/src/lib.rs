//! CC Model
//!
//! Passive records describing a compute job payload, the capability
//! contracts every storage backend implements, and the scope chain used to
//! resolve logical store and data-source names.
//!
//! # Core Concepts
//!
//! - [`Payload`]: job-level scope node plus the ordered list of [`Action`]s
//! - [`IoManager`]: one scope node (attributes, stores, inputs, outputs)
//! - [`DataStore`] / [`DataSource`]: named backing resources and the logical
//!   resources bound to them
//! - [`ScopeChain`]: innermost-first lookup with parent delegation
//! - [`Session`]: live backend handle exposing optional capabilities
//!
//! # Example
//!
//! ```rust,ignore
//! use cc_model::{Payload, ScopeChain};
//!
//! let payload = Payload::from_json_str(descriptor)?;
//! let job = ScopeChain::root(&payload.io);
//! let action = job.child(&payload.actions[0].io)?;
//!
//! let store = action.get_store("FFRD")?;
//! let path = action.get_absolute_path("FFRD", "terrain", "default")?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod attributes;
pub mod capability;
pub mod error;
pub mod path;
pub mod payload;
pub mod scope;
pub mod source;
pub mod store;

// Re-exports
pub use attributes::{AttrValue, Attributes};
pub use capability::{
    ByteStream, Connector, FileHierarchy, Session, StoreError, StoreInstance, StoreReader,
    StoreWriter,
};
pub use error::{PayloadError, ResolveError, ScopeError};
pub use path::{clean_path, join_root};
pub use payload::{Action, IoManager, Payload};
pub use scope::ScopeChain;
pub use source::{DataSource, IoType};
pub use store::DataStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
