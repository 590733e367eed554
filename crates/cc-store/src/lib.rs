//! CC Store
//!
//! Binds live sessions to the stores a payload declares.
//!
//! # Core Concepts
//!
//! - [`StoreTypeRegistry`]: store-type identifier → zero-argument constructor
//! - [`connect_payload`]: the one-time, sequential connect phase
//! - [`FsStore`]: local filesystem backend (`FS` store type)
//!
//! # Example
//!
//! ```rust,ignore
//! use cc_store::{connect_payload, register_store_type, StoreTypeRegistry};
//!
//! register_store_type("S3", || Box::new(S3Store::default()));
//!
//! let registry = cc_store::global_store_types();
//! connect_payload(&payload, &registry)?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod connect;
mod error;
mod fs;
mod registry;

// Re-exports
pub use connect::{connect_payload, connect_stores, ConnectSummary};
pub use error::ConnectError;
pub use fs::{FsSession, FsStore, FS_STORE_TYPE};
pub use registry::{global_store_types, register_store_type, StoreConstructor, StoreTypeRegistry};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
