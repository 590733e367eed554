//! CC Template
//!
//! Substitution of `{NAMESPACE::NAME}` tokens inside payload attributes and
//! data-source paths.
//!
//! # Namespaces
//!
//! - `ENV`: process environment; a missing or empty variable is an error
//! - `ATTR`: attribute map supplied by the call site, only when enabled
//! - `VAR`: per-call variables handed to a read/write operation
//!
//! Any other namespace is left in place so newer syntax passes through older
//! builds untouched.
//!
//! # Example
//!
//! ```rust,ignore
//! use cc_template::{ProcessEnv, Substitutor};
//!
//! let sub = Substitutor::new(&ProcessEnv).with_attributes(&attrs);
//! let path = sub.substitute("runs/{ENV::CC_EVENT_NUMBER}/{ATTR::scenario}.csv")?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod engine;
mod env;
mod error;
mod rewrite;
mod token;

// Re-exports
pub use engine::{substitute_vars, Substitutor};
pub use env::{Environment, ProcessEnv};
pub use error::SubstitutionError;
pub use rewrite::{substitute_attributes, substitute_paths, substitute_payload};
pub use token::{parse_tokens, parse_tokens_in, Indexer, Namespace, Token};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
