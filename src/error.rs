//! Structured error types for store operations.
//!
//! `StoreError` covers the recoverable, caller-visible failures of the
//! structural API (`register_module`, `unregister_module`, path lookups).
//! Routing misses (an unknown mutation or action type, a duplicate getter
//! key) are deliberately *not* errors: they are logged and the operation
//! becomes a no-op, so a mistyped type string degrades instead of crashing a
//! running application.
//!
//! Action handlers use `anyhow::Error` as their transport; a handler's
//! rejection propagates to the dispatch caller unchanged.
//!
//! # Example
//!
//! ```ignore
//! use trellis::{Store, StoreError};
//!
//! match store.unregister_module("session") {
//!     Ok(()) => {}
//!     Err(StoreError::StaticModule { path }) => {
//!         eprintln!("{path} was declared at construction; cannot remove");
//!     }
//!     Err(e) => eprintln!("unregister failed: {e}"),
//! }
//! ```

use thiserror::Error;

/// Structured error type for store structural operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A path segment did not resolve to an existing module.
    #[error("module path not found: {path}")]
    PathNotFound {
        /// The path, segments joined with `/`.
        path: String,
    },

    /// `register_module`/`unregister_module` was called with an empty path.
    /// The root module can only be declared at construction.
    #[error("cannot address the root module through dynamic (un)registration")]
    RootPath,

    /// The target module was declared statically at construction; only
    /// modules registered at runtime may be unregistered.
    #[error("module \"{path}\" was not registered at runtime and cannot be unregistered")]
    StaticModule {
        /// The refused module path.
        path: String,
    },
}
