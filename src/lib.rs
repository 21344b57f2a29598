//! # Trellis
//!
//! A hierarchical, namespaced state container: one state tree, explicit
//! write paths, and a routing table that maps string-typed operations onto
//! handlers scattered across a module tree.
//!
//! ## Core Concepts
//!
//! Trellis separates **writes** from **work**:
//! - Mutation = the only sanctioned state write (synchronous, tracked)
//! - Action = async work that eventually commits mutations
//!
//! The key principle: **state changes only through committed mutations**.
//! Everything else (actions, getters, watchers) reads snapshots or derives
//! from them.
//!
//! ## Architecture
//!
//! ```text
//! caller
//!   │ commit("cart/add", payload)        dispatch("cart/checkout", payload)
//!   ▼                                      ▼
//! RoutingTable ── type ─► handlers       RoutingTable ── type ─► handlers
//!   │ (per-module state slice)             │ (ActionContext per module)
//!   ▼                                      ▼
//! ObservedState tree  ◄── mutations ── async handlers
//!   │
//!   ├─► subscribers (per commit)
//!   ├─► watchers (derived values)
//!   └─► getters (version-cached)
//! ```
//!
//! Modules form a tree; each `namespaced` node contributes `key + "/"` to
//! the types registered beneath it, so `commit("cart/add", …)` reaches the
//! `add` handler of the `cart` module. Structural changes (dynamic
//! registration, unregistration, hot update) rebuild the routing table
//! wholesale and swap it in atomically.
//!
//! ## Quick start
//!
//! ```
//! use serde_json::json;
//! use trellis::{ModuleDecl, Store};
//!
//! let store = Store::builder(
//!     ModuleDecl::new()
//!         .with_state(json!({"count": 0}))
//!         .mutation("increment", |state, _payload| {
//!             state["count"] = json!(state["count"].as_i64().unwrap_or(0) + 1);
//!         })
//!         .getter("double", |scope| {
//!             json!(scope.state["count"].as_i64().unwrap_or(0) * 2)
//!         }),
//! )
//! .build();
//!
//! store.commit("increment", ());
//! assert_eq!(store.state()["count"], json!(1));
//! assert_eq!(store.getters().get("double"), Some(json!(2)));
//! ```
//!
//! ## Guarantees
//!
//! - **Single state tree**: every module owns a slice of one root value
//! - **Atomic table swaps**: in-flight commits finish against the table
//!   they started with; superseded tables are released on the next idle tick
//! - **Strict mode**: opt-in panic on writes outside mutation handlers

mod context;
mod core;
mod decl;
mod error;
mod hook;
mod install;
mod module;
mod reactive;
mod routing;
mod store;
mod tree;


pub use context::{ActionContext, Getters, LocalContext, LocalGetters};
pub use self::core::{
    ActionRecord, CommitOptions, DispatchOptions, GetterScope, MutationRecord, Payload,
    RegisterOptions, WatchOptions,
};
pub use decl::{ModuleDecl, StateInit};
pub use error::StoreError;
pub use hook::DebugHook;
pub use module::{Module, ModulePath};
pub use reactive::ObservedState;
pub use routing::RoutingTable;
pub use store::{Store, StoreBuilder, SubscriptionHandle, WatchHandle};
pub use tree::ModuleTree;
