//! The flattened routing table: fully-qualified type → handlers.
//!
//! One table exists per container. It is rebuilt wholesale on every
//! structural change (dynamic registration, unregistration, hot update) and
//! swapped in as an immutable snapshot; it is never mutated incrementally
//! after install. Concurrent readers therefore always see either the fully
//! old or fully new table, never a partial one.
//!
//! Mutations and actions are lists per type: several modules may legally
//! register the same type string (non-namespaced siblings, or a deliberate
//! root-level collision), and every matched handler fires in registration
//! order. Getters are single-entry: the first registration wins and a later
//! collision is logged and dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::error;

use crate::core::{ActionFn, GetterFn, MutationFn};
use crate::module::ModulePath;

/// A bound mutation handler plus the path of its owning module.
pub(crate) struct MutationEntry {
    pub path: ModulePath,
    pub handler: Arc<MutationFn>,
}

/// A bound action handler plus the namespace scope its context is built with.
pub(crate) struct ActionEntry {
    pub path: ModulePath,
    pub namespace: String,
    pub handler: Arc<ActionFn>,
}

/// A wrapped getter: the raw derivation plus a result cache keyed by the
/// observed state version. The cache lives and dies with the table snapshot,
/// so a rebuild implicitly invalidates every derivation.
pub(crate) struct GetterEntry {
    pub path: ModulePath,
    pub namespace: String,
    pub getter: Arc<GetterFn>,
    pub cache: Mutex<Option<(u64, Value)>>,
}

/// Container-wide maps from fully-qualified type string to handlers, plus
/// the namespace index for external namespaced lookups.
#[derive(Default)]
pub struct RoutingTable {
    pub(crate) mutations: HashMap<String, Vec<MutationEntry>>,
    pub(crate) actions: HashMap<String, Vec<ActionEntry>>,
    pub(crate) wrapped_getters: HashMap<String, GetterEntry>,
    pub(crate) namespace_map: HashMap<String, ModulePath>,
}

impl RoutingTable {
    pub(crate) fn add_mutation(&mut self, ty: String, entry: MutationEntry) {
        self.mutations.entry(ty).or_default().push(entry);
    }

    pub(crate) fn add_action(&mut self, ty: String, entry: ActionEntry) {
        self.actions.entry(ty).or_default().push(entry);
    }

    /// First registration wins; a duplicate is logged and never installed.
    pub(crate) fn add_getter(&mut self, ty: String, entry: GetterEntry) {
        if self.wrapped_getters.contains_key(&ty) {
            error!(getter = %ty, "duplicate getter key; later registration dropped");
            return;
        }
        self.wrapped_getters.insert(ty, entry);
    }

    /// Total number of bound mutation handlers across all types.
    pub fn mutation_handler_count(&self) -> usize {
        self.mutations.values().map(Vec::len).sum()
    }

    /// Total number of bound action handlers across all types.
    pub fn action_handler_count(&self) -> usize {
        self.actions.values().map(Vec::len).sum()
    }

    pub fn getter_count(&self) -> usize {
        self.wrapped_getters.len()
    }

    pub fn has_mutation(&self, ty: &str) -> bool {
        self.mutations.contains_key(ty)
    }

    pub fn has_action(&self, ty: &str) -> bool {
        self.actions.contains_key(ty)
    }

    /// The module path registered under a namespace string, if any.
    pub fn namespace_path(&self, namespace: &str) -> Option<&ModulePath> {
        self.namespace_map.get(namespace)
    }
}

impl fmt::Debug for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingTable")
            .field("mutations", &self.mutation_handler_count())
            .field("actions", &self.action_handler_count())
            .field("getters", &self.getter_count())
            .field("namespaces", &self.namespace_map.len())
            .finish()
    }
}
