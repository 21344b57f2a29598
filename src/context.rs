//! Namespace-scoped views: local contexts and getter proxies.
//!
//! A [`LocalContext`] is what a module's handlers see instead of the raw
//! container: `state` resolves, on every access, to the live nested slice at
//! the module's path (never cached, so it reflects `replace_state` and hot
//! updates); `commit`/`dispatch` prefix the supplied type with the module's
//! namespace unless the caller explicitly targets the root; `getters`
//! exposes only entries under the namespace, re-keyed with the prefix
//! stripped.
//!
//! The views are plain accessor structs that recompute on demand: no
//! property interception, no caching. For a non-namespaced module the
//! namespace is the empty string and every view degenerates to the
//! container-wide one.

use serde_json::Value;
use tracing::error;

use crate::core::{CommitOptions, DispatchOptions, Payload};
use crate::module::ModulePath;
use crate::store::Store;

/// The container-wide getters view.
#[derive(Clone)]
pub struct Getters {
    store: Store,
}

impl Getters {
    pub(crate) fn new(store: Store) -> Self {
        Self { store }
    }

    /// Evaluate the getter registered under a fully-qualified type.
    /// `None` when no such getter exists.
    pub fn get(&self, ty: &str) -> Option<Value> {
        self.store.eval_getter(ty)
    }

    /// All registered fully-qualified getter types, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.store.getter_keys()
    }
}

/// A namespace-filtered getters view, re-keyed with the prefix stripped.
///
/// Recomputed against the live routing table on every call, so it stays
/// correct across hot updates and dynamic registration.
#[derive(Clone)]
pub struct LocalGetters {
    store: Store,
    namespace: String,
}

impl LocalGetters {
    pub(crate) fn new(store: Store, namespace: String) -> Self {
        Self { store, namespace }
    }

    /// Evaluate a getter by its local (prefix-stripped) key.
    pub fn get(&self, local_ty: &str) -> Option<Value> {
        self.store
            .eval_getter(&format!("{}{}", self.namespace, local_ty))
    }

    /// Local keys of every getter under this namespace, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.store
            .getter_keys()
            .into_iter()
            .filter_map(|ty| ty.strip_prefix(&self.namespace).map(str::to_string))
            .collect()
    }
}

/// Per-module view of the container, scoped to the module's namespace.
#[derive(Clone)]
pub struct LocalContext {
    store: Store,
    namespace: String,
    path: ModulePath,
}

impl LocalContext {
    pub(crate) fn new(store: Store, namespace: String, path: ModulePath) -> Self {
        Self {
            store,
            namespace,
            path,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &ModulePath {
        &self.path
    }

    /// The module's live state slice, resolved against the current root
    /// state on every access. `Null` if the slice has been removed.
    pub fn state(&self) -> Value {
        self.store
            .with_state(|root| self.path.resolve(root).cloned())
            .unwrap_or(Value::Null)
    }

    /// Getters under this module's namespace.
    pub fn getters(&self) -> LocalGetters {
        LocalGetters::new(self.store.clone(), self.namespace.clone())
    }

    /// Commit a mutation, prefixing the type with this module's namespace.
    pub fn commit(&self, ty: &str, payload: impl Into<Payload>) {
        self.commit_with(ty, payload, CommitOptions::default());
    }

    /// Commit with options; `root: true` bypasses the namespace prefix.
    pub fn commit_with(&self, ty: &str, payload: impl Into<Payload>, options: CommitOptions) {
        if let Some(global) = self.qualify(ty, options.root, Kind::Mutation) {
            self.store.commit_with(&global, payload, options);
        }
    }

    /// Dispatch an action, prefixing the type with this module's namespace.
    pub async fn dispatch(&self, ty: &str, payload: impl Into<Payload>) -> anyhow::Result<Value> {
        self.dispatch_with(ty, payload, DispatchOptions::default())
            .await
    }

    /// Dispatch with options; `root: true` bypasses the namespace prefix.
    pub async fn dispatch_with(
        &self,
        ty: &str,
        payload: impl Into<Payload>,
        options: DispatchOptions,
    ) -> anyhow::Result<Value> {
        match self.qualify(ty, options.root, Kind::Action) {
            Some(global) => self.store.dispatch(&global, payload).await,
            None => Ok(Value::Null),
        }
    }

    /// Prefix a local type with the namespace unless targeting the root.
    /// In debug builds an unknown prefixed type is reported with both the
    /// local and global spelling and the call becomes a no-op.
    fn qualify(&self, ty: &str, target_root: bool, kind: Kind) -> Option<String> {
        if self.namespace.is_empty() || target_root {
            return Some(ty.to_string());
        }
        let global = format!("{}{}", self.namespace, ty);
        if cfg!(debug_assertions) {
            let known = match kind {
                Kind::Mutation => self.store.has_mutation(&global),
                Kind::Action => self.store.has_action(&global),
            };
            if !known {
                match kind {
                    Kind::Mutation => error!(
                        local = %ty,
                        global = %global,
                        "unknown local mutation type"
                    ),
                    Kind::Action => error!(
                        local = %ty,
                        global = %global,
                        "unknown local action type"
                    ),
                }
                return None;
            }
        }
        Some(global)
    }
}

#[derive(Clone, Copy)]
enum Kind {
    Mutation,
    Action,
}

/// The context handed to every action handler: the owning module's local
/// view plus container-wide state and getters.
#[derive(Clone)]
pub struct ActionContext {
    local: LocalContext,
}

impl ActionContext {
    pub(crate) fn new(store: Store, namespace: String, path: ModulePath) -> Self {
        Self {
            local: LocalContext::new(store, namespace, path),
        }
    }

    /// The owning module's live state slice.
    pub fn state(&self) -> Value {
        self.local.state()
    }

    /// Getters under the owning module's namespace.
    pub fn getters(&self) -> LocalGetters {
        self.local.getters()
    }

    /// The full root state tree.
    pub fn root_state(&self) -> Value {
        self.local.store.state()
    }

    /// The container-wide getters view.
    pub fn root_getters(&self) -> Getters {
        Getters::new(self.local.store.clone())
    }

    /// Commit through the local namespace.
    pub fn commit(&self, ty: &str, payload: impl Into<Payload>) {
        self.local.commit(ty, payload);
    }

    /// Commit with options; `root: true` targets the bare type.
    pub fn commit_with(&self, ty: &str, payload: impl Into<Payload>, options: CommitOptions) {
        self.local.commit_with(ty, payload, options);
    }

    /// Dispatch through the local namespace.
    pub async fn dispatch(&self, ty: &str, payload: impl Into<Payload>) -> anyhow::Result<Value> {
        self.local.dispatch(ty, payload).await
    }

    /// Dispatch with options; `root: true` targets the bare type.
    pub async fn dispatch_with(
        &self,
        ty: &str,
        payload: impl Into<Payload>,
        options: DispatchOptions,
    ) -> anyhow::Result<Value> {
        self.local.dispatch_with(ty, payload, options).await
    }

    /// The underlying local context.
    pub fn local(&self) -> &LocalContext {
        &self.local
    }
}
