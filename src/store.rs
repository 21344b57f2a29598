//! The container: single state tree, commit/dispatch entry points, dynamic
//! module registration, and the routing-table lifecycle.
//!
//! A [`Store`] is a cheap-clone handle over shared internals; every clone
//! addresses the same state tree and routing table. The routing table is
//! held as an [`Arc`] snapshot behind a lock: readers clone the `Arc` and
//! drop the lock immediately, so commits and dispatches in flight keep
//! working against the table they started with while a structural change
//! (dynamic registration, unregistration, hot update) builds a replacement
//! wholesale and swaps it in atomically. The superseded table is handed to
//! deferred disposal so in-flight holders finish first.
//!
//! Mutations are the only sanctioned write path. In strict mode the
//! container registers a state observer that panics on any write arriving
//! outside the commit guard.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::context::{ActionContext, Getters, LocalGetters};
use crate::core::{
    unify_object_style, ActionRecord, ActionSubscriberFn, CommitOptions, GetterScope,
    MutationRecord, Payload, Plugin, RegisterOptions, SubscriberFn, WatchOptions,
};
use crate::decl::ModuleDecl;
use crate::error::StoreError;
use crate::hook::DebugHook;
use crate::install::{install_module, splice_state, subtree_state};
use crate::module::ModulePath;
use crate::reactive::{dispose_deferred, ObservedState};
use crate::routing::RoutingTable;
use crate::tree::ModuleTree;

pub(crate) struct StoreInner {
    tree: RwLock<ModuleTree>,
    table: RwLock<Arc<RoutingTable>>,
    observed: Arc<ObservedState>,
    committing: Arc<AtomicBool>,
    strict: bool,
    subscribers: Mutex<Vec<(u64, Arc<SubscriberFn>)>>,
    action_subscribers: Mutex<Vec<(u64, Arc<ActionSubscriberFn>)>>,
    next_sub_id: AtomicU64,
    hook: Option<Arc<dyn DebugHook>>,
}

/// Handle to a state container. Clones share the same underlying store.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Start building a store from its root module declaration.
    pub fn builder(root: ModuleDecl) -> StoreBuilder {
        StoreBuilder::new(root)
    }

    /// A snapshot clone of the full root state tree.
    pub fn state(&self) -> Value {
        self.inner.observed.snapshot()
    }

    /// Run `f` against the live root state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        self.inner.observed.with(f)
    }

    /// The container-wide getters view.
    pub fn getters(&self) -> Getters {
        Getters::new(self.clone())
    }

    /// Direct handle to the observed state cell. Writes through it bypass
    /// the mutation path and will trip the strict-mode observer.
    pub fn state_binding(&self) -> Arc<ObservedState> {
        Arc::clone(&self.inner.observed)
    }

    /// Commit a mutation: run every handler registered under `ty` against
    /// its module's state slice, in registration order, then notify
    /// subscribers with the post-mutation state.
    ///
    /// An unknown type is a logged no-op; subscribers are not notified.
    pub fn commit(&self, ty: &str, payload: impl Into<Payload>) {
        self.commit_with(ty, payload, CommitOptions::default());
    }

    /// Commit with options. `silent` is a removed legacy flag and only
    /// produces a warning.
    pub fn commit_with(&self, ty: &str, payload: impl Into<Payload>, options: CommitOptions) {
        let payload = payload.into().into_inner();
        let table = self.table_snapshot();
        let Some(entries) = table.mutations.get(ty) else {
            error!(mutation = %ty, "unknown mutation type");
            return;
        };

        self.with_commit(|| {
            self.inner.observed.write(|root| {
                for entry in entries {
                    match entry.path.resolve_mut(root) {
                        Some(slice) => (entry.handler)(slice, payload.as_ref()),
                        None => error!(
                            mutation = %ty,
                            module = %entry.path,
                            "module state slice missing; handler skipped"
                        ),
                    }
                }
            });
        });

        let record = MutationRecord {
            ty: ty.to_string(),
            payload,
        };
        let snapshot = self.inner.observed.snapshot();
        for subscriber in self.mutation_subscribers() {
            subscriber(&record, &snapshot);
        }
        if let Some(hook) = &self.inner.hook {
            hook.on_mutation(&record, &snapshot);
        }

        if options.silent {
            warn!(
                mutation = %ty,
                "silent option has been removed; filter the record in tooling instead"
            );
        }
    }

    /// Object-style commit: the `type` field names the mutation and the
    /// whole object is the payload. A missing or non-string `type` is a
    /// developer error: it panics in debug builds and is a logged no-op in
    /// release builds.
    pub fn commit_object(&self, obj: Value) {
        match unify_object_style(obj) {
            Some((ty, payload)) => self.commit(&ty, payload),
            None => {
                if cfg!(debug_assertions) {
                    panic!("object-style commit requires a string `type` field");
                }
                error!("object-style commit requires a string `type` field");
            }
        }
    }

    /// Dispatch an action: notify action subscribers with the pre-dispatch
    /// state, then run every handler registered under `ty` concurrently.
    ///
    /// One handler resolves to that handler's value; several resolve to an
    /// array of their values in registration order, or the first rejection.
    /// An unknown type is a logged no-op resolving to `Null`.
    pub async fn dispatch(&self, ty: &str, payload: impl Into<Payload>) -> anyhow::Result<Value> {
        let payload = payload.into().into_inner();
        let table = self.table_snapshot();
        let Some(entries) = table.actions.get(ty) else {
            error!(action = %ty, "unknown action type");
            return Ok(Value::Null);
        };

        let record = ActionRecord {
            ty: ty.to_string(),
            payload: payload.clone(),
        };
        {
            let snapshot = self.inner.observed.snapshot();
            for subscriber in self.action_subscribers() {
                subscriber(&record, &snapshot);
            }
        }

        let mut futures: Vec<_> = entries
            .iter()
            .map(|entry| {
                let ctx =
                    ActionContext::new(self.clone(), entry.namespace.clone(), entry.path.clone());
                (entry.handler)(ctx, payload.clone())
            })
            .collect();

        let result = match futures.len() {
            1 => futures.swap_remove(0).await,
            _ => try_join_all(futures).await.map(Value::Array),
        };

        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Some(hook) = &self.inner.hook {
                    hook.on_action_error(ty, &err);
                }
                Err(err)
            }
        }
    }

    /// Object-style dispatch; see [`Store::commit_object`].
    pub async fn dispatch_object(&self, obj: Value) -> anyhow::Result<Value> {
        match unify_object_style(obj) {
            Some((ty, payload)) => self.dispatch(&ty, payload).await,
            None => {
                if cfg!(debug_assertions) {
                    panic!("object-style dispatch requires a string `type` field");
                }
                error!("object-style dispatch requires a string `type` field");
                Ok(Value::Null)
            }
        }
    }

    /// Register a mutation subscriber, notified after every commit's
    /// handlers have run.
    pub fn subscribe(
        &self,
        subscriber: impl Fn(&MutationRecord, &Value) + Send + Sync + 'static,
    ) -> SubscriptionHandle {
        let id = self.inner.next_sub_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.subscribers).push((id, Arc::new(subscriber)));
        SubscriptionHandle {
            inner: Arc::downgrade(&self.inner),
            kind: SubscriptionKind::Mutation,
            id,
        }
    }

    /// Register an action subscriber, notified before every dispatch's
    /// handlers start.
    pub fn subscribe_action(
        &self,
        subscriber: impl Fn(&ActionRecord, &Value) + Send + Sync + 'static,
    ) -> SubscriptionHandle {
        let id = self.inner.next_sub_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.action_subscribers).push((id, Arc::new(subscriber)));
        SubscriptionHandle {
            inner: Arc::downgrade(&self.inner),
            kind: SubscriptionKind::Action,
            id,
        }
    }

    /// Watch a derived value: `getter` is re-evaluated after every state
    /// write and `callback` fires with `(new, old)` when the result changes.
    ///
    /// By default the evaluation is deferred to the next runtime tick, so a
    /// burst of writes collapses to one comparison; `sync: true` evaluates
    /// inline on every write.
    pub fn watch(
        &self,
        getter: impl Fn(&Value, &Getters) -> Value + Send + Sync + 'static,
        callback: impl Fn(&Value, &Value) + Send + Sync + 'static,
        options: WatchOptions,
    ) -> WatchHandle {
        let getter = Arc::new(getter);
        let callback = Arc::new(callback);
        let previous = Arc::new(Mutex::new(getter(&self.state(), &self.getters())));
        let store_weak = Arc::downgrade(&self.inner);
        let sync = options.sync;

        let id = self.inner.observed.observe(move || {
            let Some(inner) = store_weak.upgrade() else {
                return;
            };
            let store = Store { inner };
            let getter = Arc::clone(&getter);
            let callback = Arc::clone(&callback);
            let previous = Arc::clone(&previous);
            let evaluate = move || {
                let current = getter(&store.state(), &store.getters());
                let mut prev = lock(&previous);
                if *prev != current {
                    let old = std::mem::replace(&mut *prev, current.clone());
                    drop(prev);
                    callback(&current, &old);
                }
            };
            if sync {
                evaluate();
                return;
            }
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        tokio::task::yield_now().await;
                        evaluate();
                    });
                }
                Err(_) => evaluate(),
            }
        });

        WatchHandle {
            observed: Arc::downgrade(&self.inner.observed),
            id,
        }
    }

    /// Swap the entire root state tree. Runs under the commit guard, so
    /// strict mode stays quiet; watchers and getter caches see a new
    /// version.
    pub fn replace_state(&self, state: Value) {
        self.with_commit(|| {
            self.inner.observed.write(|root| *root = state);
        });
    }

    /// Register a module subtree at runtime. The routing table is rebuilt
    /// wholesale and the subtree's initial state is spliced into the parent
    /// slice, unless `preserve_state` keeps whatever is already there.
    pub fn register_module(
        &self,
        path: impl Into<ModulePath>,
        decl: ModuleDecl,
        options: RegisterOptions,
    ) -> Result<(), StoreError> {
        let path = path.into();
        if path.is_root() {
            return Err(StoreError::RootPath);
        }
        // Compute the subtree state inside the lock but splice after it is
        // released: splicing notifies observers synchronously, and an
        // observer is free to call back into tree-reading APIs.
        let spliced = {
            let mut tree = write_lock(&self.inner.tree);
            tree.register(&path, decl, true)?;
            if options.preserve_state {
                None
            } else {
                tree.get(&path).map(subtree_state)
            }
        };
        if let Some(state) = spliced {
            splice_state(self, &path, state);
        }
        self.install_all(true);
        debug!(module = %path, "module registered");
        Ok(())
    }

    /// Remove a runtime-registered module: drop it from the tree, delete
    /// its state slice, and rebuild the routing table. Modules wired in at
    /// construction are refused.
    pub fn unregister_module(&self, path: impl Into<ModulePath>) -> Result<(), StoreError> {
        let path = path.into();
        {
            let mut tree = write_lock(&self.inner.tree);
            tree.unregister(&path)?;
        }
        let parent = path.parent();
        self.with_commit(|| {
            self.inner.observed.write(|root| {
                if let Some(Value::Object(map)) = parent.resolve_mut(root) {
                    if let Some(key) = path.last() {
                        map.remove(key);
                    }
                }
            });
        });
        self.install_all(true);
        debug!(module = %path, "module unregistered");
        Ok(())
    }

    /// Whether a module is registered at `path`.
    pub fn has_module(&self, path: impl Into<ModulePath>) -> bool {
        let path = path.into();
        read_lock(&self.inner.tree).get(&path).is_some()
    }

    /// Hot-swap handler definitions across the whole tree without touching
    /// state or structure, then rebuild the routing table. New child keys in
    /// the replacement declaration are refused with a warning.
    pub fn hot_update(&self, new_root: ModuleDecl) {
        {
            let mut tree = write_lock(&self.inner.tree);
            tree.update(new_root);
        }
        self.install_all(true);
    }

    /// Whether any handler is registered under the fully-qualified type.
    pub fn has_mutation(&self, ty: &str) -> bool {
        self.table_snapshot().has_mutation(ty)
    }

    pub fn has_action(&self, ty: &str) -> bool {
        self.table_snapshot().has_action(ty)
    }

    /// Registered handler counts, mostly useful in tests and tooling.
    pub fn mutation_handler_count(&self) -> usize {
        self.table_snapshot().mutation_handler_count()
    }

    pub fn action_handler_count(&self) -> usize {
        self.table_snapshot().action_handler_count()
    }

    pub fn getter_count(&self) -> usize {
        self.table_snapshot().getter_count()
    }

    /// Evaluate a getter by fully-qualified type, using its cached value
    /// when the state version has not moved since the last evaluation.
    pub(crate) fn eval_getter(&self, ty: &str) -> Option<Value> {
        let table = self.table_snapshot();
        let entry = table.wrapped_getters.get(ty)?;
        {
            let version = self.inner.observed.version();
            let cache = lock(&entry.cache);
            if let Some((cached_version, value)) = cache.as_ref() {
                if *cached_version == version {
                    return Some(value.clone());
                }
            }
        }

        // One lock acquisition pairs the snapshot with its version; the
        // cache entry is tagged with the version the value was read at.
        let (version, root) = self.inner.observed.versioned_snapshot();
        let local = entry.path.resolve(&root).cloned().unwrap_or(Value::Null);
        let local_getters = LocalGetters::new(self.clone(), entry.namespace.clone());
        let root_getters = Getters::new(self.clone());
        let value = (entry.getter)(GetterScope {
            state: &local,
            getters: &local_getters,
            root_state: &root,
            root_getters: &root_getters,
        });

        let mut cache = lock(&entry.cache);
        *cache = Some((version, value.clone()));
        Some(value)
    }

    pub(crate) fn getter_keys(&self) -> Vec<String> {
        let table = self.table_snapshot();
        let mut keys: Vec<String> = table.wrapped_getters.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Run `f` with the commit guard raised, restoring the previous flag
    /// afterwards so nested commits unwind correctly.
    pub(crate) fn with_commit<R>(&self, f: impl FnOnce() -> R) -> R {
        let previous = self.inner.committing.swap(true, Ordering::SeqCst);
        let result = f();
        self.inner.committing.store(previous, Ordering::SeqCst);
        result
    }

    /// Rebuild the routing table wholesale from the current tree and swap
    /// the snapshot in. The superseded table is released on the next idle
    /// tick so in-flight readers finish against the version they hold.
    pub(crate) fn install_all(&self, hot: bool) {
        let mut table = RoutingTable::default();
        {
            let tree = read_lock(&self.inner.tree);
            install_module(self, &tree, &mut table, &ModulePath::root(), tree.root(), hot);
        }
        debug!(
            mutations = table.mutation_handler_count(),
            actions = table.action_handler_count(),
            getters = table.getter_count(),
            hot,
            "routing table rebuilt"
        );
        let superseded = {
            let mut slot = write_lock(&self.inner.table);
            std::mem::replace(&mut *slot, Arc::new(table))
        };
        dispose_deferred(superseded);
    }

    fn table_snapshot(&self) -> Arc<RoutingTable> {
        Arc::clone(&read_lock(&self.inner.table))
    }

    fn mutation_subscribers(&self) -> Vec<Arc<SubscriberFn>> {
        lock(&self.inner.subscribers)
            .iter()
            .map(|(_, s)| Arc::clone(s))
            .collect()
    }

    fn action_subscribers(&self) -> Vec<Arc<ActionSubscriberFn>> {
        lock(&self.inner.action_subscribers)
            .iter()
            .map(|(_, s)| Arc::clone(s))
            .collect()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("strict", &self.inner.strict)
            .field("version", &self.inner.observed.version())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read_lock<T>(rwlock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    rwlock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(rwlock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    rwlock.write().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Copy)]
enum SubscriptionKind {
    Mutation,
    Action,
}

/// Detaches a subscriber when consumed. Holding it is optional; dropping
/// the handle leaves the subscription alive.
pub struct SubscriptionHandle {
    inner: Weak<StoreInner>,
    kind: SubscriptionKind,
    id: u64,
}

impl SubscriptionHandle {
    pub fn unsubscribe(self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        match self.kind {
            SubscriptionKind::Mutation => {
                lock(&inner.subscribers).retain(|(id, _)| *id != self.id)
            }
            SubscriptionKind::Action => {
                lock(&inner.action_subscribers).retain(|(id, _)| *id != self.id)
            }
        }
    }
}

/// Detaches a watcher when consumed; dropping leaves the watcher alive.
pub struct WatchHandle {
    observed: Weak<ObservedState>,
    id: u64,
}

impl WatchHandle {
    pub fn unwatch(self) {
        if let Some(observed) = self.observed.upgrade() {
            observed.unobserve(self.id);
        }
    }
}

/// Builder for a [`Store`]: root declaration, plugins, strict mode, and
/// the optional debug hook.
pub struct StoreBuilder {
    root: ModuleDecl,
    plugins: Vec<Plugin>,
    strict: bool,
    hook: Option<Arc<dyn DebugHook>>,
}

impl StoreBuilder {
    pub fn new(root: ModuleDecl) -> Self {
        Self {
            root,
            plugins: Vec::new(),
            strict: false,
            hook: None,
        }
    }

    /// Add a plugin, applied once during construction with the finished
    /// store handle. Plugins typically subscribe or watch.
    pub fn plugin(mut self, plugin: impl FnOnce(&Store) + Send + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Panic on any state write arriving outside a mutation handler.
    /// Deep-compares every write; leave off in production builds.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Attach a devtools-style observer; see [`DebugHook`].
    pub fn debug_hook(mut self, hook: Arc<dyn DebugHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn build(self) -> Store {
        let tree = ModuleTree::new(self.root);
        let observed = Arc::new(ObservedState::new(tree.root().state().clone()));
        let store = Store {
            inner: Arc::new(StoreInner {
                tree: RwLock::new(tree),
                table: RwLock::new(Arc::new(RoutingTable::default())),
                observed,
                committing: Arc::new(AtomicBool::new(false)),
                strict: self.strict,
                subscribers: Mutex::new(Vec::new()),
                action_subscribers: Mutex::new(Vec::new()),
                next_sub_id: AtomicU64::new(1),
                hook: self.hook,
            }),
        };

        store.install_all(false);

        if store.inner.strict {
            let committing = Arc::clone(&store.inner.committing);
            store.inner.observed.observe(move || {
                if !committing.load(Ordering::SeqCst) {
                    panic!("do not mutate trellis store state outside mutation handlers");
                }
            });
        }

        for plugin in self.plugins {
            plugin(&store);
        }
        if let Some(hook) = &store.inner.hook {
            hook.init(&store);
        }

        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn counter_store() -> Store {
        Store::builder(
            ModuleDecl::new()
                .with_state(json!({"count": 0}))
                .mutation("increment", |state, payload| {
                    let by = payload.and_then(Value::as_i64).unwrap_or(1);
                    state["count"] = json!(state["count"].as_i64().unwrap_or(0) + by);
                })
                .getter("double", |scope| {
                    json!(scope.state["count"].as_i64().unwrap_or(0) * 2)
                }),
        )
        .build()
    }

    #[test]
    fn test_commit_applies_handler() {
        let store = counter_store();
        store.commit("increment", json!(5));
        assert_eq!(store.state()["count"], json!(5));
    }

    #[test]
    fn test_unknown_mutation_is_noop() {
        let store = counter_store();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen2 = Arc::clone(&seen);
        store.subscribe(move |_, _| {
            seen2.fetch_add(1, Ordering::SeqCst);
        });
        store.commit("no-such-type", ());
        assert_eq!(store.state()["count"], json!(0));
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_subscriber_sees_post_mutation_state() {
        let store = counter_store();
        let observed = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&observed);
        store.subscribe(move |record, state| {
            *slot.lock().unwrap() = Some((record.ty.clone(), state["count"].clone()));
        });
        store.commit("increment", json!(3));
        assert_eq!(
            observed.lock().unwrap().take(),
            Some(("increment".to_string(), json!(3)))
        );
    }

    #[test]
    fn test_unsubscribe_detaches() {
        let store = counter_store();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen2 = Arc::clone(&seen);
        let handle = store.subscribe(move |_, _| {
            seen2.fetch_add(1, Ordering::SeqCst);
        });
        store.commit("increment", ());
        handle.unsubscribe();
        store.commit("increment", ());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_getter_caches_until_state_moves() {
        let store = counter_store();
        assert_eq!(store.getters().get("double"), Some(json!(0)));
        store.commit("increment", json!(2));
        assert_eq!(store.getters().get("double"), Some(json!(4)));
        assert_eq!(store.getters().get("double"), Some(json!(4)));
    }

    #[test]
    fn test_replace_state_swaps_tree() {
        let store = counter_store();
        store.replace_state(json!({"count": 41}));
        store.commit("increment", ());
        assert_eq!(store.state()["count"], json!(42));
    }

    #[test]
    #[should_panic(expected = "outside mutation handlers")]
    fn test_strict_mode_panics_on_direct_write() {
        let store = Store::builder(ModuleDecl::new().with_state(json!({"n": 0})))
            .strict(true)
            .build();
        store.state_binding().write(|root| {
            root["n"] = json!(1);
        });
    }

    #[test]
    fn test_strict_mode_allows_commit() {
        let store = Store::builder(
            ModuleDecl::new()
                .with_state(json!({"n": 0}))
                .mutation("bump", |state, _| {
                    state["n"] = json!(state["n"].as_i64().unwrap_or(0) + 1);
                }),
        )
        .strict(true)
        .build();
        store.commit("bump", ());
        assert_eq!(store.state()["n"], json!(1));
    }

    #[tokio::test]
    async fn test_dispatch_single_handler_result() {
        let store = Store::builder(ModuleDecl::new().with_state(json!({})).action(
            "fetch",
            |_ctx, payload: Option<Value>| async move {
                Ok(json!({"echo": payload.unwrap_or(Value::Null)}))
            },
        ))
        .build();
        let out = store.dispatch("fetch", json!(7)).await.unwrap();
        assert_eq!(out, json!({"echo": 7}));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_action_resolves_null() {
        let store = Store::builder(ModuleDecl::new()).build();
        let out = store.dispatch("missing", ()).await.unwrap();
        assert_eq!(out, Value::Null);
    }

    #[test]
    fn test_plugin_runs_at_build() {
        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = Arc::clone(&ran);
        let _store = Store::builder(ModuleDecl::new().with_state(json!({})))
            .plugin(move |_store| {
                ran2.fetch_add(1, Ordering::SeqCst);
            })
            .build();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
