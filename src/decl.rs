//! Raw module declarations.
//!
//! A [`ModuleDecl`] is what callers author: a state slice (fixed value or
//! factory), a `namespaced` flag, named mutations/actions/getters, and
//! nested sub-module declarations. The declaration is retained by the tree
//! node it produces so hot updates can swap handler definitions in place
//! without touching already-spliced state.
//!
//! # Example
//!
//! ```ignore
//! use serde_json::json;
//! use trellis::ModuleDecl;
//!
//! let cart = ModuleDecl::new()
//!     .namespaced(true)
//!     .with_state(json!({ "items": [] }))
//!     .mutation("push", |state, payload| {
//!         if let (Some(items), Some(p)) = (state["items"].as_array_mut(), payload) {
//!             items.push(p.clone());
//!         }
//!     })
//!     .action("checkout", |ctx, _payload| async move {
//!         ctx.commit("clear", ());
//!         Ok(json!("ok"))
//!     });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::core::{ActionFn, GetterFn, MutationFn};
use crate::module::ModulePath;

/// How a module's state slice is produced at registration time.
///
/// A factory is re-invoked on every materialization so sibling instances of
/// the same declaration never share state.
#[derive(Clone)]
pub enum StateInit {
    /// A fixed value, cloned at registration.
    Value(Value),
    /// A zero-argument factory, invoked at registration.
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl StateInit {
    /// Produce the state slice. `Null` (the default) becomes an empty
    /// object so child modules always have somewhere to splice into.
    pub(crate) fn materialize(&self) -> Value {
        let value = match self {
            StateInit::Value(v) => v.clone(),
            StateInit::Factory(f) => f(),
        };
        if value.is_null() {
            Value::Object(Map::new())
        } else {
            value
        }
    }
}

impl Default for StateInit {
    fn default() -> Self {
        StateInit::Value(Value::Null)
    }
}

impl fmt::Debug for StateInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateInit::Value(v) => f.debug_tuple("Value").field(v).finish(),
            StateInit::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// The registered shape of an action, resolved once at declaration time.
///
/// `Rooted` actions bypass namespace prefixing and register at their bare
/// local key even inside a namespaced module.
#[derive(Clone)]
pub(crate) enum ActionDecl {
    Plain(Arc<ActionFn>),
    Rooted(Arc<ActionFn>),
}

impl ActionDecl {
    pub(crate) fn handler(&self) -> &Arc<ActionFn> {
        match self {
            ActionDecl::Plain(h) | ActionDecl::Rooted(h) => h,
        }
    }

    pub(crate) fn bypasses_namespace(&self) -> bool {
        matches!(self, ActionDecl::Rooted(_))
    }
}

/// A raw module definition: one node of the state tree as authored by the
/// caller. Handler registration order is preserved; it determines invocation
/// order when several modules register the same fully-qualified type.
#[derive(Clone, Default)]
pub struct ModuleDecl {
    pub(crate) state: StateInit,
    pub(crate) namespaced: bool,
    pub(crate) mutations: Vec<(String, Arc<MutationFn>)>,
    pub(crate) actions: Vec<(String, ActionDecl)>,
    pub(crate) getters: Vec<(String, Arc<GetterFn>)>,
    pub(crate) modules: Vec<(String, ModuleDecl)>,
}

impl ModuleDecl {
    /// Create an empty declaration (empty-object state, not namespaced).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a fixed state value for this module.
    pub fn with_state(mut self, state: Value) -> Self {
        self.state = StateInit::Value(state);
        self
    }

    /// Set a state factory, invoked at every registration of this
    /// declaration.
    pub fn with_state_factory(mut self, factory: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.state = StateInit::Factory(Arc::new(factory));
        self
    }

    /// Set whether this module's types are prefixed with its key.
    pub fn namespaced(mut self, namespaced: bool) -> Self {
        self.namespaced = namespaced;
        self
    }

    /// Register a mutation handler under `name`.
    pub fn mutation(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(&mut Value, Option<&Value>) + Send + Sync + 'static,
    ) -> Self {
        self.mutations.push((name.into(), Arc::new(handler)));
        self
    }

    /// Register an action handler under `name`.
    pub fn action<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(crate::context::ActionContext, Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.actions
            .push((name.into(), ActionDecl::Plain(wrap_action(handler))));
        self
    }

    /// Register an action that bypasses namespace prefixing and is addressed
    /// at its bare local key.
    pub fn root_action<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(crate::context::ActionContext, Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.actions
            .push((name.into(), ActionDecl::Rooted(wrap_action(handler))));
        self
    }

    /// Register a getter under `name`.
    pub fn getter(
        mut self,
        name: impl Into<String>,
        getter: impl Fn(crate::core::GetterScope<'_>) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.getters.push((name.into(), Arc::new(getter)));
        self
    }

    /// Attach a nested sub-module declaration under `key`.
    pub fn module(mut self, key: impl Into<String>, decl: ModuleDecl) -> Self {
        self.modules.push((key.into(), decl));
        self
    }
}

impl fmt::Debug for ModuleDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDecl")
            .field("namespaced", &self.namespaced)
            .field("mutations", &self.mutations.len())
            .field("actions", &self.actions.len())
            .field("getters", &self.getters.len())
            .field("modules", &self.modules.len())
            .finish_non_exhaustive()
    }
}

fn wrap_action<F, Fut>(handler: F) -> Arc<ActionFn>
where
    F: Fn(crate::context::ActionContext, Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Arc::new(move |ctx, payload| Box::pin(handler(ctx, payload)))
}

/// Validate a declaration's shape at registration time.
///
/// Handler names and module keys must be non-empty, free of `/` (which would
/// corrupt namespace arithmetic), and unique within their section. This is a
/// developer-facing correctness check, compiled only into debug builds.
#[cfg(debug_assertions)]
pub(crate) fn assert_decl(path: &ModulePath, decl: &ModuleDecl) {
    fn check<'a>(section: &str, names: impl Iterator<Item = &'a String>, path: &ModulePath) {
        let mut seen: Vec<&str> = Vec::new();
        for name in names {
            assert!(
                !name.is_empty() && !name.contains('/'),
                "{section} should have non-empty, slash-free names but \"{section}.{name}\" in module \"{path}\" is not"
            );
            assert!(
                !seen.contains(&name.as_str()),
                "duplicate {section} key \"{name}\" in module \"{path}\""
            );
            seen.push(name);
        }
    }

    check("getters", decl.getters.iter().map(|(n, _)| n), path);
    check("mutations", decl.mutations.iter().map(|(n, _)| n), path);
    check("actions", decl.actions.iter().map(|(n, _)| n), path);
    check("modules", decl.modules.iter().map(|(n, _)| n), path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_value_materializes_clone() {
        let init = StateInit::Value(json!({"count": 0}));
        assert_eq!(init.materialize(), json!({"count": 0}));
        // Materializing again yields an independent copy.
        assert_eq!(init.materialize(), json!({"count": 0}));
    }

    #[test]
    fn test_state_factory_reinvoked_per_materialization() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let init = StateInit::Factory(Arc::new(move || {
            calls2.fetch_add(1, Ordering::Relaxed);
            json!({"fresh": true})
        }));
        init.materialize();
        init.materialize();
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_null_state_becomes_empty_object() {
        assert_eq!(StateInit::default().materialize(), json!({}));
    }

    #[test]
    fn test_builder_preserves_registration_order() {
        let decl = ModuleDecl::new()
            .mutation("b", |_, _| {})
            .mutation("a", |_, _| {});
        let names: Vec<_> = decl.mutations.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn test_root_action_bypasses_namespace() {
        let decl = ModuleDecl::new()
            .action("plain", |_, _| async { Ok(Value::Null) })
            .root_action("rooted", |_, _| async { Ok(Value::Null) });
        assert!(!decl.actions[0].1.bypasses_namespace());
        assert!(decl.actions[1].1.bypasses_namespace());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "mutations")]
    fn test_assert_decl_rejects_slash_in_name() {
        let decl = ModuleDecl::new().mutation("a/b", |_, _| {});
        assert_decl(&ModulePath::root(), &decl);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "duplicate")]
    fn test_assert_decl_rejects_duplicate_name() {
        let decl = ModuleDecl::new()
            .getter("g", |_| Value::Null)
            .getter("g", |_| Value::Null);
        assert_decl(&ModulePath::root(), &decl);
    }
}
