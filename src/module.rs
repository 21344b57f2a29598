//! Module tree nodes and path arithmetic.
//!
//! A [`ModulePath`] is the ordered sequence of local keys from the root; the
//! empty path denotes the root itself. All path arithmetic, parent/child
//! derivation and nested-state resolution, is centralized here so the
//! installer and the routing layer never hand-roll traversal.

use std::fmt;

use serde_json::Value;
use smallvec::SmallVec;

use crate::decl::{ActionDecl, ModuleDecl};
use crate::core::{GetterFn, MutationFn};

/// An ordered sequence of local module keys, rooted at the container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ModulePath(SmallVec<[String; 4]>);

impl ModulePath {
    /// The empty path, denoting the root module.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The final segment, `None` for the root.
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// This path extended with one more key.
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(key.to_string());
        Self(segments)
    }

    /// The path with the final segment removed; the root is its own parent.
    pub fn parent(&self) -> Self {
        let mut segments = self.0.clone();
        segments.pop();
        Self(segments)
    }

    /// Resolve this path against a nested state tree.
    pub(crate) fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(root, |state, key| state.get(key))
    }

    /// Mutable variant of [`resolve`](Self::resolve).
    pub(crate) fn resolve_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        self.0
            .iter()
            .try_fold(root, |state, key| state.get_mut(key))
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0.join("/"))
        }
    }
}

impl From<&str> for ModulePath {
    /// A single local key. Slashes are not split; a path with several
    /// segments is built from a slice or array.
    fn from(key: &str) -> Self {
        Self(SmallVec::from_iter([key.to_string()]))
    }
}

impl From<String> for ModulePath {
    fn from(key: String) -> Self {
        Self(SmallVec::from_iter([key]))
    }
}

impl From<Vec<String>> for ModulePath {
    fn from(segments: Vec<String>) -> Self {
        Self(SmallVec::from_vec(segments))
    }
}

impl From<&[&str]> for ModulePath {
    fn from(segments: &[&str]) -> Self {
        Self(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ModulePath {
    fn from(segments: [&str; N]) -> Self {
        Self(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl FromIterator<String> for ModulePath {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One node of the module tree.
///
/// Owns the initial state slice (created once at registration), the retained
/// raw declaration, and the children. The state value spliced into the root
/// tree at install time is the live copy; this node's `state` is only read
/// again if the module is re-spliced.
pub struct Module {
    state: Value,
    runtime: bool,
    decl: ModuleDecl,
    children: Vec<(String, Module)>,
}

impl Module {
    pub(crate) fn new(decl: ModuleDecl, runtime: bool) -> Self {
        Self {
            state: decl.state.materialize(),
            runtime,
            decl,
            children: Vec::new(),
        }
    }

    /// Whether this node's types are prefixed with its key.
    pub fn namespaced(&self) -> bool {
        self.decl.namespaced
    }

    /// True if the module was registered dynamically after construction.
    pub fn runtime(&self) -> bool {
        self.runtime
    }

    /// The state slice created at registration.
    pub fn state(&self) -> &Value {
        &self.state
    }

    pub fn child(&self, key: &str) -> Option<&Module> {
        self.children
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, m)| m)
    }

    pub(crate) fn child_mut(&mut self, key: &str) -> Option<&mut Module> {
        self.children
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, m)| m)
    }

    /// Attach a child, replacing any existing entry under the same key.
    /// Returns true if a child was replaced.
    pub(crate) fn add_child(&mut self, key: &str, module: Module) -> bool {
        if let Some(slot) = self.child_mut(key) {
            *slot = module;
            true
        } else {
            self.children.push((key.to_string(), module));
            false
        }
    }

    pub(crate) fn remove_child(&mut self, key: &str) -> Option<Module> {
        let idx = self.children.iter().position(|(k, _)| k == key)?;
        Some(self.children.remove(idx).1)
    }

    /// Swap handler definitions and the namespacing flag in place, keeping
    /// the already-created state and the children untouched.
    pub(crate) fn update(&mut self, decl: &ModuleDecl) {
        self.decl.namespaced = decl.namespaced;
        self.decl.mutations = decl.mutations.clone();
        self.decl.actions = decl.actions.clone();
        self.decl.getters = decl.getters.clone();
    }

    pub(crate) fn children(&self) -> impl Iterator<Item = (&str, &Module)> {
        self.children.iter().map(|(k, m)| (k.as_str(), m))
    }

    pub(crate) fn mutations(
        &self,
    ) -> impl Iterator<Item = (&str, &std::sync::Arc<MutationFn>)> {
        self.decl.mutations.iter().map(|(k, h)| (k.as_str(), h))
    }

    pub(crate) fn actions(&self) -> impl Iterator<Item = (&str, &ActionDecl)> {
        self.decl.actions.iter().map(|(k, a)| (k.as_str(), a))
    }

    pub(crate) fn getters(&self) -> impl Iterator<Item = (&str, &std::sync::Arc<GetterFn>)> {
        self.decl.getters.iter().map(|(k, g)| (k.as_str(), g))
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("namespaced", &self.namespaced())
            .field("runtime", &self.runtime)
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_child_and_parent() {
        let p = ModulePath::root().child("a").child("b");
        assert_eq!(p.segments(), ["a", "b"]);
        assert_eq!(p.parent().segments(), ["a"]);
        assert_eq!(p.last(), Some("b"));
        assert!(ModulePath::root().parent().is_root());
    }

    #[test]
    fn test_path_from_array() {
        let p = ModulePath::from(["a", "b"]);
        assert_eq!(p.segments(), ["a", "b"]);
    }

    #[test]
    fn test_path_from_str_is_single_segment() {
        // Mirrors string-path registration: no slash splitting.
        let p = ModulePath::from("a/b");
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn test_resolve_nested_state() {
        let root = json!({"a": {"b": {"count": 3}}});
        let p = ModulePath::from(["a", "b"]);
        assert_eq!(p.resolve(&root), Some(&json!({"count": 3})));
        assert_eq!(ModulePath::root().resolve(&root), Some(&root));
        assert_eq!(ModulePath::from("missing").resolve(&root), None);
    }

    #[test]
    fn test_resolve_mut_writes_through() {
        let mut root = json!({"a": {"count": 0}});
        let p = ModulePath::from("a");
        if let Some(slice) = p.resolve_mut(&mut root) {
            slice["count"] = json!(7);
        }
        assert_eq!(root["a"]["count"], json!(7));
    }

    #[test]
    fn test_module_state_created_at_registration() {
        let decl = ModuleDecl::new().with_state(json!({"n": 1}));
        let module = Module::new(decl, false);
        assert_eq!(module.state(), &json!({"n": 1}));
    }

    #[test]
    fn test_add_child_replaces_existing() {
        let mut parent = Module::new(ModuleDecl::new(), false);
        assert!(!parent.add_child("a", Module::new(ModuleDecl::new(), false)));
        assert!(parent.add_child(
            "a",
            Module::new(ModuleDecl::new().with_state(json!({"x": 1})), true)
        ));
        assert_eq!(parent.child("a").map(Module::runtime), Some(true));
    }

    #[test]
    fn test_update_swaps_handlers_but_keeps_state() {
        let mut module = Module::new(
            ModuleDecl::new()
                .with_state(json!({"n": 1}))
                .mutation("old", |_, _| {}),
            false,
        );
        module.update(
            &ModuleDecl::new()
                .namespaced(true)
                .with_state(json!({"n": 999}))
                .mutation("new", |_, _| {}),
        );
        assert!(module.namespaced());
        assert_eq!(module.mutations().map(|(k, _)| k).collect::<Vec<_>>(), ["new"]);
        // State persists across update.
        assert_eq!(module.state(), &json!({"n": 1}));
    }
}
