//! The module tree: registration, lookup, namespace derivation, hot update.
//!
//! The tree owns [`Module`] nodes as a whole. Lookup is always by
//! [`ModulePath`]; the namespace string for a path concatenates `key + "/"`
//! for every node along it whose `namespaced` flag is set; any ancestor's
//! flag independently contributes its own segment, so this is not simply
//! "is the leaf namespaced".

use tracing::warn;

use crate::decl::ModuleDecl;
use crate::error::StoreError;
use crate::module::{Module, ModulePath};

/// Owns the module graph of one container.
pub struct ModuleTree {
    root: Module,
}

impl ModuleTree {
    /// Build a tree from a raw root declaration, registering every nested
    /// sub-module along the way.
    pub fn new(root_decl: ModuleDecl) -> Self {
        let mut tree = Self {
            root: Module::new(ModuleDecl::new(), false),
        };
        // Root registration cannot fail: there is no parent to look up.
        if let Err(e) = tree.register(&ModulePath::root(), root_decl, false) {
            warn!(error = %e, "root registration failed below a replaced subtree");
        }
        tree
    }

    pub fn root(&self) -> &Module {
        &self.root
    }

    /// Walk `path` from the root. `None` means a segment is missing; callers
    /// treat that as a fatal path-not-found condition.
    pub fn get(&self, path: &ModulePath) -> Option<&Module> {
        path.segments()
            .iter()
            .try_fold(&self.root, |module, key| module.child(key))
    }

    fn get_mut(&mut self, path: &ModulePath) -> Option<&mut Module> {
        path.segments()
            .iter()
            .try_fold(&mut self.root, |module, key| module.child_mut(key))
    }

    /// Derive the namespace string for `path` per the ancestor-inclusive
    /// concatenation rule. Empty string when no node along the path is
    /// namespaced.
    pub fn get_namespace(&self, path: &ModulePath) -> Result<String, StoreError> {
        let mut module = &self.root;
        let mut namespace = String::new();
        for key in path.segments() {
            module = module.child(key).ok_or_else(|| StoreError::PathNotFound {
                path: path.to_string(),
            })?;
            if module.namespaced() {
                namespace.push_str(key);
                namespace.push('/');
            }
        }
        Ok(namespace)
    }

    /// Register a declaration at `path` (the root when `path` is empty),
    /// then recurse into its nested sub-module declarations.
    ///
    /// Fails when the parent path does not resolve to an existing node.
    /// Registering over an existing child replaces it, with a warning.
    pub fn register(
        &mut self,
        path: &ModulePath,
        decl: ModuleDecl,
        runtime: bool,
    ) -> Result<(), StoreError> {
        #[cfg(debug_assertions)]
        crate::decl::assert_decl(path, &decl);

        let nested = decl.modules.clone();
        let module = Module::new(decl, runtime);

        if path.is_root() {
            self.root = module;
        } else {
            let parent_path = path.parent();
            let parent = self
                .get_mut(&parent_path)
                .ok_or_else(|| StoreError::PathNotFound {
                    path: parent_path.to_string(),
                })?;
            if let Some(key) = path.last() {
                if parent.add_child(key, module) {
                    warn!(module = %path, "replacing an existing module registration");
                }
            }
        }

        for (key, child_decl) in nested {
            self.register(&path.child(&key), child_decl, runtime)?;
        }
        Ok(())
    }

    /// Remove the child at `path` from its parent. Refused for modules that
    /// were not registered at runtime. Does not touch spliced state; that is
    /// the container's job.
    pub fn unregister(&mut self, path: &ModulePath) -> Result<(), StoreError> {
        let not_found = || StoreError::PathNotFound {
            path: path.to_string(),
        };
        let key = path.last().ok_or(StoreError::RootPath)?.to_string();
        let parent = self.get_mut(&path.parent()).ok_or_else(not_found)?;
        let child = parent.child(&key).ok_or_else(not_found)?;
        if !child.runtime() {
            return Err(StoreError::StaticModule {
                path: path.to_string(),
            });
        }
        parent.remove_child(&key);
        Ok(())
    }

    /// Recursively swap handler definitions across the existing tree without
    /// discarding spliced state. A child key in the new declaration that has
    /// no existing node logs a warning and aborts the recursion below that
    /// point; hot update never creates structure.
    pub fn update(&mut self, new_root: ModuleDecl) {
        update_recursive(&ModulePath::root(), &mut self.root, &new_root);
    }
}

fn update_recursive(path: &ModulePath, target: &mut Module, decl: &ModuleDecl) {
    #[cfg(debug_assertions)]
    crate::decl::assert_decl(path, decl);

    target.update(decl);

    for (key, child_decl) in &decl.modules {
        let child_path = path.child(key);
        match target.child_mut(key) {
            Some(child) => update_recursive(&child_path, child, child_decl),
            None => {
                warn!(
                    module = %child_path,
                    "trying to add a new module on hot reloading; manual reload is needed"
                );
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn counter() -> ModuleDecl {
        ModuleDecl::new()
            .with_state(json!({"count": 0}))
            .mutation("increment", |state, payload| {
                let n = payload.and_then(Value::as_i64).unwrap_or(1);
                state["count"] = json!(state["count"].as_i64().unwrap_or(0) + n);
            })
    }

    #[test]
    fn test_get_after_register_returns_declared_state() {
        let mut tree = ModuleTree::new(counter());
        tree.register(
            &ModulePath::from("a"),
            ModuleDecl::new().with_state(json!({"flag": true})),
            true,
        )
        .unwrap();

        let module = tree.get(&ModulePath::from("a")).unwrap();
        assert_eq!(module.state(), &json!({"flag": true}));
    }

    #[test]
    fn test_register_nested_declarations() {
        let tree = ModuleTree::new(
            ModuleDecl::new().module(
                "a",
                ModuleDecl::new()
                    .with_state(json!({"inner": 1}))
                    .module("b", ModuleDecl::new().with_state(json!({"leaf": 2}))),
            ),
        );
        assert!(tree.get(&ModulePath::from(["a", "b"])).is_some());
        assert_eq!(
            tree.get(&ModulePath::from(["a", "b"])).unwrap().state(),
            &json!({"leaf": 2})
        );
    }

    #[test]
    fn test_register_fails_for_missing_parent() {
        let mut tree = ModuleTree::new(ModuleDecl::new());
        let err = tree
            .register(&ModulePath::from(["no", "such"]), ModuleDecl::new(), true)
            .unwrap_err();
        assert!(matches!(err, StoreError::PathNotFound { .. }));
    }

    #[test]
    fn test_namespace_concatenates_only_flagged_ancestors() {
        let tree = ModuleTree::new(
            ModuleDecl::new().module(
                "a",
                ModuleDecl::new().namespaced(true).module(
                    "b",
                    // Not namespaced: contributes nothing even though its
                    // child is namespaced.
                    ModuleDecl::new()
                        .module("c", ModuleDecl::new().namespaced(true)),
                ),
            ),
        );
        assert_eq!(tree.get_namespace(&ModulePath::root()).unwrap(), "");
        assert_eq!(tree.get_namespace(&ModulePath::from("a")).unwrap(), "a/");
        assert_eq!(
            tree.get_namespace(&ModulePath::from(["a", "b"])).unwrap(),
            "a/"
        );
        assert_eq!(
            tree.get_namespace(&ModulePath::from(["a", "b", "c"])).unwrap(),
            "a/c/"
        );
    }

    #[test]
    fn test_unregister_refuses_static_modules() {
        let mut tree = ModuleTree::new(ModuleDecl::new().module("a", ModuleDecl::new()));
        let err = tree.unregister(&ModulePath::from("a")).unwrap_err();
        assert!(matches!(err, StoreError::StaticModule { .. }));
        assert!(tree.get(&ModulePath::from("a")).is_some());
    }

    #[test]
    fn test_unregister_removes_runtime_modules() {
        let mut tree = ModuleTree::new(ModuleDecl::new());
        tree.register(&ModulePath::from("a"), ModuleDecl::new(), true)
            .unwrap();
        tree.unregister(&ModulePath::from("a")).unwrap();
        assert!(tree.get(&ModulePath::from("a")).is_none());
    }

    #[test]
    fn test_update_swaps_handlers_and_keeps_structure() {
        let mut tree = ModuleTree::new(
            ModuleDecl::new()
                .module("a", counter())
                .mutation("reset", |_, _| {}),
        );
        tree.update(
            ModuleDecl::new()
                .mutation("reset2", |_, _| {})
                .module("a", counter().namespaced(true)),
        );
        assert!(tree.get(&ModulePath::from("a")).unwrap().namespaced());
        assert_eq!(tree.get_namespace(&ModulePath::from("a")).unwrap(), "a/");
    }

    #[test]
    fn test_update_refuses_unknown_child_key() {
        let mut tree = ModuleTree::new(ModuleDecl::new().module("a", counter()));
        tree.update(
            ModuleDecl::new()
                .module("a", counter())
                .module("brand_new", ModuleDecl::new()),
        );
        // Structure is unchanged beneath the refused key.
        assert!(tree.get(&ModulePath::from("brand_new")).is_none());
        assert!(tree.get(&ModulePath::from("a")).is_some());
    }
}
