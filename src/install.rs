//! Routing table construction: walking the module tree and wiring every
//! handler into a fresh table.
//!
//! Installation is wholesale. Any structural change (dynamic registration,
//! unregistration, hot update) rebuilds the whole table from the current
//! tree and the container swaps the finished snapshot in atomically; there
//! is no incremental patching of a live table. The `hot` flag separates
//! first installation (which also splices each module's initial state into
//! its parent slice) from rebuilds over state that already exists.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::error;

use crate::module::{Module, ModulePath};
use crate::routing::{ActionEntry, GetterEntry, MutationEntry, RoutingTable};
use crate::store::Store;
use crate::tree::ModuleTree;

/// Install `module` (and, recursively, its children) into `table`.
///
/// On first installation (`hot == false`) every non-root module's initial
/// state is spliced into its parent slice under the module's key, through
/// the commit guard so strict mode stays quiet. Rebuilds skip the splice
/// and only re-register handlers.
pub(crate) fn install_module(
    store: &Store,
    tree: &ModuleTree,
    table: &mut RoutingTable,
    path: &ModulePath,
    module: &Module,
    hot: bool,
) {
    let namespace = match tree.get_namespace(path) {
        Ok(ns) => ns,
        Err(err) => {
            error!(module = %path, error = %err, "cannot derive namespace; module skipped");
            return;
        }
    };

    if module.namespaced() {
        if table.namespace_map.contains_key(&namespace) {
            error!(
                namespace = %namespace,
                module = %path,
                "duplicate namespace for modules"
            );
        }
        table.namespace_map.insert(namespace.clone(), path.clone());
    }

    if !path.is_root() && !hot {
        splice_state(store, path, module.state().clone());
    }

    for (name, handler) in module.mutations() {
        table.add_mutation(
            format!("{namespace}{name}"),
            MutationEntry {
                path: path.clone(),
                handler: Arc::clone(handler),
            },
        );
    }

    for (name, decl) in module.actions() {
        let ty = if decl.bypasses_namespace() {
            name.to_string()
        } else {
            format!("{namespace}{name}")
        };
        table.add_action(
            ty,
            ActionEntry {
                path: path.clone(),
                namespace: namespace.clone(),
                handler: Arc::clone(decl.handler()),
            },
        );
    }

    for (name, getter) in module.getters() {
        table.add_getter(
            format!("{namespace}{name}"),
            GetterEntry {
                path: path.clone(),
                namespace: namespace.clone(),
                getter: Arc::clone(getter),
                cache: Mutex::new(None),
            },
        );
    }

    for (key, child) in module.children() {
        install_module(store, tree, table, &path.child(key), child, hot);
    }
}

/// Write `value` into the root state tree at `path`, under the commit guard.
pub(crate) fn splice_state(store: &Store, path: &ModulePath, value: Value) {
    let parent = path.parent();
    let Some(key) = path.last().map(str::to_string) else {
        return;
    };
    store.with_commit(|| {
        store.state_binding().write(|root| {
            match parent.resolve_mut(root) {
                Some(Value::Object(map)) => {
                    map.insert(key, value);
                }
                _ => error!(
                    module = %path,
                    "cannot splice module state; parent slice is not an object"
                ),
            }
        });
    });
}

/// Assemble a module subtree's initial state, nesting each child's state
/// under its key. Used when splicing a dynamically registered subtree in
/// one write.
pub(crate) fn subtree_state(module: &Module) -> Value {
    let mut value = module.state().clone();
    for (key, child) in module.children() {
        match &mut value {
            Value::Object(map) => {
                map.insert(key.to_string(), subtree_state(child));
            }
            _ => {
                error!(key = %key, "cannot nest child state; module state is not an object");
            }
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::ModuleDecl;
    use serde_json::json;

    #[test]
    fn test_namespaced_root_enters_namespace_map() {
        let store = crate::store::StoreBuilder::new(ModuleDecl::new()).build();
        let tree = ModuleTree::new(ModuleDecl::new().namespaced(true));
        let mut table = RoutingTable::default();
        install_module(
            &store,
            &tree,
            &mut table,
            &ModulePath::root(),
            tree.root(),
            true,
        );
        // The root's namespace is the empty string; it is indexed like any
        // other namespaced module.
        assert_eq!(table.namespace_path(""), Some(&ModulePath::root()));
    }

    #[test]
    fn test_subtree_state_nests_children() {
        let decl = ModuleDecl::new()
            .with_state(json!({"n": 1}))
            .module("a", ModuleDecl::new().with_state(json!({"x": true})))
            .module(
                "b",
                ModuleDecl::new()
                    .with_state(json!({}))
                    .module("c", ModuleDecl::new().with_state(json!({"deep": 3}))),
            );
        let tree = ModuleTree::new(decl);
        assert_eq!(
            subtree_state(tree.root()),
            json!({
                "n": 1,
                "a": {"x": true},
                "b": {"c": {"deep": 3}},
            })
        );
    }
}
