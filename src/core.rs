//! Shared handler types, payloads, and call normalization.
//!
//! # Overview
//!
//! Trellis separates **writes** from **work**:
//! - [`MutationFn`] = synchronous state writes (the only sanctioned way to
//!   change state)
//! - [`ActionFn`] = asynchronous work that commits mutations through its
//!   local context
//! - [`GetterFn`] = derived values computed from local and root state
//!
//! All three are registered by name on a module declaration and addressed at
//! runtime by a fully-qualified type string (`namespace + local name`).
//!
//! # Call styles
//!
//! `commit` and `dispatch` accept either `(type, payload)` or a single
//! object-style value whose `"type"` field names the handler. Both forms
//! normalize through [`unify_object_style`] to the same internal call.

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;

use crate::context::{ActionContext, Getters, LocalGetters};
use crate::store::Store;

/// Synchronous mutation handler: receives the owning module's live state
/// slice and the commit payload.
pub type MutationFn = dyn Fn(&mut Value, Option<&Value>) + Send + Sync;

/// Asynchronous action handler: receives a namespace-scoped context and the
/// dispatch payload, and settles with a result value.
pub type ActionFn =
    dyn Fn(ActionContext, Option<Value>) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync;

/// Derived-value handler: computes a value from the scope in [`GetterScope`].
pub type GetterFn = dyn Fn(GetterScope<'_>) -> Value + Send + Sync;

/// Commit subscriber: invoked after every successful commit with the
/// mutation record and a snapshot of the root state.
pub type SubscriberFn = dyn Fn(&MutationRecord, &Value) + Send + Sync;

/// Action subscriber: invoked before any action handler runs.
pub type ActionSubscriberFn = dyn Fn(&ActionRecord, &Value) + Send + Sync;

/// Store plugin, applied once at construction in registration order.
pub type Plugin = Box<dyn FnOnce(&Store) + Send>;

/// The four arguments a getter is evaluated with.
///
/// `state` and `getters` are scoped to the owning module's namespace;
/// `root_state` and `root_getters` see the whole container.
pub struct GetterScope<'a> {
    /// The owning module's state slice.
    pub state: &'a Value,
    /// Getters visible under the owning module's namespace, re-keyed with
    /// the prefix stripped.
    pub getters: &'a LocalGetters,
    /// The full root state tree.
    pub root_state: &'a Value,
    /// The container-wide getters view.
    pub root_getters: &'a Getters,
}

/// An optional commit/dispatch payload.
///
/// Wraps `Option<Value>` so call sites can pass a bare `Value`, an
/// `Option<Value>`, or `()` for payload-less calls.
#[derive(Debug, Clone, Default)]
pub struct Payload(Option<Value>);

impl Payload {
    pub fn into_inner(self) -> Option<Value> {
        self.0
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload(Some(value))
    }
}

impl From<Option<Value>> for Payload {
    fn from(value: Option<Value>) -> Self {
        Payload(value)
    }
}

impl From<()> for Payload {
    fn from(_: ()) -> Self {
        Payload(None)
    }
}

/// A committed mutation, as seen by subscribers and debug hooks.
#[derive(Debug, Clone, Serialize)]
pub struct MutationRecord {
    /// Fully-qualified mutation type.
    #[serde(rename = "type")]
    pub ty: String,
    /// The payload the mutation was committed with.
    pub payload: Option<Value>,
}

/// A dispatched action, as seen by action subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct ActionRecord {
    /// Fully-qualified action type.
    #[serde(rename = "type")]
    pub ty: String,
    /// The payload the action was dispatched with.
    pub payload: Option<Value>,
}

/// Options for `commit`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitOptions {
    /// From a namespaced local context: target the bare type at the root
    /// instead of prefixing the local namespace.
    pub root: bool,
    /// Removed option, kept for source compatibility; logs a warning.
    pub silent: bool,
}

/// Options for `dispatch`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchOptions {
    /// From a namespaced local context: target the bare type at the root
    /// instead of prefixing the local namespace.
    pub root: bool,
}

/// Options for dynamic module registration.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterOptions {
    /// Keep whatever state is already spliced at the target path instead of
    /// splicing the module's own initial state (used when rehydrating from a
    /// serialized snapshot).
    pub preserve_state: bool,
}

/// Options for `watch`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WatchOptions {
    /// Invoke the callback synchronously at the moment of change instead of
    /// deferring it to the next idle tick.
    pub sync: bool,
}

/// Normalize an object-style call (`{"type": "...", ...}`) into a
/// `(type, payload)` pair. The whole object is the payload, matching the
/// tuple form where the payload carries its own fields.
///
/// Returns `None` when the object has no string `"type"` field.
pub(crate) fn unify_object_style(obj: Value) -> Option<(String, Payload)> {
    let ty = obj.get("type")?.as_str()?.to_string();
    Some((ty, Payload::from(obj)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_from_value() {
        let p: Payload = json!({"n": 1}).into();
        assert_eq!(p.into_inner(), Some(json!({"n": 1})));
    }

    #[test]
    fn test_payload_from_unit_is_empty() {
        let p: Payload = ().into();
        assert!(p.into_inner().is_none());
    }

    #[test]
    fn test_unify_object_style_extracts_type() {
        let (ty, payload) = unify_object_style(json!({"type": "increment", "amount": 5})).unwrap();
        assert_eq!(ty, "increment");
        // The whole object is the payload, "type" field included.
        assert_eq!(
            payload.into_inner(),
            Some(json!({"type": "increment", "amount": 5}))
        );
    }

    #[test]
    fn test_unify_object_style_rejects_missing_type() {
        assert!(unify_object_style(json!({"amount": 5})).is_none());
    }

    #[test]
    fn test_unify_object_style_rejects_non_string_type() {
        assert!(unify_object_style(json!({"type": 42})).is_none());
    }

    #[test]
    fn test_mutation_record_serializes_with_type_key() {
        let record = MutationRecord {
            ty: "a/increment".into(),
            payload: Some(json!(1)),
        };
        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(v, json!({"type": "a/increment", "payload": 1}));
    }
}
