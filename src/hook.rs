//! Debug hook: the devtools attachment point.
//!
//! Inspector panels and time-travel debuggers attach here as passive
//! observers; the core never depends on them. The hook is told about every
//! committed mutation (after subscribers) and about every action handler
//! rejection. The rejection still propagates to the dispatch caller, it is
//! never swallowed.

use serde_json::Value;

use crate::core::MutationRecord;
use crate::store::Store;

/// Boundary observer for developer tooling.
///
/// All methods have no-op defaults; implement only what the tool needs.
pub trait DebugHook: Send + Sync {
    /// Called once at construction, after plugins have been applied.
    fn init(&self, _store: &Store) {}

    /// Called after a commit's handlers and subscribers have run.
    fn on_mutation(&self, _mutation: &MutationRecord, _state: &Value) {}

    /// Called when an action handler rejects, before the rejection is
    /// returned to the dispatch caller.
    fn on_action_error(&self, _ty: &str, _error: &anyhow::Error) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoOpHook;
    impl DebugHook for NoOpHook {}

    #[test]
    fn test_default_methods_are_noops() {
        let hook = NoOpHook;
        hook.on_mutation(
            &MutationRecord {
                ty: "x".into(),
                payload: None,
            },
            &Value::Null,
        );
        hook.on_action_error("x", &anyhow::anyhow!("boom"));
    }
}
