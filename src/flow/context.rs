// SPDX-License-Identifier: MIT

//! Mutable carrier of the current workflow state

use super::states::StateSet;
use super::store::Store;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Current state plus the auxiliary data activities work with.
///
/// Cloning copies the current state and the store, and shares the globals.
/// History snapshots rely on this so later mutation of the live context never
/// reaches a recorded snapshot.
#[derive(Clone)]
pub struct FlowContext<S: StateSet> {
    current: S,
    store: Store,
    globals: Option<Arc<dyn Any + Send + Sync>>,
}

impl<S: StateSet> FlowContext<S> {
    /// Create a context positioned at `S::START`
    pub fn new() -> Self {
        Self {
            current: S::START,
            store: Store::new(),
            globals: None,
        }
    }

    pub fn with_store(mut self, store: Store) -> Self {
        self.store = store;
        self
    }

    /// Attach process-scoped read-only data, retrievable with [`FlowContext::globals`]
    pub fn with_globals<G: Any + Send + Sync>(mut self, globals: Arc<G>) -> Self {
        self.globals = Some(globals as Arc<dyn Any + Send + Sync>);
        self
    }

    pub fn state(&self) -> S {
        self.current
    }

    /// Move to `state`. Membership in the state set is guaranteed by the type.
    pub fn set_state(&mut self, state: S) {
        self.current = state;
    }

    pub fn states(&self) -> &'static [S] {
        S::all()
    }

    pub fn is_end(&self) -> bool {
        self.current.is_end()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// Globals downcast to `G`, if present and of that type
    pub fn globals<G: Any + Send + Sync>(&self) -> Option<&G> {
        self.globals.as_deref()?.downcast_ref::<G>()
    }
}

impl<S: StateSet> Default for FlowContext<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateSet> fmt::Debug for FlowContext<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowContext")
            .field("current", &self.current)
            .field("store", &self.store)
            .field("globals", &self.globals.is_some())
            .finish()
    }
}
