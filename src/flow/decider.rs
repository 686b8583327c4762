// SPDX-License-Identifier: MIT

//! Decider - maps the current context to the next activity

use super::context::FlowContext;
use super::states::StateSet;
use crate::activity::Activity;
use std::collections::HashMap;
use std::sync::Arc;

type DecideFn<S> = dyn Fn(&FlowContext<S>) -> Option<Arc<Activity<S>>> + Send + Sync;

/// Pure mapping from context to the activity to run next.
///
/// Returning `None` for a non-terminal state is a configuration error the
/// engine reports through its `error` event.
#[derive(Clone)]
pub struct Decider<S: StateSet> {
    decide_fn: Arc<DecideFn<S>>,
}

impl<S: StateSet> Decider<S> {
    pub fn new<F>(decide_fn: F) -> Self
    where
        F: Fn(&FlowContext<S>) -> Option<Arc<Activity<S>>> + Send + Sync + 'static,
    {
        Self {
            decide_fn: Arc::new(decide_fn),
        }
    }

    /// Build a decider that looks the current state up in a table
    pub fn from_table(table: HashMap<S, Arc<Activity<S>>>) -> Self {
        Self::new(move |context| table.get(&context.state()).cloned())
    }

    pub fn decide(&self, context: &FlowContext<S>) -> Option<Arc<Activity<S>>> {
        (self.decide_fn)(context)
    }
}

impl<S: StateSet> Default for Decider<S> {
    /// Decider that never selects an activity
    fn default() -> Self {
        Self::new(|_| None)
    }
}
