// SPDX-License-Identifier: MIT

//! Lifecycle events emitted by a flow

use super::engine::Flow;
use super::states::StateSet;
use crate::error::FlowError;
use std::collections::HashMap;
use std::sync::Arc;

/// Names handlers subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ContextChanged,
    Success,
    Failure,
    Error,
    Complete,
}

/// Event payload handed to handlers alongside the emitting flow
#[derive(Debug, Clone, Copy)]
pub enum FlowEvent<'a> {
    /// A new context was bound
    ContextChanged,
    /// The context reached its terminal state
    Success,
    /// Retries were exhausted
    Failure,
    /// A non-retryable failure, carrying the original error
    Error(&'a FlowError),
    /// Fires once per terminal run, after `Success`, `Failure` or `Error`
    Complete,
}

impl FlowEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            FlowEvent::ContextChanged => EventKind::ContextChanged,
            FlowEvent::Success => EventKind::Success,
            FlowEvent::Failure => EventKind::Failure,
            FlowEvent::Error(_) => EventKind::Error,
            FlowEvent::Complete => EventKind::Complete,
        }
    }
}

pub type Handler<S> = Arc<dyn Fn(&FlowEvent<'_>, &Flow<S>) + Send + Sync>;

/// Registered handlers, invoked synchronously in registration order
pub struct Listeners<S: StateSet> {
    handlers: HashMap<EventKind, Vec<Handler<S>>>,
}

impl<S: StateSet> Listeners<S> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn add(&mut self, kind: EventKind, handler: Handler<S>) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    pub fn emit(&self, event: &FlowEvent<'_>, flow: &Flow<S>) {
        if let Some(handlers) = self.handlers.get(&event.kind()) {
            for handler in handlers {
                handler(event, flow);
            }
        }
    }
}

impl<S: StateSet> Default for Listeners<S> {
    fn default() -> Self {
        Self::new()
    }
}
