// SPDX-License-Identifier: MIT

//! Activity module - named units of work a flow executes
//!
//! An `Activity` pairs a name (used only in logs) with a body implementing
//! `Work`. Bodies mutate the context they are handed, typically by moving it
//! to the next state. Bodies can be:
//! - async closures returning a boxed future (`Activity::new`)
//! - plain closures (`Activity::from_fn`)
//! - any type implementing `Work` (`Activity::from_work`)

use crate::error::{ActivityResult, ConfigurationError};
use crate::flow::{FlowContext, StateSet};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// Body of an activity
#[async_trait]
pub trait Work<S: StateSet>: Send + Sync {
    /// Perform the work against the context
    async fn run(&self, context: &mut FlowContext<S>) -> ActivityResult;
}

type AsyncBody<S> =
    dyn for<'a> Fn(&'a mut FlowContext<S>) -> BoxFuture<'a, ActivityResult> + Send + Sync;

struct AsyncFnWork<S: StateSet> {
    body: Box<AsyncBody<S>>,
}

#[async_trait]
impl<S: StateSet> Work<S> for AsyncFnWork<S> {
    async fn run(&self, context: &mut FlowContext<S>) -> ActivityResult {
        (self.body)(context).await
    }
}

struct FnWork<F> {
    body: F,
}

#[async_trait]
impl<S, F> Work<S> for FnWork<F>
where
    S: StateSet,
    F: Fn(&mut FlowContext<S>) -> ActivityResult + Send + Sync,
{
    async fn run(&self, context: &mut FlowContext<S>) -> ActivityResult {
        (self.body)(context)
    }
}

/// A named unit of work
pub struct Activity<S: StateSet> {
    name: String,
    body: Option<Arc<dyn Work<S>>>,
}

impl<S: StateSet> Activity<S> {
    /// Create an activity from an async closure.
    ///
    /// ```
    /// use flowstep::{Activity, FlowContext};
    ///
    /// flowstep::flow_states! {
    ///     enum Job { Start, End }
    ///     start = Start;
    ///     end = End;
    /// }
    ///
    /// let finish = Activity::new("finish", |ctx: &mut FlowContext<Job>| {
    ///     Box::pin(async move {
    ///         ctx.set_state(Job::End);
    ///         Ok(())
    ///     })
    /// });
    /// assert_eq!(finish.name(), "finish");
    /// ```
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: for<'a> Fn(&'a mut FlowContext<S>) -> BoxFuture<'a, ActivityResult>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            body: Some(Arc::new(AsyncFnWork {
                body: Box::new(body),
            })),
        }
    }

    /// Create an activity from a synchronous closure
    pub fn from_fn<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut FlowContext<S>) -> ActivityResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            body: Some(Arc::new(FnWork { body })),
        }
    }

    pub fn from_work(name: impl Into<String>, work: Arc<dyn Work<S>>) -> Self {
        Self {
            name: name.into(),
            body: Some(work),
        }
    }

    /// An activity without a body; executing it is a configuration error
    pub fn unimplemented(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the body against `context`, waiting for it to finish.
    /// Failures from the body are returned unchanged.
    pub async fn execute(&self, context: &mut FlowContext<S>) -> ActivityResult {
        match &self.body {
            Some(work) => work.run(context).await,
            None => {
                log::warn!("No implementation for activity '{}'", self.name);
                Err(ConfigurationError::MissingImplementation {
                    activity: self.name.clone(),
                }
                .into())
            }
        }
    }
}

impl<S: StateSet> fmt::Debug for Activity<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Activity")
            .field("name", &self.name)
            .field("implemented", &self.body.is_some())
            .finish()
    }
}
