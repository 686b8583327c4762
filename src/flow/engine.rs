// SPDX-License-Identifier: MIT

//! Flow engine - drives decide → execute steps until the context reaches `END`

use super::context::FlowContext;
use super::decider::Decider;
use super::events::{EventKind, FlowEvent, Listeners};
use super::history::{FlowStatus, HistoryRecord};
use super::states::StateSet;
use crate::config::FlowConfig;
use crate::error::{ActivityResult, ConfigurationError};
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_RETRY_LIMIT: u32 = 3;

/// Construction options for a [`Flow`]
pub struct FlowOptions<S: StateSet> {
    pub decider: Decider<S>,
    pub context: FlowContext<S>,
    pub retry_limit: u32,
}

impl<S: StateSet> Default for FlowOptions<S> {
    fn default() -> Self {
        Self {
            decider: Decider::default(),
            context: FlowContext::new(),
            retry_limit: DEFAULT_RETRY_LIMIT,
        }
    }
}

/// The orchestration engine.
///
/// Each `step` records a snapshot into the history, asks the decider for the
/// next activity and executes it. Failures never escape a step; they are
/// reported through the `failure`, `error` and `complete` events.
///
/// The retry counter is monotonic over a run: it is not reset by successful
/// steps, only by construction and by rewinding.
///
/// A flow has a single driver. `step`, `start`, `forward`, `backward` and
/// `replay` take `&mut self`, so two steps can never overlap.
pub struct Flow<S: StateSet> {
    run_id: Uuid,
    decider: Decider<S>,
    initial_context: FlowContext<S>,
    context: FlowContext<S>,
    retry_limit: u32,
    retry_count: u32,
    is_complete: bool,
    status: FlowStatus,
    history: Vec<HistoryRecord<S>>,
    last_error: Option<String>,
    listeners: Listeners<S>,
}

impl<S: StateSet> Flow<S> {
    pub fn new(decider: Decider<S>, context: FlowContext<S>) -> Self {
        Self::from_options(FlowOptions {
            decider,
            context,
            retry_limit: DEFAULT_RETRY_LIMIT,
        })
    }

    pub fn from_options(options: FlowOptions<S>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            decider: options.decider,
            initial_context: options.context.clone(),
            context: options.context,
            retry_limit: options.retry_limit,
            retry_count: 0,
            is_complete: false,
            status: FlowStatus::Idle,
            history: Vec::new(),
            last_error: None,
            listeners: Listeners::new(),
        }
    }

    pub fn from_config(decider: Decider<S>, context: FlowContext<S>, config: &FlowConfig) -> Self {
        Self::new(decider, context).with_retry_limit(config.retry_limit)
    }

    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    /// Subscribe to an event. Handlers run synchronously, in registration order.
    pub fn on<F>(&mut self, kind: EventKind, handler: F)
    where
        F: Fn(&FlowEvent<'_>, &Flow<S>) + Send + Sync + 'static,
    {
        self.listeners.add(kind, Arc::new(handler));
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn context(&self) -> &FlowContext<S> {
        &self.context
    }

    /// Mutable access to the live context, e.g. to seed the store. Emits nothing.
    pub fn context_mut(&mut self) -> &mut FlowContext<S> {
        &mut self.context
    }

    /// Bind a new context and emit `contextChanged`.
    ///
    /// Before the first step the new context also becomes the one `reset`
    /// returns to.
    pub fn set_context(&mut self, context: FlowContext<S>) {
        if self.history.is_empty() {
            self.initial_context = context.clone();
        }
        self.context = context;
        self.emit(&FlowEvent::ContextChanged);
    }

    pub fn current_retry(&self) -> u32 {
        self.retry_count
    }

    pub fn retry_limit(&self) -> u32 {
        self.retry_limit
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn status(&self) -> FlowStatus {
        self.status
    }

    pub fn history(&self) -> &[HistoryRecord<S>] {
        &self.history
    }

    /// Message of the failure that ended the run, if it ended in one
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Run one decide → execute step
    pub async fn step(&mut self) {
        self.history.push(HistoryRecord::capture(
            &self.context,
            self.retry_count,
            self.is_complete,
            self.status,
        ));

        let state = self.context.state();
        log::debug!("[{}] Stepping flow at {:?}", self.run_id, state);

        if state.is_end() {
            log::info!("[{}] Flow completed successfully", self.run_id);
            self.finish(FlowStatus::Succeeded, &FlowEvent::Success);
            return;
        }

        self.status = FlowStatus::Running;
        match self.execute_next(state).await {
            Ok(()) => {}
            Err(e) if e.is_retryable() => {
                self.retry_count += 1;
                if self.retry_count > self.retry_limit {
                    log::warn!(
                        "[{}] Exhausted {} retries, failing: {}",
                        self.run_id,
                        self.retry_limit,
                        e
                    );
                    self.last_error = Some(e.to_string());
                    self.finish(FlowStatus::Failed, &FlowEvent::Failure);
                } else {
                    log::info!(
                        "[{}] Retryable error thrown, retrying. Attempt: {}",
                        self.run_id,
                        self.retry_count
                    );
                }
            }
            Err(e) => {
                log::error!("[{}] Error thrown at {:?}, failing: {}", self.run_id, state, e);
                self.last_error = Some(e.to_string());
                self.finish(FlowStatus::Failed, &FlowEvent::Error(&e));
            }
        }
    }

    async fn execute_next(&mut self, state: S) -> ActivityResult {
        let activity = self
            .decider
            .decide(&self.context)
            .ok_or_else(|| ConfigurationError::NoActivity {
                state: format!("{:?}", state),
            })?;

        log::debug!("[{}] Starting activity {}", self.run_id, activity.name());
        activity.execute(&mut self.context).await?;
        log::debug!("[{}] Activity completed {}", self.run_id, activity.name());
        Ok(())
    }

    fn finish(&mut self, status: FlowStatus, outcome: &FlowEvent<'_>) {
        self.status = status;
        self.is_complete = true;
        self.emit(outcome);
        self.emit(&FlowEvent::Complete);
    }

    fn emit(&self, event: &FlowEvent<'_>) {
        self.listeners.emit(event, self);
    }

    /// Step until the run completes, optionally binding a new context first.
    /// Retry count and history carry over; call `reset` first for a clean run.
    pub async fn start(&mut self, context: Option<FlowContext<S>>) {
        if let Some(context) = context {
            self.set_context(context);
        }
        self.is_complete = false;

        log::info!("[{}] Starting flow at {:?}", self.run_id, self.context.state());
        while !self.is_complete {
            self.step().await;
        }
        log::info!("[{}] Flow complete: {:?}", self.run_id, self.status);
    }

    /// Rewind to the initial context with zero retries and an empty history
    pub fn reset(&mut self) {
        self.reset_to(0);
    }

    /// Rewind to the snapshot taken before step `step` (1-based) and drop it
    /// and every later record. Values outside `1..=history.len()` rewind to
    /// the initial context, like [`Flow::reset`].
    pub fn reset_to(&mut self, step: isize) {
        let index = match usize::try_from(step) {
            Ok(step) if step >= 1 && step <= self.history.len() => step - 1,
            _ => {
                log::debug!("[{}] Resetting flow to initial context", self.run_id);
                self.context = self.initial_context.clone();
                self.retry_count = 0;
                self.is_complete = false;
                self.status = FlowStatus::Idle;
                self.history.clear();
                self.last_error = None;
                self.run_id = Uuid::new_v4();
                return;
            }
        };

        log::debug!("[{}] Resetting flow to step {}", self.run_id, step);
        let record = self.history[index].clone();
        self.history.truncate(index);
        self.restore(record);
    }

    /// Execute up to `steps` more steps, stopping once the run completes
    pub async fn forward(&mut self, steps: usize) {
        for _ in 0..steps {
            if self.is_complete {
                break;
            }
            self.step().await;
        }
    }

    /// Re-execute the last `steps` recorded steps, newest first, each from its
    /// recorded starting point. Defaults to and is clamped to the whole history.
    pub async fn backward(&mut self, steps: Option<usize>) {
        let len = self.history.len();
        let steps = steps.unwrap_or(len).min(len);
        log::debug!("[{}] Stepping backward over {} records", self.run_id, steps);

        for index in (len - steps..len).rev() {
            let record = self.history[index].clone();
            self.restore(record);
            self.step().await;
        }
    }

    /// Re-execute the whole recorded history in chronological order
    pub async fn replay(&mut self) {
        let records = self.history.clone();
        log::debug!("[{}] Replaying {} records", self.run_id, records.len());

        for record in records {
            self.restore(record);
            self.step().await;
        }
    }

    fn restore(&mut self, record: HistoryRecord<S>) {
        self.context = record.context;
        self.retry_count = record.retry_count;
        self.is_complete = record.is_complete;
        self.status = record.status;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Activity;
    use crate::error::{FlowError, RetryableError};
    use std::sync::Mutex;

    crate::flow_states! {
        enum Pipe { Start, A, B, C, End }
        start = Start;
        end = End;
    }

    fn advance(name: &str, to: Pipe) -> Arc<Activity<Pipe>> {
        Arc::new(Activity::from_fn(name, move |ctx: &mut FlowContext<Pipe>| {
            ctx.set_state(to);
            Ok(())
        }))
    }

    fn linear_decider() -> Decider<Pipe> {
        let to_b = advance("to_b", Pipe::B);
        let to_c = advance("to_c", Pipe::C);
        let to_end = advance("to_end", Pipe::End);
        Decider::new(move |ctx: &FlowContext<Pipe>| match ctx.state() {
            Pipe::Start | Pipe::A => Some(to_b.clone()),
            Pipe::B => Some(to_c.clone()),
            Pipe::C => Some(to_end.clone()),
            Pipe::End => None,
        })
    }

    fn always(activity: Activity<Pipe>) -> Decider<Pipe> {
        let activity = Arc::new(activity);
        Decider::new(move |_ctx: &FlowContext<Pipe>| Some(activity.clone()))
    }

    fn record_events(flow: &mut Flow<Pipe>) -> Arc<Mutex<Vec<String>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        for kind in [
            EventKind::ContextChanged,
            EventKind::Success,
            EventKind::Failure,
            EventKind::Error,
            EventKind::Complete,
        ] {
            let log = log.clone();
            flow.on(kind, move |event, _flow| {
                log.lock().unwrap().push(format!("{:?}", event.kind()));
            });
        }
        log
    }

    #[tokio::test]
    async fn test_step_advances_and_records_history() {
        let mut flow = Flow::new(linear_decider(), FlowContext::new());
        assert_eq!(flow.status(), FlowStatus::Idle);

        flow.step().await;
        assert_eq!(flow.context().state(), Pipe::B);
        assert_eq!(flow.history().len(), 1);
        assert_eq!(flow.history()[0].state(), Pipe::Start);
        assert_eq!(flow.status(), FlowStatus::Running);
        assert!(!flow.is_complete());
    }

    #[tokio::test]
    async fn test_start_runs_to_success() {
        let mut flow = Flow::new(linear_decider(), FlowContext::new());
        let events = record_events(&mut flow);

        flow.start(None).await;

        assert_eq!(flow.context().state(), Pipe::End);
        assert_eq!(flow.status(), FlowStatus::Succeeded);
        assert!(flow.is_complete());
        // Start, B, C, End
        assert_eq!(flow.history().len(), 4);
        assert_eq!(*events.lock().unwrap(), vec!["Success", "Complete"]);
        assert!(flow.last_error().is_none());
    }

    #[tokio::test]
    async fn test_retry_counter_increments_per_attempt() {
        let decider = always(Activity::from_fn("flaky", |_ctx: &mut FlowContext<Pipe>| {
            Err(RetryableError::default().into())
        }));
        let mut flow = Flow::new(decider, FlowContext::new());
        let events = record_events(&mut flow);

        assert_eq!(flow.current_retry(), 0);
        for expected in 1..=3 {
            flow.step().await;
            assert_eq!(flow.current_retry(), expected);
            assert!(!flow.is_complete());
            assert_eq!(flow.context().state(), Pipe::Start);
        }
        assert!(events.lock().unwrap().is_empty());

        flow.step().await;
        assert_eq!(flow.current_retry(), 4);
        assert!(flow.is_complete());
        assert_eq!(flow.status(), FlowStatus::Failed);
        assert_eq!(*events.lock().unwrap(), vec!["Failure", "Complete"]);
    }

    #[tokio::test]
    async fn test_retry_count_is_not_reset_by_success() {
        let attempts = Arc::new(Mutex::new(0));
        let counter = attempts.clone();
        let decider = always(Activity::from_fn(
            "second_try",
            move |ctx: &mut FlowContext<Pipe>| {
                let mut n = counter.lock().unwrap();
                *n += 1;
                if *n == 1 {
                    return Err(FlowError::retryable("first attempt"));
                }
                ctx.set_state(Pipe::End);
                Ok(())
            },
        ));
        let mut flow = Flow::new(decider, FlowContext::new());

        flow.start(None).await;

        assert_eq!(flow.status(), FlowStatus::Succeeded);
        assert_eq!(flow.current_retry(), 1);
        assert_eq!(*attempts.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_error_is_fatal_on_first_occurrence() {
        let decider = always(Activity::from_fn("broken", |_ctx: &mut FlowContext<Pipe>| {
            Err(FlowError::other("Random error!"))
        }));
        let mut flow = Flow::new(decider, FlowContext::new()).with_retry_limit(10);
        let seen = Arc::new(Mutex::new(None));
        let seen_in_handler = seen.clone();
        flow.on(EventKind::Error, move |event, flow| {
            if let FlowEvent::Error(err) = event {
                *seen_in_handler.lock().unwrap() = Some((err.to_string(), flow.is_complete()));
            }
        });
        let events = record_events(&mut flow);

        flow.start(None).await;

        assert_eq!(flow.history().len(), 1);
        assert_eq!(flow.current_retry(), 0);
        assert_eq!(*events.lock().unwrap(), vec!["Error", "Complete"]);
        assert_eq!(
            *seen.lock().unwrap(),
            Some(("Random error!".to_string(), true))
        );
        assert_eq!(flow.last_error(), Some("Random error!"));
    }

    #[tokio::test]
    async fn test_missing_activity_routes_to_error() {
        let mut flow = Flow::new(Decider::default(), FlowContext::<Pipe>::new());
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let kinds_in_handler = kinds.clone();
        flow.on(EventKind::Error, move |event, _flow| {
            if let FlowEvent::Error(err) = event {
                kinds_in_handler
                    .lock()
                    .unwrap()
                    .push(err.is_configuration());
            }
        });

        flow.start(None).await;

        assert_eq!(*kinds.lock().unwrap(), vec![true]);
        assert_eq!(flow.status(), FlowStatus::Failed);
        assert_eq!(
            flow.last_error(),
            Some("Configuration error: Decider returned no activity for state Start")
        );
    }

    #[tokio::test]
    async fn test_unimplemented_activity_is_not_retried() {
        let mut flow = Flow::new(
            always(Activity::unimplemented("todo")),
            FlowContext::new(),
        );
        let events = record_events(&mut flow);

        flow.start(None).await;

        assert_eq!(flow.current_retry(), 0);
        assert_eq!(*events.lock().unwrap(), vec!["Error", "Complete"]);
    }

    #[tokio::test]
    async fn test_handlers_run_in_registration_order() {
        let mut flow = Flow::new(linear_decider(), FlowContext::new());
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            flow.on(EventKind::Complete, move |_event, _flow| {
                order.lock().unwrap().push(i);
            });
        }

        flow.start(None).await;
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_set_context_emits_and_rebinds_initial() {
        let mut flow = Flow::new(linear_decider(), FlowContext::new());
        let events = record_events(&mut flow);
        let mut context = FlowContext::new();
        context.set_state(Pipe::C);

        flow.start(Some(context)).await;
        assert_eq!(flow.history().len(), 2);
        assert_eq!(
            *events.lock().unwrap(),
            vec!["ContextChanged", "Success", "Complete"]
        );

        flow.reset();
        assert_eq!(flow.context().state(), Pipe::C);
    }

    #[tokio::test]
    async fn test_reset_to_step() {
        let mut flow = Flow::new(linear_decider(), FlowContext::new());
        flow.start(None).await;
        assert_eq!(flow.history().len(), 4);

        flow.reset_to(2);
        assert_eq!(flow.context().state(), Pipe::B);
        assert_eq!(flow.history().len(), 1);
        assert!(!flow.is_complete());
        assert_eq!(flow.status(), FlowStatus::Running);

        flow.reset_to(1);
        assert_eq!(flow.context().state(), Pipe::Start);
        assert!(flow.history().is_empty());
        assert_eq!(flow.status(), FlowStatus::Idle);
    }

    #[tokio::test]
    async fn test_reset_restores_recorded_retry_count() {
        let decider = always(Activity::from_fn("flaky", |_ctx: &mut FlowContext<Pipe>| {
            Err(FlowError::retryable("later"))
        }));
        let mut flow = Flow::new(decider, FlowContext::new());
        flow.forward(3).await;
        assert_eq!(flow.current_retry(), 3);

        flow.reset_to(3);
        assert_eq!(flow.current_retry(), 2);
        assert_eq!(flow.history().len(), 2);
    }

    #[tokio::test]
    async fn test_reset_out_of_range_falls_back_to_initial() {
        for step in [0, -1, 99] {
            let mut flow = Flow::new(linear_decider(), FlowContext::new());
            let run_id = flow.run_id();
            flow.start(None).await;

            flow.reset_to(step);
            assert_eq!(flow.context().state(), Pipe::Start);
            assert_eq!(flow.current_retry(), 0);
            assert!(!flow.is_complete());
            assert!(flow.history().is_empty());
            assert_ne!(flow.run_id(), run_id);
        }
    }

    #[tokio::test]
    async fn test_forward_stops_when_complete() {
        let mut flow = Flow::new(linear_decider(), FlowContext::new());

        flow.forward(2).await;
        assert_eq!(flow.context().state(), Pipe::C);

        flow.forward(10).await;
        assert!(flow.is_complete());
        assert_eq!(flow.history().len(), 4);
    }

    #[tokio::test]
    async fn test_backward_reexecutes_from_recorded_points() {
        let mut flow = Flow::new(linear_decider(), FlowContext::new());
        flow.start(None).await;

        flow.backward(Some(1)).await;
        assert_eq!(flow.context().state(), Pipe::End);
        assert!(flow.is_complete());

        flow.reset();
        flow.start(None).await;
        flow.backward(Some(2)).await;
        // Re-runs End, then C -> End
        assert_eq!(flow.context().state(), Pipe::End);
        assert_eq!(flow.history().len(), 6);
    }

    #[tokio::test]
    async fn test_backward_defaults_to_whole_history() {
        let mut flow = Flow::new(linear_decider(), FlowContext::new());
        flow.start(None).await;

        flow.backward(None).await;
        assert_eq!(flow.context().state(), Pipe::B);

        let mut clamped = Flow::new(linear_decider(), FlowContext::new());
        clamped.start(None).await;
        clamped.backward(Some(20)).await;
        assert_eq!(clamped.context().state(), Pipe::B);
    }

    #[tokio::test]
    async fn test_replay_ends_at_end() {
        let mut flow = Flow::new(linear_decider(), FlowContext::new());
        flow.start(None).await;
        let events = record_events(&mut flow);

        flow.replay().await;
        assert_eq!(flow.context().state(), Pipe::End);
        assert_eq!(flow.history().len(), 8);
        assert_eq!(*events.lock().unwrap(), vec!["Success", "Complete"]);
    }
}
