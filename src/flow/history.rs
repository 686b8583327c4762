// SPDX-License-Identifier: MIT

//! Snapshots of engine state taken before each step

use super::context::FlowContext;
use super::states::StateSet;
use chrono::{DateTime, Utc};

/// Lifecycle of the engine itself, distinct from the workflow's states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl FlowStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowStatus::Succeeded | FlowStatus::Failed)
    }
}

/// Engine state as it was just before a step was attempted
#[derive(Debug, Clone)]
pub struct HistoryRecord<S: StateSet> {
    pub context: FlowContext<S>,
    pub retry_count: u32,
    pub is_complete: bool,
    pub status: FlowStatus,
    pub recorded_at: DateTime<Utc>,
}

impl<S: StateSet> HistoryRecord<S> {
    pub fn capture(
        context: &FlowContext<S>,
        retry_count: u32,
        is_complete: bool,
        status: FlowStatus,
    ) -> Self {
        Self {
            context: context.clone(),
            retry_count,
            is_complete,
            status,
            recorded_at: Utc::now(),
        }
    }

    pub fn state(&self) -> S {
        self.context.state()
    }
}
