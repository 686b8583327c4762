// SPDX-License-Identifier: MIT

//! flowstep - a small in-process workflow orchestrator
//!
//! A [`Flow`] repeatedly asks a [`Decider`] which [`Activity`] to run for the
//! context's current state, executes it, and stops once the context reaches
//! its `END` state or a failure ends the run.

pub mod activity;
pub mod config;
pub mod error;
pub mod flow;

pub use activity::{Activity, Work};
pub use config::FlowConfig;
pub use error::{ActivityResult, ConfigurationError, FlowError, RetryableError};
pub use flow::{
    Decider, EventKind, Flow, FlowContext, FlowEvent, FlowOptions, FlowStatus, HistoryRecord,
    StateSet, Store,
};
