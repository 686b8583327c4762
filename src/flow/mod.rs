// SPDX-License-Identifier: MIT

//! Flow orchestration
//!
//! This module provides:
//! - `StateSet` - closed set of workflow states (see `flow_states!`)
//! - `FlowContext` - current state plus auxiliary store and globals
//! - `Decider` - picks the next activity from the context
//! - `Flow` - the engine stepping the context until `END`, with history,
//!   rewind and replay

mod context;
mod decider;
mod engine;
mod events;
mod history;
mod states;
mod store;

pub use context::FlowContext;
pub use decider::Decider;
pub use engine::{Flow, FlowOptions, DEFAULT_RETRY_LIMIT};
pub use events::{EventKind, FlowEvent, Handler, Listeners};
pub use history::{FlowStatus, HistoryRecord};
pub use states::StateSet;
pub use store::Store;
