// src/engine/mod.rs

//! Demand-driven delivery engine.
//!
//! This module ties together:
//! - the bounded event buffer (what happens when records arrive faster than
//!   they are requested)
//! - the demand counter
//! - the emitter state machine that reacts to:
//!   - consumer requests
//!   - records pushed by the poller
//!   - terminal failures
//!   - cancellation
//!
//! The pure core state machine lives in [`core`]; the synchronized shell
//! shared between the poller and the consumer is [`emitter`].

use std::fmt;

use crate::errors::DirChangesError;
use crate::types::ChangeRecord;

/// Externally observable emitter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterPhase {
    /// No outstanding demand.
    Idle,
    /// Demand outstanding, nothing buffered; waiting for the next push.
    AwaitingEvents,
    /// Demand outstanding and records buffered. Transient: the core drains
    /// this state before returning from a step.
    Delivering,
    /// Terminal. Nothing will be delivered any more.
    Cancelled,
}

impl fmt::Display for EmitterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EmitterPhase::Idle => "idle",
            EmitterPhase::AwaitingEvents => "awaiting-events",
            EmitterPhase::Delivering => "delivering",
            EmitterPhase::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Inputs to the emitter state machine.
#[derive(Debug)]
pub enum EmitterEvent {
    /// The consumer asked for `n` more records.
    Requested(u64),
    /// The poller detected these records, in order.
    Pushed(Vec<ChangeRecord>),
    /// The poller hit a terminal error.
    Failed(DirChangesError),
    /// The consumer cancelled.
    Cancelled,
}

/// Something handed to the consumer.
#[derive(Debug)]
pub enum Delivery {
    Next(ChangeRecord),
    /// Terminal; never followed by another delivery.
    Failed(DirChangesError),
}

/// Diagnostic counters for a running emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitterStats {
    pub phase: EmitterPhase,
    /// Records currently held in the buffer.
    pub buffered: usize,
    /// Outstanding demand.
    pub demand: u64,
    /// Records lost to buffer overflow so far.
    pub dropped: u64,
    /// Records delivered so far.
    pub delivered: u64,
}

pub mod buffer;
pub mod core;
pub mod emitter;
pub mod event_handlers;

pub use buffer::{BoundedEventBuffer, PushOutcome};
pub use self::core::EmitterCore;
pub use emitter::DemandDrivenEmitter;
pub use event_handlers::EmitterStep;
