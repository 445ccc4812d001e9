// src/engine/event_handlers.rs

//! Event handling logic for the emitter core.

use tracing::{debug, trace, warn};

use crate::engine::buffer::BoundedEventBuffer;
use crate::engine::Delivery;
use crate::errors::DirChangesError;
use crate::types::ChangeRecord;

/// Decision returned by the core after handling a single `EmitterEvent`.
#[derive(Debug)]
pub struct EmitterStep {
    /// Deliveries the shell must forward to the consumer, in order.
    pub deliveries: Vec<Delivery>,
    /// Whether the source is still live (false once cancelled or failed).
    pub keep_running: bool,
}

impl EmitterStep {
    pub(crate) fn running(deliveries: Vec<Delivery>) -> Self {
        Self {
            deliveries,
            keep_running: true,
        }
    }

    pub(crate) fn stopped(deliveries: Vec<Delivery>) -> Self {
        Self {
            deliveries,
            keep_running: false,
        }
    }
}

/// Mutable state the handlers operate on.
#[derive(Debug)]
pub struct EmitterState {
    pub buffer: BoundedEventBuffer,
    pub demand: u64,
    pub cancelled: bool,
    pub dropped: u64,
    pub delivered: u64,
}

/// Handle a consumer request for `n` more records.
///
/// Demand saturates at `u64::MAX`, which is effectively unbounded.
/// `n == 0` changes nothing.
pub fn handle_request(state: &mut EmitterState, n: u64) -> EmitterStep {
    if state.cancelled {
        return EmitterStep::stopped(Vec::new());
    }

    state.demand = state.demand.saturating_add(n);
    debug!(requested = n, demand = state.demand, "demand increased");

    let mut deliveries = Vec::new();
    deliver_available(state, &mut deliveries);
    EmitterStep::running(deliveries)
}

/// Handle a batch of records pushed by the poller.
///
/// Each record is buffered and then immediately drained while demand
/// allows, so a batch larger than the buffer only overflows by the part no
/// one has asked for yet.
pub fn handle_push(state: &mut EmitterState, records: Vec<ChangeRecord>) -> EmitterStep {
    if state.cancelled {
        return EmitterStep::stopped(Vec::new());
    }

    let mut deliveries = Vec::new();
    let mut dropped_here = 0u64;

    for record in records {
        if let Some(lost) = state.buffer.push(record).dropped() {
            trace!(path = ?lost.path, kind = %lost.kind, "record lost to overflow");
            dropped_here += 1;
        }
        deliver_available(state, &mut deliveries);
    }

    if dropped_here > 0 {
        state.dropped += dropped_here;
        warn!(
            dropped = dropped_here,
            total_dropped = state.dropped,
            capacity = state.buffer.capacity(),
            policy = ?state.buffer.policy(),
            "records lost to buffer overflow"
        );
    }

    EmitterStep::running(deliveries)
}

/// Handle a terminal failure from the poller.
///
/// Buffered records are discarded: the consumer sees exactly one failure and
/// nothing after it.
pub fn handle_failure(state: &mut EmitterState, err: DirChangesError) -> EmitterStep {
    if state.cancelled {
        debug!(error = %err, "ignoring failure after termination");
        return EmitterStep::stopped(Vec::new());
    }

    let discarded = state.buffer.clear();
    state.cancelled = true;
    state.demand = 0;
    warn!(error = %err, discarded, "emitter failed");

    EmitterStep::stopped(vec![Delivery::Failed(err)])
}

/// Handle consumer cancellation.
pub fn handle_cancel(state: &mut EmitterState) -> EmitterStep {
    if !state.cancelled {
        let discarded = state.buffer.clear();
        state.cancelled = true;
        state.demand = 0;
        debug!(discarded, "emitter cancelled");
    }
    EmitterStep::stopped(Vec::new())
}

/// Pop and deliver one record per unit of demand until either runs out.
fn deliver_available(state: &mut EmitterState, deliveries: &mut Vec<Delivery>) {
    while state.demand > 0 {
        let Some(record) = state.buffer.pop() else {
            break;
        };
        state.demand -= 1;
        state.delivered += 1;
        deliveries.push(Delivery::Next(record));
    }
}
