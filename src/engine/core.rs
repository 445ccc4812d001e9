// src/engine/core.rs

//! Pure emitter state machine.
//!
//! This module contains a synchronous, deterministic "emitter core" that
//! consumes [`EmitterEvent`]s and produces:
//! - an updated buffer / demand state
//! - the list of deliveries the shell must forward to the consumer
//!
//! The shell (`engine::emitter::DemandDrivenEmitter`) is responsible for
//! locking, forwarding deliveries and signalling shutdown to the poller.
//! The core can be unit tested without Tokio, channels or a filesystem.

use crate::engine::buffer::BoundedEventBuffer;
use crate::engine::event_handlers::{
    handle_cancel, handle_failure, handle_push, handle_request, EmitterState, EmitterStep,
};
use crate::engine::{EmitterEvent, EmitterPhase, EmitterStats};
use crate::types::OverflowPolicy;

/// Pure core state: the bounded buffer plus the demand counter.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct EmitterCore {
    state: EmitterState,
}

impl EmitterCore {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            state: EmitterState {
                buffer: BoundedEventBuffer::new(capacity, policy),
                demand: 0,
                cancelled: false,
                dropped: 0,
                delivered: 0,
            },
        }
    }

    /// Handle a single event, updating state and returning the deliveries it
    /// produced.
    pub fn step(&mut self, event: EmitterEvent) -> EmitterStep {
        match event {
            EmitterEvent::Requested(n) => handle_request(&mut self.state, n),
            EmitterEvent::Pushed(records) => handle_push(&mut self.state, records),
            EmitterEvent::Failed(err) => handle_failure(&mut self.state, err),
            EmitterEvent::Cancelled => handle_cancel(&mut self.state),
        }
    }

    pub fn phase(&self) -> EmitterPhase {
        if self.state.cancelled {
            EmitterPhase::Cancelled
        } else if self.state.demand == 0 {
            EmitterPhase::Idle
        } else if self.state.buffer.is_empty() {
            EmitterPhase::AwaitingEvents
        } else {
            EmitterPhase::Delivering
        }
    }

    pub fn is_active(&self) -> bool {
        !self.state.cancelled
    }

    pub fn stats(&self) -> EmitterStats {
        EmitterStats {
            phase: self.phase(),
            buffered: self.state.buffer.len(),
            demand: self.state.demand,
            dropped: self.state.dropped,
            delivered: self.state.delivered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Delivery;
    use crate::errors::DirChangesError;
    use crate::types::{ChangeKind, ChangeRecord};

    fn rec(name: &str, kind: ChangeKind) -> ChangeRecord {
        ChangeRecord::new(format!("/w/{name}"), kind)
    }

    fn delivered(step: &EmitterStep) -> Vec<ChangeRecord> {
        step.deliveries
            .iter()
            .filter_map(|d| match d {
                Delivery::Next(r) => Some(r.clone()),
                Delivery::Failed(_) => None,
            })
            .collect()
    }

    #[test]
    fn starts_idle() {
        let core = EmitterCore::new(4, OverflowPolicy::DropOldest);
        assert_eq!(core.phase(), EmitterPhase::Idle);
    }

    #[test]
    fn no_demand_means_no_delivery() {
        let mut core = EmitterCore::new(4, OverflowPolicy::DropOldest);
        let step = core.step(EmitterEvent::Pushed(vec![
            rec("a", ChangeKind::Creation),
            rec("b", ChangeKind::Creation),
        ]));
        assert!(step.deliveries.is_empty());
        assert!(step.keep_running);
        assert_eq!(core.phase(), EmitterPhase::Idle);
        assert_eq!(core.stats().buffered, 2);
    }

    #[test]
    fn request_with_empty_buffer_awaits_events() {
        let mut core = EmitterCore::new(4, OverflowPolicy::DropOldest);
        let step = core.step(EmitterEvent::Requested(2));
        assert!(step.deliveries.is_empty());
        assert_eq!(core.phase(), EmitterPhase::AwaitingEvents);

        let step = core.step(EmitterEvent::Pushed(vec![rec("a", ChangeKind::Creation)]));
        assert_eq!(delivered(&step), vec![rec("a", ChangeKind::Creation)]);
        assert_eq!(core.phase(), EmitterPhase::AwaitingEvents);
        assert_eq!(core.stats().demand, 1);
    }

    #[test]
    fn delivers_exactly_the_requested_amount_in_order() {
        let mut core = EmitterCore::new(10, OverflowPolicy::DropOldest);
        core.step(EmitterEvent::Pushed(vec![
            rec("a", ChangeKind::Creation),
            rec("a", ChangeKind::Modification),
            rec("a", ChangeKind::Deletion),
        ]));

        let step = core.step(EmitterEvent::Requested(2));
        assert_eq!(
            delivered(&step),
            vec![rec("a", ChangeKind::Creation), rec("a", ChangeKind::Modification)]
        );
        assert_eq!(core.phase(), EmitterPhase::Idle);

        let step = core.step(EmitterEvent::Requested(1));
        assert_eq!(delivered(&step), vec![rec("a", ChangeKind::Deletion)]);
        assert_eq!(core.stats().delivered, 3);
    }

    #[test]
    fn request_zero_is_a_no_op() {
        let mut core = EmitterCore::new(4, OverflowPolicy::DropOldest);
        core.step(EmitterEvent::Pushed(vec![rec("a", ChangeKind::Creation)]));
        let step = core.step(EmitterEvent::Requested(0));
        assert!(step.deliveries.is_empty());
        assert_eq!(core.phase(), EmitterPhase::Idle);
    }

    #[test]
    fn demand_saturates() {
        let mut core = EmitterCore::new(4, OverflowPolicy::DropOldest);
        core.step(EmitterEvent::Requested(u64::MAX));
        core.step(EmitterEvent::Requested(5));
        assert_eq!(core.stats().demand, u64::MAX);
    }

    #[test]
    fn outstanding_demand_prevents_overflow_within_a_batch() {
        let mut core = EmitterCore::new(1, OverflowPolicy::RejectNew);
        core.step(EmitterEvent::Requested(3));
        let step = core.step(EmitterEvent::Pushed(vec![
            rec("a", ChangeKind::Creation),
            rec("b", ChangeKind::Creation),
            rec("c", ChangeKind::Creation),
        ]));
        assert_eq!(delivered(&step).len(), 3);
        assert_eq!(core.stats().dropped, 0);
    }

    #[test]
    fn overflow_is_counted() {
        let mut core = EmitterCore::new(2, OverflowPolicy::DropOldest);
        core.step(EmitterEvent::Pushed(vec![
            rec("a", ChangeKind::Creation),
            rec("b", ChangeKind::Creation),
            rec("c", ChangeKind::Creation),
        ]));
        let stats = core.stats();
        assert_eq!(stats.buffered, 2);
        assert_eq!(stats.dropped, 1);

        let step = core.step(EmitterEvent::Requested(5));
        assert_eq!(
            delivered(&step),
            vec![rec("b", ChangeKind::Creation), rec("c", ChangeKind::Creation)]
        );
    }

    #[test]
    fn failure_is_delivered_once_and_discards_buffer() {
        let mut core = EmitterCore::new(4, OverflowPolicy::DropOldest);
        core.step(EmitterEvent::Pushed(vec![rec("a", ChangeKind::Creation)]));

        let step = core.step(EmitterEvent::Failed(DirChangesError::DirectoryUnavailable(
            "/w".into(),
        )));
        assert!(!step.keep_running);
        assert_eq!(step.deliveries.len(), 1);
        assert!(matches!(step.deliveries[0], Delivery::Failed(_)));
        assert_eq!(core.phase(), EmitterPhase::Cancelled);

        let step = core.step(EmitterEvent::Requested(10));
        assert!(step.deliveries.is_empty());
        let step = core.step(EmitterEvent::Failed(DirChangesError::WatchPrimitive(
            "again".into(),
        )));
        assert!(step.deliveries.is_empty());
    }

    #[test]
    fn cancel_is_terminal() {
        let mut core = EmitterCore::new(4, OverflowPolicy::DropOldest);
        core.step(EmitterEvent::Requested(1));
        let step = core.step(EmitterEvent::Cancelled);
        assert!(!step.keep_running);
        assert!(!core.is_active());

        let step = core.step(EmitterEvent::Pushed(vec![rec("a", ChangeKind::Creation)]));
        assert!(step.deliveries.is_empty());
        assert!(!step.keep_running);
        assert_eq!(core.stats().buffered, 0);
    }
}
