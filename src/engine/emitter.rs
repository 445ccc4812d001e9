// src/engine/emitter.rs

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::errors::DirChangesError;
use crate::types::{ChangeRecord, OverflowPolicy};

use super::core::EmitterCore;
use super::{Delivery, EmitterEvent, EmitterPhase, EmitterStats};

/// Shared, synchronized wrapper around [`EmitterCore`].
///
/// The poller (producer) and the subscription (consumer) each hold a clone.
/// Every event is applied under one lock, and the resulting deliveries are
/// forwarded to the consumer's channel *before* the lock is released, so
/// records reach the consumer in exactly the order they were pushed no
/// matter which side triggered the delivery.
///
/// The delivery channel is unbounded, but it never holds more records than
/// the consumer has requested and not yet received.
#[derive(Clone)]
pub struct DemandDrivenEmitter {
    core: Arc<Mutex<EmitterCore>>,
    delivery_tx: mpsc::UnboundedSender<Delivery>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl fmt::Debug for DemandDrivenEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DemandDrivenEmitter")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl DemandDrivenEmitter {
    /// Create an emitter together with the consumer's delivery receiver and
    /// the poller's shutdown receiver.
    pub fn new(
        capacity: usize,
        policy: OverflowPolicy,
    ) -> (
        Self,
        mpsc::UnboundedReceiver<Delivery>,
        watch::Receiver<bool>,
    ) {
        let (delivery_tx, delivery_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let emitter = Self {
            core: Arc::new(Mutex::new(EmitterCore::new(capacity, policy))),
            delivery_tx,
            shutdown_tx: Arc::new(shutdown_tx),
        };
        (emitter, delivery_rx, shutdown_rx)
    }

    /// Increase demand by `n` and deliver whatever is already buffered.
    pub fn request(&self, n: u64) {
        self.apply(EmitterEvent::Requested(n));
    }

    /// Push detected records. Returns `false` once the emitter is no longer
    /// active, which tells the poller to stop.
    pub fn push(&self, records: Vec<ChangeRecord>) -> bool {
        self.apply(EmitterEvent::Pushed(records))
    }

    /// Fail the consumer with a terminal error.
    pub fn fail(&self, err: DirChangesError) {
        self.apply(EmitterEvent::Failed(err));
    }

    /// Cancel: stop deliveries and signal the poller to release its watch.
    pub fn cancel(&self) {
        self.apply(EmitterEvent::Cancelled);
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_active()
    }

    pub fn phase(&self) -> EmitterPhase {
        self.lock().phase()
    }

    pub fn stats(&self) -> EmitterStats {
        self.lock().stats()
    }

    fn apply(&self, event: EmitterEvent) -> bool {
        let mut core = self.lock();
        let step = core.step(event);

        for delivery in step.deliveries {
            if self.delivery_tx.send(delivery).is_err() {
                // Consumer side is gone; treat it as a cancellation.
                debug!("delivery receiver dropped; cancelling emitter");
                core.step(EmitterEvent::Cancelled);
                break;
            }
        }

        let keep_running = core.is_active();
        drop(core);

        if !keep_running {
            self.shutdown_tx.send_replace(true);
        }
        keep_running
    }

    fn lock(&self) -> MutexGuard<'_, EmitterCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChangeKind;

    fn rec(name: &str) -> ChangeRecord {
        ChangeRecord::new(format!("/w/{name}"), ChangeKind::Creation)
    }

    #[test]
    fn deliveries_reach_the_channel_in_order() {
        let (emitter, mut rx, _shutdown) = DemandDrivenEmitter::new(8, OverflowPolicy::DropOldest);
        emitter.push(vec![rec("a"), rec("b"), rec("c")]);
        emitter.request(2);

        let mut got = Vec::new();
        while let Ok(Delivery::Next(r)) = rx.try_recv() {
            got.push(r);
        }
        assert_eq!(got, vec![rec("a"), rec("b")]);
        assert_eq!(emitter.stats().buffered, 1);
    }

    #[test]
    fn cancel_signals_shutdown() {
        let (emitter, _rx, shutdown) = DemandDrivenEmitter::new(8, OverflowPolicy::DropOldest);
        assert!(!*shutdown.borrow());
        emitter.cancel();
        assert!(*shutdown.borrow());
        assert!(!emitter.push(vec![rec("a")]));
        assert_eq!(emitter.phase(), EmitterPhase::Cancelled);
    }

    #[test]
    fn dropped_receiver_cancels() {
        let (emitter, rx, _shutdown) = DemandDrivenEmitter::new(8, OverflowPolicy::DropOldest);
        drop(rx);
        emitter.request(1);
        assert!(!emitter.push(vec![rec("a")]));
        assert!(!emitter.is_active());
    }
}
