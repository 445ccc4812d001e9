// src/engine/buffer.rs

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::types::{ChangeRecord, OverflowPolicy};

/// Result of pushing a record into a [`BoundedEventBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The record was appended without losing anything.
    Accepted,
    /// The buffer was full; the returned head record was evicted to make
    /// room (`OverflowPolicy::DropOldest`).
    DisplacedOldest(ChangeRecord),
    /// The buffer was full; the new record was discarded
    /// (`OverflowPolicy::RejectNew`).
    Rejected(ChangeRecord),
}

impl PushOutcome {
    /// The record lost to overflow, if any.
    pub fn dropped(&self) -> Option<&ChangeRecord> {
        match self {
            PushOutcome::Accepted => None,
            PushOutcome::DisplacedOldest(r) | PushOutcome::Rejected(r) => Some(r),
        }
    }
}

/// Fixed-capacity FIFO of change records waiting for consumer demand.
///
/// Semantics:
/// - Insertion order is detection order; `pop` always returns the oldest
///   record still held.
/// - `len() <= capacity()` at all times.
/// - When full, the configured [`OverflowPolicy`] decides who is dropped.
///   With `DropOldest` the capacity bounds how stale a delivered record can
///   be; it does not guarantee every change is delivered.
///
/// The buffer itself is not synchronized. The emitter wraps it together with
/// the demand counter behind a single lock.
#[derive(Debug)]
pub struct BoundedEventBuffer {
    policy: OverflowPolicy,
    capacity: usize,
    records: VecDeque<ChangeRecord>,
}

impl BoundedEventBuffer {
    /// Create a new buffer.
    ///
    /// `capacity` is clamped to at least 1; a zero-capacity buffer could never
    /// hold anything.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            policy,
            capacity,
            records: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a record at the tail, applying the overflow policy if full.
    pub fn push(&mut self, record: ChangeRecord) -> PushOutcome {
        if self.records.len() < self.capacity {
            self.records.push_back(record);
            return PushOutcome::Accepted;
        }

        match self.policy {
            OverflowPolicy::DropOldest => {
                let evicted = self.records.pop_front();
                self.records.push_back(record);
                match evicted {
                    Some(old) => {
                        warn!(
                            capacity = self.capacity,
                            path = ?old.path,
                            kind = %old.kind,
                            "buffer full; dropped oldest record"
                        );
                        PushOutcome::DisplacedOldest(old)
                    }
                    None => PushOutcome::Accepted,
                }
            }
            OverflowPolicy::RejectNew => {
                warn!(
                    capacity = self.capacity,
                    path = ?record.path,
                    kind = %record.kind,
                    "buffer full; rejected new record"
                );
                PushOutcome::Rejected(record)
            }
        }
    }

    /// Remove and return the head record, or `None` if empty. Never blocks.
    pub fn pop(&mut self) -> Option<ChangeRecord> {
        self.records.pop_front()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Drop everything still buffered, returning how many records were lost.
    pub fn clear(&mut self) -> usize {
        let n = self.records.len();
        self.records.clear();
        if n > 0 {
            debug!(discarded = n, "cleared event buffer");
        }
        n
    }
}
