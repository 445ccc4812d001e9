// tests/emitter_properties.rs

use proptest::prelude::*;

use dirchanges::engine::{Delivery, EmitterCore, EmitterEvent};
use dirchanges::types::{ChangeKind, ChangeRecord, OverflowPolicy};

#[derive(Debug, Clone)]
enum Op {
    Request(u64),
    Push(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..6).prop_map(Op::Request),
        (1usize..8).prop_map(Op::Push),
    ]
}

fn policy_strategy() -> impl Strategy<Value = OverflowPolicy> {
    prop_oneof![Just(OverflowPolicy::DropOldest), Just(OverflowPolicy::RejectNew)]
}

fn record(seq: usize) -> ChangeRecord {
    ChangeRecord::new(format!("/w/f{seq}"), ChangeKind::Creation)
}

fn seq_of(record: &ChangeRecord) -> usize {
    record
        .path
        .to_str()
        .and_then(|p| p.strip_prefix("/w/f"))
        .and_then(|n| n.parse().ok())
        .unwrap()
}

proptest! {
    // Delivered records are a subsequence of pushed records, never exceed
    // requested demand, and the buffer stays within capacity.
    #[test]
    fn deliveries_respect_order_demand_and_capacity(
        capacity in 1usize..10,
        policy in policy_strategy(),
        ops in proptest::collection::vec(op_strategy(), 1..60),
    ) {
        let mut core = EmitterCore::new(capacity, policy);
        let mut next_seq = 0usize;
        let mut requested = 0u64;
        let mut delivered = Vec::new();

        for op in ops {
            let step = match op {
                Op::Request(n) => {
                    requested += n;
                    core.step(EmitterEvent::Requested(n))
                }
                Op::Push(k) => {
                    let batch = (next_seq..next_seq + k).map(record).collect();
                    next_seq += k;
                    core.step(EmitterEvent::Pushed(batch))
                }
            };
            prop_assert!(step.keep_running);
            for delivery in step.deliveries {
                match delivery {
                    Delivery::Next(r) => delivered.push(seq_of(&r)),
                    Delivery::Failed(e) => prop_assert!(false, "unexpected failure {e}"),
                }
            }

            let stats = core.stats();
            prop_assert!(stats.buffered <= capacity);
            prop_assert!(delivered.len() as u64 <= requested);
            prop_assert_eq!(stats.delivered, delivered.len() as u64);
            // Records wait only while there is no demand for them.
            prop_assert!(stats.buffered == 0 || stats.demand == 0);
        }

        prop_assert!(delivered.windows(2).all(|w| w[0] < w[1]));
        let stats = core.stats();
        prop_assert_eq!(
            stats.delivered + stats.dropped + stats.buffered as u64,
            next_seq as u64
        );
    }

    // With enough demand up front nothing is buffered or lost.
    #[test]
    fn ample_demand_delivers_everything_in_order(
        capacity in 1usize..5,
        batches in proptest::collection::vec(1usize..10, 1..10),
    ) {
        let mut core = EmitterCore::new(capacity, OverflowPolicy::DropOldest);
        core.step(EmitterEvent::Requested(u64::MAX));

        let mut next_seq = 0usize;
        let mut delivered = Vec::new();
        for k in batches {
            let batch = (next_seq..next_seq + k).map(record).collect();
            next_seq += k;
            for delivery in core.step(EmitterEvent::Pushed(batch)).deliveries {
                if let Delivery::Next(r) = delivery {
                    delivered.push(seq_of(&r));
                }
            }
        }

        prop_assert_eq!(delivered, (0..next_seq).collect::<Vec<_>>());
        prop_assert_eq!(core.stats().dropped, 0);
    }
}
