use std::collections::VecDeque;

use ph_capture::{Full, RingBuffer};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Push(u32),
    Pop,
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => any::<u32>().prop_map(Op::Push),
        4 => Just(Op::Pop),
        1 => Just(Op::Clear),
    ]
}

fn capacity() -> impl Strategy<Value = usize> {
    (0u32..7).prop_map(|shift| 1usize << shift)
}

proptest! {
    #[test]
    fn ring_matches_bounded_queue(capacity in capacity(), ops in prop::collection::vec(op(), 0..256)) {
        let mut ring = RingBuffer::new(capacity).unwrap();
        let mut model = VecDeque::new();
        let mut peak = 0usize;

        for op in ops {
            match op {
                Op::Push(value) => {
                    let pushed = ring.push(value);
                    if model.len() == capacity - 1 {
                        prop_assert_eq!(pushed, Err(Full(value)));
                    } else {
                        prop_assert_eq!(pushed, Ok(()));
                        model.push_back(value);
                        peak = peak.max(model.len());
                    }
                }
                Op::Pop => prop_assert_eq!(ring.pop(), model.pop_front()),
                Op::Clear => {
                    ring.clear();
                    model.clear();
                    peak = 0;
                }
            }

            prop_assert_eq!(ring.len(), model.len());
            prop_assert_eq!(ring.space(), capacity - 1 - model.len());
            prop_assert_eq!(ring.is_empty(), model.is_empty());
            prop_assert_eq!(ring.is_full(), model.len() == capacity - 1);
            prop_assert_eq!(ring.peek(), model.front());
            prop_assert_eq!(ring.peak(), peak);
        }
    }

    #[test]
    fn pushes_minus_pops_is_len(pushes in 0usize..64, pops in 0usize..64) {
        let mut ring = RingBuffer::new(64).unwrap();
        let mut accepted = 0usize;
        for value in 0..pushes {
            if ring.push(value).is_ok() {
                accepted += 1;
            }
        }
        let mut popped = Vec::new();
        for _ in 0..pops {
            if let Some(value) = ring.pop() {
                popped.push(value);
            }
        }

        prop_assert_eq!(accepted, pushes.min(63));
        prop_assert_eq!(ring.len(), accepted - popped.len());
        prop_assert_eq!(popped, (0..pops.min(accepted)).collect::<Vec<_>>());
    }

    #[test]
    fn non_powers_of_two_are_rejected(capacity in 0usize..4096) {
        prop_assume!(!capacity.is_power_of_two());
        prop_assert!(RingBuffer::<u8>::new(capacity).is_err());
    }
}
