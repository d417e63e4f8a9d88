//! Delivery chaos
//!
//! Live ledger delivery is at-least-once and unordered. This module models
//! that by duplicating and locally reordering a clean event sequence.

use rand::rngs::StdRng;
use rand::Rng;
use vela_core::TransactionEvent;

/// Delivery chaos configuration
#[derive(Clone, Debug)]
pub struct DeliveryChaos {
    /// Probability an event is delivered a second time
    pub duplicate_prob: f64,
    /// Probability an event is held back
    pub reorder_prob: f64,
    /// Maximum positions an event is held back
    pub reorder_depth: usize,
}

impl Default for DeliveryChaos {
    fn default() -> Self {
        DeliveryChaos {
            duplicate_prob: 0.05,
            reorder_prob: 0.1,
            reorder_depth: 3,
        }
    }
}

impl DeliveryChaos {
    /// In-order, exactly-once delivery
    pub fn calm() -> Self {
        DeliveryChaos {
            duplicate_prob: 0.0,
            reorder_prob: 0.0,
            reorder_depth: 0,
        }
    }

    pub fn rough() -> Self {
        DeliveryChaos {
            duplicate_prob: 0.2,
            reorder_prob: 0.3,
            reorder_depth: 5,
        }
    }

    pub fn hostile() -> Self {
        DeliveryChaos {
            duplicate_prob: 0.5,
            reorder_prob: 0.7,
            reorder_depth: 20,
        }
    }

    /// Delivery sequence for `events`; every input appears at least once
    pub fn scramble(&self, events: &[TransactionEvent], rng: &mut StdRng) -> Vec<TransactionEvent> {
        let mut keyed: Vec<(usize, u32, TransactionEvent)> = Vec::with_capacity(events.len());
        let mut tiebreak = 0u32;

        for (position, event) in events.iter().enumerate() {
            let mut copies = 1;
            while copies < 4 && rng.gen::<f64>() < self.duplicate_prob {
                copies += 1;
            }
            for _ in 0..copies {
                let delay = if self.reorder_depth > 0 && rng.gen::<f64>() < self.reorder_prob {
                    rng.gen_range(1..=self.reorder_depth)
                } else {
                    0
                };
                tiebreak += 1;
                keyed.push((position + delay, tiebreak, event.clone()));
            }
        }

        keyed.sort_by_key(|(slot, tiebreak, _)| (*slot, *tiebreak));
        keyed.into_iter().map(|(_, _, event)| event).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use vela_core::{ProductId, Timestamp, TransactionId};

    fn events(n: u64) -> Vec<TransactionEvent> {
        (0..n)
            .map(|i| {
                TransactionEvent::verified(
                    TransactionId::new(i),
                    ProductId::new("p"),
                    Timestamp::from_secs(i as i64),
                    None,
                )
            })
            .collect()
    }

    #[test]
    fn test_calm_is_identity() {
        let mut rng = StdRng::seed_from_u64(1);
        let input = events(20);
        assert_eq!(DeliveryChaos::calm().scramble(&input, &mut rng), input);
    }

    #[test]
    fn test_hostile_keeps_every_event() {
        let mut rng = StdRng::seed_from_u64(7);
        let input = events(50);
        let out = DeliveryChaos::hostile().scramble(&input, &mut rng);

        assert!(out.len() > input.len());
        let ids: HashSet<_> = out.iter().map(|e| e.transaction_id).collect();
        assert_eq!(ids.len(), input.len());
        assert_ne!(out[..input.len()], input[..]);
    }

    #[test]
    fn test_same_seed_same_delivery() {
        let input = events(30);
        let chaos = DeliveryChaos::rough();
        let a = chaos.scramble(&input, &mut StdRng::seed_from_u64(3));
        let b = chaos.scramble(&input, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }
}
