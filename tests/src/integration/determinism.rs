//! Every node delivers the same blocks whatever order events arrive in.

#[cfg(test)]
mod tests {
    use crate::dag::{shuffle_parents_first, RandomDag};
    use crate::harness::{DeliveredBlock, Node};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared_types::{Event, EventId};
    use std::collections::HashMap;

    /// Build the DAG on one node, replay it shuffled on `replicas` others.
    fn replay_shuffled(gen: &RandomDag, seed: u64, replicas: u64) -> Vec<DeliveredBlock> {
        let mut rng = StdRng::seed_from_u64(seed);
        let specs = gen.generate(&mut rng);

        let mut origin = Node::equal(gen.validators.iter().copied());
        let events: Vec<Event> = origin.emit_all(&specs).unwrap();
        let expected = origin.blocks();
        assert!(origin.fatal.lock().is_empty());

        let position: HashMap<EventId, usize> =
            events.iter().enumerate().map(|(i, e)| (e.id(), i)).collect();
        for r in 0..replicas {
            let mut rng = StdRng::seed_from_u64(seed * 1_000 + r);
            let order = shuffle_parents_first(
                &events,
                |e| e.parents().iter().map(|p| position[p]).collect(),
                &mut rng,
            );

            let mut replica = Node::equal(gen.validators.iter().copied());
            for e in &order {
                replica.deliver(e).unwrap();
            }
            assert_eq!(replica.blocks(), expected, "seed {} replica {}", seed, r);
            assert!(replica.fatal.lock().is_empty());
        }
        expected
    }

    #[test]
    fn test_honest_dag_same_blocks_in_any_order() {
        let gen = RandomDag {
            max_parents: 4,
            ..RandomDag::honest(vec![1, 2, 3, 4], 40)
        };
        for seed in 0..3 {
            let blocks = replay_shuffled(&gen, seed, 3);
            assert!(!blocks.is_empty(), "seed {}", seed);
            assert!(blocks.iter().all(|b| b.block.cheaters.is_empty()));
        }
    }

    #[test]
    fn test_forked_dag_same_blocks_in_any_order() {
        let gen = RandomDag {
            max_parents: 5,
            cheaters: vec![5],
            fork_chance: 0.3,
            ..RandomDag::honest(vec![1, 2, 3, 4, 5], 30)
        };
        for seed in 10..13 {
            let blocks = replay_shuffled(&gen, seed, 3);
            for b in &blocks {
                assert!(b.block.cheaters.iter().all(|c| *c == 5));
            }
        }
    }
}
