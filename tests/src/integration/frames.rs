//! Frame assignment and Atropos choice on hand-written DAGs.

#[cfg(test)]
mod tests {
    use crate::dag::{full_rounds, parse_scheme, EventSpec, RandomDag};
    use crate::harness::Node;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    /// Without forks a validator has at most one root per frame, and every
    /// frame up to the highest one has roots.
    fn assert_unique_roots(node: &Node) {
        let top = node.built.values().map(|e| e.frame()).max().unwrap();
        for frame in 1..=top {
            let roots = node.consensus.store().get_frame_roots(frame).unwrap();
            assert!(!roots.is_empty(), "frame {} has no roots", frame);
            let mut seen = HashSet::new();
            for r in &roots {
                assert!(
                    seen.insert(r.slot.validator),
                    "validator {} has two roots in frame {}",
                    r.slot.validator,
                    frame
                );
            }
        }
    }

    // Four equal validators need two rounds per frame: a round-2 event sees
    // only two observers of each root, below the quorum of three.
    const FIVE_ROUNDS: &str = "
        a1:
        b1:
        c1:
        d1:
        a2: a1 b1 c1 d1
        b2: b1 a1 c1 d1
        c2: c1 a1 b1 d1
        d2: d1 a1 b1 c1
        a3: a2 b2 c2 d2
        b3: b2 a2 c2 d2
        c3: c2 a2 b2 d2
        d3: d2 a2 b2 c2
        a4: a3 b3 c3 d3
        b4: b3 a3 c3 d3
        c4: c3 a3 b3 d3
        d4: d3 a3 b3 c3
        a5: a4 b4 c4 d4
        b5: b4 a4 c4 d4
        c5: c4 a4 b4 d4
        d5: d4 a4 b4 c4
    ";

    #[test]
    fn test_scheme_frames_and_first_atropos() {
        let mut node = Node::equal(1..=4);
        node.emit_all(&parse_scheme(FIVE_ROUNDS).unwrap()).unwrap();

        for (name, frame) in [
            ("a1", 1),
            ("d1", 1),
            ("b2", 1),
            ("c3", 2),
            ("d4", 2),
            ("a5", 3),
        ] {
            assert_eq!(node.frame_of(name), frame, "{}", name);
        }

        let blocks = node.blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].block.atropos, node.event("a1").id());
        assert_eq!(blocks[0].events, vec![node.event("a1").id()]);
        assert_eq!(node.consensus.last_decided_frame().unwrap(), 1);
        assert_eq!(node.consensus.frame_to_deliver().unwrap(), 2);
        assert!(node.fatal.lock().is_empty());
    }

    #[test]
    fn test_block_confirms_ancestors_depth_first() {
        let mut node = Node::equal(1..=4);
        node.emit_all(&full_rounds(&[1, 2, 3, 4], 7, "")).unwrap();

        let blocks = node.blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].block.atropos, node.event("a3").id());
        let expected: Vec<_> = ["a3", "a2", "b1", "c1", "d1", "b2", "c2", "d2"]
            .iter()
            .map(|n| node.event(n).id())
            .collect();
        assert_eq!(blocks[1].events, expected);

        // Nothing is confirmed twice and everything confirmed is stored.
        let confirmed = node.log.lock().confirmed();
        for id in &confirmed {
            assert!(node.consensus.confirmed_on(id).unwrap().is_some());
        }
        let mut unique = confirmed.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), confirmed.len());
        assert_eq!(node.consensus.confirmed_on(&node.event("a4").id()).unwrap(), None);
    }

    #[test]
    fn test_one_root_per_validator_and_frame() {
        let mut node = Node::equal(1..=4);
        node.emit_all(&full_rounds(&[1, 2, 3, 4], 9, "")).unwrap();
        assert_unique_roots(&node);
        let frame3: Vec<_> = node
            .consensus
            .store()
            .get_frame_roots(3)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        let expected: Vec<_> = ["a5", "b5", "c5", "d5"]
            .iter()
            .map(|n| node.event(n).id())
            .collect();
        assert_eq!(frame3, expected);

        for seed in 0..3 {
            let gen = RandomDag {
                max_parents: 4,
                ..RandomDag::honest(vec![1, 2, 3, 4, 5], 30)
            };
            let mut node = Node::equal(1..=5);
            node.emit_all(&gen.generate(&mut StdRng::seed_from_u64(seed)))
                .unwrap();
            assert_unique_roots(&node);
        }
    }

    #[test]
    fn test_fork_is_reported_as_cheater() {
        let mut specs = full_rounds(&[1, 2, 3, 4], 7, "");
        let d2 = specs.iter().position(|s| s.name == "d2").unwrap();
        let fork = EventSpec {
            name: "d2x".into(),
            nonce: 1_000,
            ..specs[d2].clone()
        };
        specs.insert(d2 + 1, fork);
        for s in specs.iter_mut().filter(|s| ["a3", "b3", "c3"].contains(&s.name.as_str())) {
            s.parents.push("d2x".into());
        }

        let mut node = Node::equal(1..=4);
        node.emit_all(&specs).unwrap();

        assert_eq!(node.frame_of("d2x"), 1);
        assert_eq!(node.frame_of("a3"), 2);
        assert_eq!(node.frame_of("d3"), 2);

        let blocks = node.blocks();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].block.cheaters.is_empty());
        assert_eq!(blocks[1].block.atropos, node.event("a3").id());
        assert_eq!(blocks[1].block.cheaters, vec![4]);
        assert!(blocks[1].events.contains(&node.event("d2x").id()));
        assert!(node
            .consensus
            .cheaters(&node.event("d3").id())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_lagging_validator_jumps_frames() {
        // B alone holds a quorum and runs ahead; A's second event lands on
        // B's latest frame plus one.
        const GAP: u32 = 10_000;
        let mut node = Node::weighted([(1, 1), (2, 3)]);

        let mut specs = vec![EventSpec {
            name: "a1".into(),
            creator: 1,
            parents: vec![],
            seq: 1,
            nonce: 0,
        }];
        for seq in 1..=GAP + 1 {
            specs.push(EventSpec {
                name: format!("b{}", seq),
                creator: 2,
                parents: if seq > 1 {
                    vec![format!("b{}", seq - 1)]
                } else {
                    vec![]
                },
                seq,
                nonce: 0,
            });
        }
        specs.push(EventSpec {
            name: "a2".into(),
            creator: 1,
            parents: vec!["a1".into(), format!("b{}", GAP + 1)],
            seq: 2,
            nonce: 0,
        });
        node.emit_all(&specs).unwrap();

        assert_eq!(node.frame_of("a1"), 1);
        assert_eq!(node.frame_of(&format!("b{}", GAP + 1)), GAP + 1);
        assert_eq!(node.frame_of("a2"), GAP + 2);
        assert!(node.fatal.lock().is_empty());
    }
}
