//! A rejected event leaves no half-delivered block behind and can be
//! processed again later.

#[cfg(test)]
mod tests {
    use crate::dag::full_rounds;
    use crate::harness::Node;
    use ab_03_orderer::ErrorKind;
    use shared_types::{Event, EventId};
    use std::collections::HashSet;

    #[test]
    fn test_decider_retried_after_missing_atropos() {
        let mut origin = Node::equal(1..=4);
        let events: Vec<Event> = origin.emit_all(&full_rounds(&[1, 2, 3, 4], 9, "")).unwrap();
        let expected = origin.blocks();
        assert!(expected.len() >= 3);
        let atropos = expected[0].block.atropos;

        let mut replica = Node::equal(1..=4);
        // Every branch has walked past the first round once round 2 is in.
        let (warmup, rest) = events.split_at(8);
        for e in warmup {
            replica.deliver(e).unwrap();
        }

        let mut rejected = 0;
        for e in rest {
            if !replica.blocks().is_empty() {
                replica.deliver(e).unwrap();
                continue;
            }
            let hidden = replica.events.remove(&atropos).unwrap();
            let res = replica.deliver(e);
            replica.events.insert((*hidden).clone());
            if let Err(err) = res {
                assert_eq!(err.kind(), ErrorKind::Drop);
                assert!(replica.blocks().is_empty());
                assert_eq!(replica.consensus.confirmed_on(&atropos).unwrap(), None);
                assert_eq!(replica.consensus.last_decided_frame().unwrap(), 0);
                assert_eq!(replica.consensus.frame_to_deliver().unwrap(), 1);
                assert!(replica
                    .consensus
                    .index()
                    .get_highest_before(&e.id())
                    .unwrap()
                    .is_none());
                rejected += 1;
                replica.deliver(e).unwrap();
            }
        }

        assert_eq!(rejected, 1);
        assert_eq!(replica.blocks(), expected);
        assert!(replica.fatal.lock().is_empty());
    }

    #[test]
    fn test_rejected_decider_does_not_stall_others() {
        let mut origin = Node::equal(1..=4);
        let events: Vec<Event> = origin.emit_all(&full_rounds(&[1, 2, 3, 4], 9, "")).unwrap();
        let expected = origin.blocks();
        let atropos = expected[0].block.atropos;

        // The decider of frame 1 is dropped for good, along with everything
        // built on it. Its round peers decide the frame instead.
        let mut replica = Node::equal(1..=4);
        let mut rejected: HashSet<EventId> = HashSet::new();
        for (i, e) in events.iter().enumerate() {
            if e.parents().iter().any(|p| rejected.contains(p)) {
                rejected.insert(e.id());
                continue;
            }
            if i < 8 || !rejected.is_empty() || !replica.blocks().is_empty() {
                replica.deliver(e).unwrap();
                continue;
            }
            let hidden = replica.events.remove(&atropos).unwrap();
            let res = replica.deliver(e);
            replica.events.insert((*hidden).clone());
            if res.is_err() {
                rejected.insert(e.id());
            }
        }

        assert!(!rejected.is_empty());
        let delivered = replica.blocks();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0], expected[0]);
        for frame in 1..=3 {
            let roots = replica.consensus.store().get_frame_roots(frame).unwrap();
            assert!(roots.iter().all(|r| !rejected.contains(&r.id)));
        }
        assert!(replica.fatal.lock().is_empty());
    }
}
