//! A node reopened over its storage continues exactly where it stopped.

#[cfg(test)]
mod tests {
    use crate::dag::full_rounds;
    use crate::harness::{DeliveredBlock, Disks, Node, NodeBuilder};
    use ab_03_orderer::InMemoryEventStore;
    use shared_types::{Event, Validators};
    use std::sync::Arc;

    fn validators() -> Validators {
        Validators::equal_weights(1..=4, 1).unwrap()
    }

    /// Events of an uninterrupted run and the blocks it delivered.
    fn reference(rounds: u32, seal_after: Option<usize>) -> (Vec<Event>, Vec<DeliveredBlock>) {
        let mut builder = NodeBuilder::new(validators());
        if let Some(n) = seal_after {
            builder = builder.seal_after(n);
        }
        let mut node = builder.build().unwrap();
        let mut events = Vec::new();
        for spec in full_rounds(&[1, 2, 3, 4], rounds, "") {
            if node.consensus.current_epoch().unwrap() != 1 {
                break;
            }
            events.push(node.emit(&spec).unwrap());
        }
        (events, node.blocks())
    }

    fn run_with_restart(
        disks: Disks,
        events: &[Event],
        crash_at: usize,
        seal_after: Option<usize>,
    ) -> (Vec<DeliveredBlock>, Node) {
        let store = Arc::new(InMemoryEventStore::new());
        let builder = |restart: bool| {
            let mut b = NodeBuilder::new(validators())
                .disks(disks.clone())
                .events(store.clone());
            if let Some(n) = seal_after {
                b = b.seal_after(n);
            }
            if restart {
                b = b.restart();
            }
            b.build().unwrap()
        };

        let mut first = builder(false);
        for e in &events[..crash_at] {
            first.deliver(e).unwrap();
        }
        let mut blocks = first.blocks();
        let decided = first.consensus.last_decided_frame().unwrap();
        drop(first);

        let mut second: Node = builder(true);
        assert!(second.blocks().is_empty(), "bootstrap must not deliver");
        assert_eq!(second.consensus.last_decided_frame().unwrap(), decided);
        for e in &events[crash_at..] {
            second.deliver(e).unwrap();
        }
        assert!(second.fatal.lock().is_empty());
        blocks.extend(second.blocks());
        (blocks, second)
    }

    #[test]
    fn test_restart_continues_same_blocks() {
        let (events, expected) = reference(11, None);
        assert!(expected.len() >= 3);
        for crash_at in [1, 17, 26, 33] {
            let (blocks, _) = run_with_restart(Disks::mem(), &events, crash_at, None);
            assert_eq!(blocks, expected, "crash at {}", crash_at);
        }
    }

    #[test]
    fn test_restart_around_epoch_seal() {
        let (events, expected) = reference(13, Some(2));
        assert_eq!(expected.len(), 2);
        for crash_at in [20, events.len()] {
            let (blocks, node) = run_with_restart(Disks::mem(), &events, crash_at, Some(2));
            assert_eq!(blocks, expected, "crash at {}", crash_at);
            assert_eq!(node.consensus.current_epoch().unwrap(), 2);
            assert_eq!(node.consensus.frame_to_deliver().unwrap(), 1);
        }
    }

    #[test]
    fn test_restart_keeps_vectors() {
        let (events, _) = reference(5, None);
        let disks = Disks::mem();
        drop(run_with_restart(disks.clone(), &events, events.len(), None));

        let mut node = NodeBuilder::new(validators())
            .disks(disks)
            .restart()
            .build()
            .unwrap();
        let last = events.last().unwrap();
        assert!(node
            .consensus
            .index()
            .get_highest_before(&last.id())
            .unwrap()
            .is_some());
        assert_eq!(node.consensus.current_epoch().unwrap(), 1);
        assert!(node.deliver(last).is_err());
    }

    #[cfg(feature = "rocksdb")]
    #[test]
    fn test_restart_on_rocksdb() {
        let dir = tempfile::tempdir().unwrap();
        let (events, expected) = reference(9, None);
        let (blocks, _) =
            run_with_restart(Disks::rocks(dir.path()), &events, events.len() / 2, None);
        assert_eq!(blocks, expected);
    }
}
