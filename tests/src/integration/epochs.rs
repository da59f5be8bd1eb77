//! Epoch sealing: the application ends an epoch, frames start over.

#[cfg(test)]
mod tests {
    use crate::dag::{full_rounds, EventSpec};
    use crate::harness::{Node, NodeBuilder};
    use shared_types::{Epoch, MutableEvent, Validators};

    /// Emit specs until the node leaves `epoch`. Returns how many were emitted.
    fn emit_within_epoch(node: &mut Node, specs: &[EventSpec], epoch: Epoch) -> usize {
        let mut emitted = 0;
        for spec in specs {
            if node.consensus.current_epoch().unwrap() != epoch {
                break;
            }
            node.emit(spec).unwrap();
            emitted += 1;
        }
        emitted
    }

    #[test]
    fn test_seal_restarts_frames() {
        let validators = Validators::equal_weights(1..=4, 1).unwrap();
        let mut node = NodeBuilder::new(validators).seal_after(2).build().unwrap();

        let epoch1 = full_rounds(&[1, 2, 3, 4], 12, "");
        let emitted = emit_within_epoch(&mut node, &epoch1, 1);
        assert!(emitted < epoch1.len());
        assert_eq!(node.consensus.current_epoch().unwrap(), 2);
        assert_eq!(node.consensus.last_decided_frame().unwrap(), 0);
        assert_eq!(node.consensus.frame_to_deliver().unwrap(), 1);
        assert_eq!(node.blocks().len(), 2);

        // Epoch 1 events are gone from the epoch DB.
        let a1 = node.event("a1").id();
        assert_eq!(node.consensus.confirmed_on(&a1).unwrap(), None);

        let epoch2 = full_rounds(&[1, 2, 3, 4], 7, "'");
        emit_within_epoch(&mut node, &epoch2, 2);
        assert_eq!(node.frame_of("a1'"), 1);
        assert_eq!(node.event("a1'").epoch(), 2);
        assert_eq!(node.frame_of("a3'"), 2);

        let blocks = node.blocks();
        assert_eq!(blocks.len(), 4);
        assert!(blocks[..2].iter().all(|b| b.epoch == 1));
        assert!(blocks[2..].iter().all(|b| b.epoch == 2));
        assert_eq!(blocks[2].block.atropos, node.event("a1'").id());
        assert_eq!(node.consensus.current_epoch().unwrap(), 3);
        assert!(node.fatal.lock().is_empty());
    }

    #[test]
    fn test_event_of_sealed_epoch_is_fatal() {
        let validators = Validators::equal_weights(1..=4, 1).unwrap();
        let mut node = NodeBuilder::new(validators).seal_after(1).build().unwrap();

        let specs = full_rounds(&[1, 2, 3, 4], 6, "");
        let emitted = emit_within_epoch(&mut node, &specs, 1);
        assert_eq!(node.consensus.current_epoch().unwrap(), 2);

        // An epoch 1 event arriving late.
        let mut me = MutableEvent::new(1, 1, 1);
        me.lamport = 1;
        me.frame = 1;
        me.nonce = 77;
        let late = me.build();
        let err = node.deliver(&late).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(node.fatal.lock().len(), 1);
        assert!(emitted > 0);
    }
}
