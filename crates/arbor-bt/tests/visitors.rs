mod support;

use std::cell::RefCell;
use std::rc::Rc;

use arbor_bt::blackboard::Blackboard;
use arbor_bt::variables::SetBlackboardVariable;
use arbor_bt::{DebugVisitor, SnapshotVisitor, Status, Subtree};
use support::{log, ready, switch};

use Status::{Failure, Running};

#[test]
fn snapshot_visitor_tracks_changes_between_ticks() {
    let log = log();
    let (a, a_status) = switch("A", Failure, &log);
    let (b, _) = switch("B", Running, &log);
    let mut tree = ready(Subtree::selector("root", false, vec![a, b]));
    let snapshot = Rc::new(RefCell::new(SnapshotVisitor::new()));
    tree.add_visitor(snapshot.clone());
    let id = |name: &str| tree.find(name).unwrap().id();
    let (root_id, a_id, b_id) = (id("root"), id("A"), id("B"));

    tree.tick().unwrap();
    {
        let visitor = snapshot.borrow();
        assert!(visitor.changed());
        assert_eq!(visitor.visited().len(), 3);
        assert_eq!(visitor.visited()[&b_id], Running);
        assert_eq!(visitor.entered().len(), 3);
    }

    tree.tick().unwrap();
    assert!(!snapshot.borrow().changed());

    a_status.set(Running);
    tree.tick().unwrap();
    let visitor = snapshot.borrow();
    assert!(visitor.changed());
    assert_eq!(visitor.exited(), vec![b_id]);
    assert_eq!(visitor.visited().keys().copied().collect::<Vec<_>>(), vec![root_id, a_id]);
    assert_eq!(visitor.previously_visited()[&a_id], Failure);
}

#[test]
fn snapshot_visitor_collects_blackboard_surface() {
    let bb = Blackboard::new();
    let set = SetBlackboardVariable::new(&bb, "Set Foo", "foo", "bar", true).unwrap();
    let mut tree = ready(Subtree::sequence(
        "root",
        false,
        vec![Subtree::behaviour("Set Foo", set)],
    ));
    let snapshot = Rc::new(RefCell::new(SnapshotVisitor::new()));
    tree.add_visitor(snapshot.clone());
    tree.add_visitor(DebugVisitor);

    tree.tick().unwrap();
    let visitor = snapshot.borrow();
    assert!(visitor.visited_blackboard_keys().contains("/foo"));
    assert_eq!(visitor.visited_blackboard_client_ids().len(), 1);
    let ids: std::collections::BTreeSet<_> = visitor
        .visited_blackboard_client_ids()
        .iter()
        .copied()
        .collect();
    assert_eq!(bb.keys_filtered_by_clients(&ids), vec!["/foo".to_string()]);
}
