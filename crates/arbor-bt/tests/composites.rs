mod support;

use arbor_bt::{BehaviourTree, Status, Subtree};
use support::{entries, log, ready, scripted, status_of, switch};

use Status::{Failure, Invalid, Running, Success};

#[test]
fn higher_priority_child_preempts_running_sibling() {
    let log = log();
    let (a, a_status) = switch("A", Failure, &log);
    let (b, _) = switch("B", Running, &log);
    let mut tree = ready(Subtree::selector("root", false, vec![a, b]));

    tree.tick().unwrap();
    assert_eq!(status_of(&tree, "B"), Running);
    assert_eq!(tree.root_status(), Running);

    a_status.set(Running);
    tree.tick().unwrap();
    assert_eq!(status_of(&tree, "B"), Invalid);
    assert_eq!(entries(&log, "B terminate INVALID"), 1);
    assert_eq!(tree.tip(), tree.find("A").map(|n| n.id()));

    // B stays invalid and is not stopped a second time
    tree.tick().unwrap();
    assert_eq!(entries(&log, "B terminate INVALID"), 1);
    assert_eq!(entries(&log, "B update RUNNING"), 1);
}

#[test]
fn failing_guard_stops_running_work_in_reactive_sequence() {
    let log = log();
    let (guard, guard_status) = switch("guard", Success, &log);
    let work = scripted("work", &[Running], &log);
    let mut tree = ready(Subtree::sequence("root", false, vec![guard, work]));

    tree.tick().unwrap();
    tree.tick().unwrap();
    assert_eq!(entries(&log, "guard update SUCCESS"), 2);
    assert_eq!(entries(&log, "work initialise"), 1);

    guard_status.set(Failure);
    tree.tick().unwrap();
    assert_eq!(tree.root_status(), Failure);
    assert_eq!(status_of(&tree, "work"), Invalid);
    assert_eq!(entries(&log, "work terminate INVALID"), 1);
}

#[test]
fn memory_sequence_resumes_at_running_child() {
    let log = log();
    let first = scripted("first", &[Success], &log);
    let second = scripted("second", &[Running, Running, Success], &log);
    let mut tree = ready(Subtree::sequence("root", true, vec![first, second]));

    tree.tick().unwrap();
    tree.tick().unwrap();
    assert_eq!(tree.root_status(), Running);
    tree.tick().unwrap();
    assert_eq!(tree.root_status(), Success);

    assert_eq!(entries(&log, "first update SUCCESS"), 1);
    assert_eq!(entries(&log, "second initialise"), 1);
    assert_eq!(entries(&log, "second terminate SUCCESS"), 1);
}

#[test]
fn reactive_sequence_rechecks_earlier_children() {
    let log = log();
    let first = scripted("first", &[Success], &log);
    let second = scripted("second", &[Running, Running, Success], &log);
    let mut tree = ready(Subtree::sequence("root", false, vec![first, second]));

    for _ in 0..3 {
        tree.tick().unwrap();
    }
    assert_eq!(tree.root_status(), Success);
    assert_eq!(entries(&log, "first update SUCCESS"), 3);
}

#[test]
fn memory_selector_skips_failed_children_while_running() {
    let log = log();
    let first = scripted("first", &[Failure], &log);
    let second = scripted("second", &[Running, Success], &log);
    let mut tree = ready(Subtree::selector("root", true, vec![first, second]));

    tree.tick().unwrap();
    tree.tick().unwrap();
    assert_eq!(tree.root_status(), Success);
    assert_eq!(entries(&log, "first update FAILURE"), 1);
}

#[test]
fn selector_succeeds_on_first_success_without_ticking_the_rest() {
    let log = log();
    let first = scripted("first", &[Failure], &log);
    let second = scripted("second", &[Success], &log);
    let third = scripted("third", &[Success], &log);
    let mut tree = ready(Subtree::selector("root", false, vec![first, second, third]));

    tree.tick().unwrap();
    assert_eq!(tree.root_status(), Success);
    assert!(log.borrow().iter().all(|e| !e.starts_with("third")));
    assert_eq!(status_of(&tree, "third"), Invalid);
}

#[test]
fn empty_composites_resolve_immediately() {
    let mut sequence = ready(Subtree::sequence("empty", false, vec![]));
    sequence.tick().unwrap();
    assert_eq!(sequence.root_status(), Success);

    let mut selector = ready(Subtree::selector("empty", true, vec![]));
    selector.tick().unwrap();
    assert_eq!(selector.root_status(), Failure);
}

#[test]
fn restarting_a_composite_invalidates_finished_children() {
    let log = log();
    let first = scripted("first", &[Success], &log);
    let second = scripted("second", &[Failure], &log);
    let mut tree = ready(Subtree::sequence("root", true, vec![first, second]));

    tree.tick().unwrap();
    assert_eq!(tree.root_status(), Failure);
    assert_eq!(status_of(&tree, "first"), Success);

    tree.tick().unwrap();
    assert_eq!(entries(&log, "first terminate INVALID"), 1);
    assert_eq!(entries(&log, "second terminate INVALID"), 1);
    assert_eq!(entries(&log, "first update SUCCESS"), 2);
}

#[test]
fn stopping_the_tree_invalidates_everything() {
    let log = log();
    let guard = scripted("guard", &[Success], &log);
    let work = scripted("work", &[Running], &log);
    let mut tree = ready(Subtree::sequence("root", false, vec![guard, work]));

    tree.tick().unwrap();
    tree.stop();
    assert!(tree.nodes().all(|n| n.status() == Invalid));
    assert_eq!(entries(&log, "work terminate INVALID"), 1);
    assert_eq!(tree.tip(), None);
}

#[test]
fn ids_are_assigned_in_pre_order() {
    let log = log();
    let tree = BehaviourTree::new(Subtree::sequence(
        "root",
        false,
        vec![
            Subtree::selector("left", false, vec![scripted("a", &[], &log)]),
            scripted("b", &[], &log),
        ],
    ));
    let names: Vec<_> = tree.nodes().map(|n| (n.id().index(), n.name().to_string())).collect();
    assert_eq!(
        names,
        vec![
            (0, "root".to_string()),
            (1, "left".to_string()),
            (2, "a".to_string()),
            (3, "b".to_string()),
        ]
    );
    let a = tree.find("a").unwrap();
    assert_eq!(a.parent(), tree.find("left").map(|n| n.id()));
    assert_eq!(tree.root().children().len(), 2);
}

#[test]
fn selector_switches_over_once_the_first_child_succeeds() {
    let log = log();
    let first = scripted("first", &[Failure, Failure, Success], &log);
    let fallback = scripted("fallback", &[Running], &log);
    let mut tree = ready(Subtree::selector("root", false, vec![first, fallback]));

    for _ in 0..2 {
        tree.tick().unwrap();
        assert_eq!(tree.root_status(), Running);
        assert_eq!(status_of(&tree, "fallback"), Running);
    }
    assert_eq!(entries(&log, "fallback terminate INVALID"), 0);

    tree.tick().unwrap();
    assert_eq!(tree.root_status(), Success);
    assert_eq!(status_of(&tree, "fallback"), Invalid);
    assert_eq!(entries(&log, "fallback terminate INVALID"), 1);
    assert_eq!(entries(&log, "fallback update RUNNING"), 2);
}
