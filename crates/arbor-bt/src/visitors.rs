use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use arbor_blackboard::ClientId;
use tracing::debug;

use crate::node::{Node, NodeId};
use crate::status::Status;

/// Observes every node ticked during a tree tick, children before parents.
pub trait Visitor: 'static {
    /// Called before the root is ticked.
    fn initialise(&mut self) {}

    fn run(&mut self, node: &Node);

    /// Called after the root has been ticked.
    fn finalise(&mut self) {}
}

/// Lets a visitor be registered with the tree while a handler or the caller keeps reading it.
impl<V: Visitor> Visitor for Rc<RefCell<V>> {
    fn initialise(&mut self) {
        self.borrow_mut().initialise();
    }

    fn run(&mut self, node: &Node) {
        self.borrow_mut().run(node);
    }

    fn finalise(&mut self) {
        self.borrow_mut().finalise();
    }
}

/// Logs each visited node at debug level.
#[derive(Debug, Default)]
pub struct DebugVisitor;

impl Visitor for DebugVisitor {
    fn run(&mut self, node: &Node) {
        debug!(
            node = %node.name(),
            id = %node.id(),
            status = %node.status(),
            feedback = node.feedback_message(),
            "visit"
        );
    }
}

/// Records which nodes were ticked, their statuses, and the blackboard surface they touched,
/// and whether any of that changed since the previous tick.
#[derive(Debug, Default)]
pub struct SnapshotVisitor {
    changed: bool,
    visited: BTreeMap<NodeId, Status>,
    previously_visited: BTreeMap<NodeId, Status>,
    visited_blackboard_keys: BTreeSet<String>,
    visited_blackboard_client_ids: BTreeSet<ClientId>,
}

impl SnapshotVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn visited(&self) -> &BTreeMap<NodeId, Status> {
        &self.visited
    }

    pub fn previously_visited(&self) -> &BTreeMap<NodeId, Status> {
        &self.previously_visited
    }

    pub fn visited_blackboard_keys(&self) -> &BTreeSet<String> {
        &self.visited_blackboard_keys
    }

    pub fn visited_blackboard_client_ids(&self) -> &BTreeSet<ClientId> {
        &self.visited_blackboard_client_ids
    }

    /// Nodes ticked this time that were not ticked last time.
    pub fn entered(&self) -> Vec<NodeId> {
        self.visited
            .keys()
            .filter(|id| !self.previously_visited.contains_key(id))
            .copied()
            .collect()
    }

    /// Nodes ticked last time that were not ticked this time.
    pub fn exited(&self) -> Vec<NodeId> {
        self.previously_visited
            .keys()
            .filter(|id| !self.visited.contains_key(id))
            .copied()
            .collect()
    }
}

impl Visitor for SnapshotVisitor {
    fn initialise(&mut self) {
        self.changed = false;
        self.previously_visited = std::mem::take(&mut self.visited);
        self.visited_blackboard_keys.clear();
        self.visited_blackboard_client_ids.clear();
    }

    fn run(&mut self, node: &Node) {
        let status = node.status();
        if self.previously_visited.get(&node.id()) != Some(&status) {
            self.changed = true;
        }
        self.visited.insert(node.id(), status);
        if node.is_leaf() {
            self.visited_blackboard_keys.extend(node.blackboard_keys());
            self.visited_blackboard_client_ids
                .extend(node.blackboard_client_ids());
        }
    }

    fn finalise(&mut self) {
        if self.visited.len() != self.previously_visited.len() {
            self.changed = true;
        }
    }
}
