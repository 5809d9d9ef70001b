use std::collections::BTreeSet;

use arbor_blackboard::ClientId;
use serde::{Deserialize, Serialize};

use crate::behaviour::Behaviour;
use crate::composite::{Composite, ParallelPolicy};
use crate::decorators::Decorator;
use crate::status::Status;

/// Position of a node in its tree. Stable for the tree's lifetime and unique within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    Behaviour,
    Sequence,
    Selector,
    Parallel,
    Decorator,
}

pub(crate) enum NodeKind {
    Behaviour(Box<dyn Behaviour>),
    Composite {
        strategy: Composite,
        /// Index of the child that decided the last tick.
        current: Option<usize>,
    },
    Decorator(Box<dyn Decorator>),
}

impl NodeKind {
    fn type_tag(&self) -> TypeTag {
        match self {
            Self::Behaviour(_) => TypeTag::Behaviour,
            Self::Composite { strategy, .. } => strategy.type_tag(),
            Self::Decorator(_) => TypeTag::Decorator,
        }
    }
}

/// An owned, not yet ticked tree description. [`crate::BehaviourTree::new`] takes one of
/// these and lays it out.
pub struct Subtree {
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) children: Vec<Subtree>,
}

impl Subtree {
    pub fn behaviour(name: impl Into<String>, behaviour: impl Behaviour) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Behaviour(Box::new(behaviour)),
            children: Vec::new(),
        }
    }

    /// `memory == true` resumes from the running child; otherwise every tick starts over from
    /// the first child.
    pub fn sequence(name: impl Into<String>, memory: bool, children: Vec<Subtree>) -> Self {
        Self::composite(name, Composite::Sequence { memory }, children)
    }

    pub fn selector(name: impl Into<String>, memory: bool, children: Vec<Subtree>) -> Self {
        Self::composite(name, Composite::Selector { memory }, children)
    }

    pub fn parallel(name: impl Into<String>, policy: ParallelPolicy, children: Vec<Subtree>) -> Self {
        Self::composite(name, Composite::Parallel(policy), children)
    }

    pub fn decorator(name: impl Into<String>, decorator: impl Decorator, child: Subtree) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Decorator(Box::new(decorator)),
            children: vec![child],
        }
    }

    fn composite(name: impl Into<String>, strategy: Composite, children: Vec<Subtree>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Composite {
                strategy,
                current: None,
            },
            children,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a child to a composite. Leaves and decorators keep their shape and ignore it.
    pub fn push(&mut self, child: Subtree) -> bool {
        if matches!(self.kind, NodeKind::Composite { .. }) {
            self.children.push(child);
            true
        } else {
            false
        }
    }

    pub fn with_child(mut self, child: Subtree) -> Self {
        self.push(child);
        self
    }
}

/// One laid-out node. Owned by the tree's arena, visible to visitors and handlers.
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) status: Status,
    pub(crate) feedback_message: String,
    pub(crate) kind: NodeKind,
    pub(crate) is_setup: bool,
    pub(crate) last_tick: Option<u64>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn feedback_message(&self) -> &str {
        &self.feedback_message
    }

    /// Tree tick on which this node was last ticked.
    pub fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    pub fn is_setup(&self) -> bool {
        self.is_setup
    }

    pub fn type_tag(&self) -> TypeTag {
        self.kind.type_tag()
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Behaviour(_))
    }

    pub fn blackboard_client_ids(&self) -> BTreeSet<ClientId> {
        match &self.kind {
            NodeKind::Behaviour(b) => b.blackboard_clients().iter().map(|c| c.id()).collect(),
            _ => BTreeSet::new(),
        }
    }

    /// Store paths (after remapping) this node's clients have registered.
    pub fn blackboard_keys(&self) -> BTreeSet<String> {
        match &self.kind {
            NodeKind::Behaviour(b) => b
                .blackboard_clients()
                .iter()
                .flat_map(|c| c.paths().map(str::to_string).collect::<Vec<_>>())
                .collect(),
            _ => BTreeSet::new(),
        }
    }

    pub(crate) fn refresh_feedback(&mut self) {
        let message = match &self.kind {
            NodeKind::Behaviour(b) => b.feedback_message(),
            NodeKind::Decorator(d) => d.feedback_message(),
            NodeKind::Composite { .. } => return,
        };
        if message != self.feedback_message {
            self.feedback_message = message.to_string();
        }
    }
}

impl std::fmt::Debug for Subtree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subtree")
            .field("name", &self.name)
            .field("type", &self.kind.type_tag())
            .field("children", &self.children)
            .finish()
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type", &self.type_tag())
            .field("status", &self.status)
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviours::Success;

    #[test]
    fn subtree_debug_shows_the_shape() {
        let subtree = Subtree::selector("root", false, vec![Subtree::behaviour("leaf", Success)]);
        let debug = format!("{subtree:?}");
        assert!(debug.contains("\"root\""));
        assert!(debug.contains("Selector"));
        assert!(debug.contains("\"leaf\""));
    }
}
