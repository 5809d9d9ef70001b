use arbor_blackboard::ClientId;
use serde::{Deserialize, Serialize};

use crate::node::{NodeId, TypeTag};
use crate::status::Status;

/// Serialisable picture of a tree after a tick, for loggers and viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub tick: u64,
    pub tip_id: Option<NodeId>,
    pub nodes: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub name: String,
    pub parent_id: Option<NodeId>,
    pub child_ids: Vec<NodeId>,
    pub tip_id: Option<NodeId>,
    #[serde(rename = "type")]
    pub type_tag: TypeTag,
    pub status: Status,
    pub feedback_message: String,
    /// Ticked on the snapshot's tick.
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blackboard_client_ids: Vec<ClientId>,
}

impl TreeSnapshot {
    pub fn node(&self, id: NodeId) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn find(&self, name: &str) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn active(&self) -> impl Iterator<Item = &NodeSnapshot> {
        self.nodes.iter().filter(|n| n.is_active)
    }
}
