use tracing::{debug, trace};

use crate::error::{SetupError, UpdateError};
use crate::node::{Node, NodeId, NodeKind, Subtree, TypeTag};
use crate::status::Status;

/// Flat storage for a tree's nodes, indexed by [`NodeId`]. Parents own children by id, so the
/// whole lifecycle walk works on `&mut self` without shared ownership.
#[derive(Default)]
pub(crate) struct Arena {
    nodes: Vec<Node>,
    /// Tree tick being processed, stamped onto every node ticked.
    pub(crate) current_tick: u64,
}

impl Arena {
    /// Lay `root` out in pre-order. Returns the root's id.
    pub(crate) fn insert(&mut self, subtree: Subtree, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let Subtree {
            name,
            kind,
            children,
        } = subtree;
        self.nodes.push(Node {
            id,
            name,
            parent,
            children: Vec::new(),
            status: Status::Invalid,
            feedback_message: String::new(),
            kind,
            is_setup: false,
            last_tick: None,
        });
        let children = children
            .into_iter()
            .map(|child| self.insert(child, Some(id)))
            .collect();
        self.nodes[id.0].children = children;
        id
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn child(&self, id: NodeId, index: usize) -> NodeId {
        self.nodes[id.0].children[index]
    }

    pub(crate) fn child_count(&self, id: NodeId) -> usize {
        self.nodes[id.0].children.len()
    }

    pub(crate) fn status(&self, id: NodeId) -> Status {
        self.nodes[id.0].status
    }

    pub(crate) fn set_current(&mut self, id: NodeId, index: Option<usize>) {
        if let NodeKind::Composite { current, .. } = &mut self.nodes[id.0].kind {
            *current = index;
        }
    }

    /// Children before parents, matching the order nodes finish a tick.
    pub(crate) fn post_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.collect_post_order(root, &mut out);
        out
    }

    fn collect_post_order(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.nodes[id.0].children {
            self.collect_post_order(child, out);
        }
        out.push(id);
    }

    /// Tick `id` and everything beneath it that its strategy chooses to tick.
    /// `visit` sees every ticked node once, after its own status is final for this tick.
    pub(crate) fn tick(
        &mut self,
        id: NodeId,
        visit: &mut dyn FnMut(&Node),
    ) -> Result<Status, UpdateError> {
        if self.nodes[id.0].status != Status::Running {
            self.initialise(id);
        }
        self.nodes[id.0].last_tick = Some(self.current_tick);

        let node = &mut self.nodes[id.0];
        let status = match &mut node.kind {
            NodeKind::Behaviour(behaviour) => {
                let status = behaviour.update().map_err(|source| UpdateError::Node {
                    node: node.name.clone(),
                    source: Box::new(source),
                })?;
                node.refresh_feedback();
                status
            }
            NodeKind::Composite { .. } => match node.type_tag() {
                TypeTag::Sequence => self.tick_ordered(id, Status::Success, visit)?,
                TypeTag::Selector => self.tick_ordered(id, Status::Failure, visit)?,
                _ => self.tick_parallel(id, visit)?,
            },
            NodeKind::Decorator(_) => self.tick_decorator(id, visit)?,
        };

        if status == Status::Invalid {
            return Err(UpdateError::InvalidStatus {
                node: self.nodes[id.0].name.clone(),
            });
        }
        trace!(node = %self.nodes[id.0].name, id = %id, %status, "ticked");
        if status.is_terminal() {
            self.stop(id, status);
        } else {
            self.nodes[id.0].status = status;
        }
        visit(&self.nodes[id.0]);
        Ok(status)
    }

    fn initialise(&mut self, id: NodeId) {
        debug!(node = %self.nodes[id.0].name, id = %id, "initialise");
        let node = &mut self.nodes[id.0];
        match &mut node.kind {
            NodeKind::Behaviour(behaviour) => {
                behaviour.initialise();
                node.refresh_feedback();
            }
            NodeKind::Decorator(decorator) => {
                decorator.initialise();
                node.refresh_feedback();
            }
            NodeKind::Composite { current, .. } => {
                *current = None;
                self.stop_children(id, 0);
            }
        }
    }

    /// Force `id` to `new_status`. Stopping with `INVALID` cascades to every child that is not
    /// already `INVALID`; terminal statuses leave children alone.
    pub(crate) fn stop(&mut self, id: NodeId, new_status: Status) {
        debug!(
            node = %self.nodes[id.0].name,
            id = %id,
            from = %self.nodes[id.0].status,
            to = %new_status,
            "stop"
        );
        if new_status == Status::Invalid {
            self.stop_children(id, 0);
            self.set_current(id, None);
        }
        let node = &mut self.nodes[id.0];
        match &mut node.kind {
            NodeKind::Behaviour(behaviour) => behaviour.terminate(new_status),
            NodeKind::Decorator(decorator) => decorator.terminate(new_status),
            NodeKind::Composite { .. } => {}
        }
        node.refresh_feedback();
        node.status = new_status;
    }

    /// Invalidate children from index `from` on, skipping those already `INVALID`.
    pub(crate) fn stop_children(&mut self, id: NodeId, from: usize) {
        for index in from..self.child_count(id) {
            let child = self.child(id, index);
            if self.status(child) != Status::Invalid {
                self.stop(child, Status::Invalid);
            }
        }
    }

    fn tick_decorator(
        &mut self,
        id: NodeId,
        visit: &mut dyn FnMut(&Node),
    ) -> Result<Status, UpdateError> {
        let child = self.child(id, 0);
        let gated = match &mut self.nodes[id.0].kind {
            NodeKind::Decorator(decorator) => decorator.gate(),
            _ => None,
        };
        let status = match gated {
            Some(status) => status,
            None => {
                let child_status = self.tick(child, visit)?;
                match &mut self.nodes[id.0].kind {
                    NodeKind::Decorator(decorator) => decorator.decorate(child_status),
                    _ => child_status,
                }
            }
        };
        if status != Status::Running && self.status(child) == Status::Running {
            self.stop(child, Status::Invalid);
        }

        self.nodes[id.0].refresh_feedback();
        if self.nodes[id.0].feedback_message.is_empty() {
            let message = self.nodes[child.0].feedback_message.clone();
            self.nodes[id.0].feedback_message = message;
        }
        Ok(status)
    }

    /// Deepest node on the path the last tick took, or `None` if `id` is `INVALID`.
    pub(crate) fn tip(&self, id: NodeId) -> Option<NodeId> {
        let node = &self.nodes[id.0];
        if node.status == Status::Invalid {
            return None;
        }
        let next = match &node.kind {
            NodeKind::Behaviour(_) => None,
            NodeKind::Composite { current, .. } => current.map(|i| node.children[i]),
            NodeKind::Decorator(_) => node.children.first().copied(),
        };
        next.and_then(|child| self.tip(child)).or(Some(id))
    }

    pub(crate) fn setup_node(&mut self, id: NodeId) -> Result<(), SetupError> {
        let node = &mut self.nodes[id.0];
        let result = match &mut node.kind {
            NodeKind::Behaviour(behaviour) => behaviour.setup(),
            NodeKind::Decorator(decorator) => decorator.setup(),
            NodeKind::Composite { strategy, .. } => strategy
                .validate(node.children.len())
                .map_err(|reason| SetupError::InvalidConfiguration {
                    node: node.name.clone(),
                    reason,
                }),
        };
        if result.is_ok() {
            node.is_setup = true;
        }
        result
    }

    pub(crate) fn shutdown(&mut self) {
        for node in &mut self.nodes {
            if let NodeKind::Behaviour(behaviour) = &mut node.kind {
                behaviour.shutdown();
            }
        }
    }
}
