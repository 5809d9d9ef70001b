use std::cell::Cell;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::arena::Arena;
use crate::config::TreeConfig;
use crate::error::{SetupError, TickError};
use crate::node::{Node, NodeId, Subtree};
use crate::snapshot::{NodeSnapshot, TreeSnapshot};
use crate::status::Status;
use crate::visitors::Visitor;

pub type TickHandler = Box<dyn FnMut(&BehaviourTree)>;

/// Owns a tree of nodes and drives it: setup, ticking, handlers, visitors, shutdown.
pub struct BehaviourTree {
    arena: Arena,
    root: NodeId,
    count: u64,
    is_setup: bool,
    interrupted: Cell<bool>,
    pre_tick_handlers: Vec<TickHandler>,
    post_tick_handlers: Vec<TickHandler>,
    visitors: Vec<Box<dyn Visitor>>,
}

impl BehaviourTree {
    pub fn new(root: Subtree) -> Self {
        let mut arena = Arena::default();
        let root = arena.insert(root, None);
        Self {
            arena,
            root,
            count: 0,
            is_setup: false,
            interrupted: Cell::new(false),
            pre_tick_handlers: Vec::new(),
            post_tick_handlers: Vec::new(),
            visitors: Vec::new(),
        }
    }

    pub fn root(&self) -> &Node {
        self.arena.node(self.root)
    }

    pub fn root_status(&self) -> Status {
        self.arena.status(self.root)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    /// First node with the given name, in pre-order.
    pub fn find(&self, name: &str) -> Option<&Node> {
        self.arena.nodes().iter().find(|n| n.name() == name)
    }

    /// Every node in pre-order (parents before children, children left to right).
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.arena.nodes().iter()
    }

    /// Number of ticks started so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_setup(&self) -> bool {
        self.is_setup
    }

    pub fn add_pre_tick_handler(&mut self, handler: impl FnMut(&BehaviourTree) + 'static) {
        self.pre_tick_handlers.push(Box::new(handler));
    }

    pub fn add_post_tick_handler(&mut self, handler: impl FnMut(&BehaviourTree) + 'static) {
        self.post_tick_handlers.push(Box::new(handler));
    }

    pub fn add_visitor(&mut self, visitor: impl Visitor) {
        self.visitors.push(Box::new(visitor));
    }

    /// Run every node's one-off setup, children before parents.
    ///
    /// Nodes that fail are reported together after the rest have been tried. The elapsed time
    /// is checked after each node; once it exceeds `timeout` the pass stops with
    /// [`SetupError::Timeout`]. Nodes that already completed setup are skipped on a retry.
    pub fn setup(&mut self, timeout: Duration) -> Result<(), SetupError> {
        let started = Instant::now();
        let mut failures = Vec::new();
        for id in self.arena.post_order(self.root) {
            if self.arena.node(id).is_setup() {
                continue;
            }
            if let Err(source) = self.arena.setup_node(id) {
                let node = self.arena.node(id).name().to_string();
                warn!(%node, error = %source, "setup failed");
                failures.push(SetupError::Node {
                    node,
                    source: Box::new(source),
                });
            }
            let elapsed = started.elapsed();
            if elapsed > timeout {
                warn!(?elapsed, ?timeout, "setup timed out");
                return Err(SetupError::Timeout { timeout, elapsed });
            }
        }

        match failures.len() {
            0 => {
                self.is_setup = true;
                debug!(nodes = self.arena.nodes().len(), "setup complete");
                Ok(())
            }
            1 => Err(failures.remove(0)),
            _ => Err(SetupError::Aggregate(failures)),
        }
    }

    /// Advance the tree by one tick.
    ///
    /// The tick count is incremented first, then pre-tick handlers run, then the root is ticked
    /// with every visitor watching, then post-tick handlers run. An update error aborts the
    /// tick before the post-tick handlers.
    pub fn tick(&mut self) -> Result<(), TickError> {
        if !self.is_setup {
            return Err(TickError::NotSetUp);
        }
        self.count += 1;
        debug!(tick = self.count, "tick");

        self.run_handlers(Stage::Pre);

        let mut visitors = std::mem::take(&mut self.visitors);
        for visitor in visitors.iter_mut() {
            visitor.initialise();
        }
        self.arena.current_tick = self.count;
        let result = {
            let mut visit = |node: &Node| {
                for visitor in visitors.iter_mut() {
                    visitor.run(node);
                }
            };
            self.arena.tick(self.root, &mut visit)
        };
        for visitor in visitors.iter_mut() {
            visitor.finalise();
        }
        visitors.append(&mut self.visitors);
        self.visitors = visitors;

        if let Err(err) = result {
            warn!(tick = self.count, error = %err, "tick aborted");
            return Err(err.into());
        }

        self.run_handlers(Stage::Post);
        Ok(())
    }

    fn run_handlers(&mut self, stage: Stage) {
        let slot = match stage {
            Stage::Pre => &mut self.pre_tick_handlers,
            Stage::Post => &mut self.post_tick_handlers,
        };
        let mut handlers = std::mem::take(slot);
        for handler in handlers.iter_mut() {
            handler(self);
        }
        let slot = match stage {
            Stage::Pre => &mut self.pre_tick_handlers,
            Stage::Post => &mut self.post_tick_handlers,
        };
        *slot = handlers;
    }

    /// Tick repeatedly, sleeping `period` between ticks.
    ///
    /// Stops after `iterations` ticks (if given), when the root resolves and
    /// `stop_on_terminal_status` is set, or when a handler calls [`BehaviourTree::interrupt`].
    pub fn tick_tock(
        &mut self,
        period: Duration,
        iterations: Option<u64>,
        stop_on_terminal_status: bool,
    ) -> Result<(), TickError> {
        self.interrupted.set(false);
        if iterations == Some(0) {
            return Ok(());
        }
        let mut ticks = 0u64;
        loop {
            self.tick()?;
            ticks += 1;
            if self.interrupted.get() {
                info!(tick = self.count, "tick-tock interrupted");
                break;
            }
            if stop_on_terminal_status && self.root_status().is_terminal() {
                info!(tick = self.count, status = %self.root_status(), "root resolved");
                break;
            }
            if iterations.is_some_and(|n| ticks >= n) {
                break;
            }
            std::thread::sleep(period);
        }
        Ok(())
    }

    /// `tick_tock` driven by a [`TreeConfig`].
    pub fn run(&mut self, config: &TreeConfig) -> Result<(), TickError> {
        self.tick_tock(
            config.tick_period(),
            config.max_ticks,
            config.stop_on_terminal_status,
        )
    }

    /// Ask a running `tick_tock` to stop after the current tick. Safe to call from a handler.
    pub fn interrupt(&self) {
        self.interrupted.set(true);
    }

    /// Force the whole tree back to `INVALID`, terminating anything mid-run. The root is
    /// always terminated, even before the first tick; descendants already `INVALID` are not.
    pub fn stop(&mut self) {
        self.arena.stop(self.root, Status::Invalid);
    }

    /// Stop the tree, then give every behaviour its `shutdown` hook.
    pub fn shutdown(&mut self) {
        self.stop();
        self.arena.shutdown();
        debug!("shutdown complete");
    }

    /// Deepest node on the path taken by the last tick.
    pub fn tip(&self) -> Option<NodeId> {
        self.arena.tip(self.root)
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        let nodes = self
            .arena
            .nodes()
            .iter()
            .map(|node| NodeSnapshot {
                id: node.id(),
                name: node.name().to_string(),
                parent_id: node.parent(),
                child_ids: node.children().to_vec(),
                tip_id: self.arena.tip(node.id()),
                type_tag: node.type_tag(),
                status: node.status(),
                feedback_message: node.feedback_message().to_string(),
                is_active: self.count > 0 && node.last_tick() == Some(self.count),
                blackboard_client_ids: node.blackboard_client_ids().into_iter().collect(),
            })
            .collect();
        TreeSnapshot {
            tick: self.count,
            tip_id: self.tip(),
            nodes,
        }
    }
}

#[derive(Clone, Copy)]
enum Stage {
    Pre,
    Post,
}

impl std::fmt::Debug for BehaviourTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviourTree")
            .field("root", &self.root())
            .field("count", &self.count)
            .field("is_setup", &self.is_setup)
            .field("visitors", &self.visitors.len())
            .finish()
    }
}
