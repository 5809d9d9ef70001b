//! Tick-driven behaviour trees on top of `arbor-blackboard`.
//!
//! Build a tree as a [`Subtree`], hand it to a [`BehaviourTree`], call `setup` once and then
//! `tick` (or `tick_tock`). Leaves implement [`Behaviour`]; control flow comes from sequences,
//! selectors, parallels and [`decorators`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

mod arena;
pub mod behaviour;
pub mod behaviours;
pub mod composite;
pub mod config;
pub mod decorators;
pub mod error;
pub mod idioms;
pub mod node;
pub mod snapshot;
pub mod status;
pub mod tree;
pub mod variables;
pub mod visitors;

pub use behaviour::Behaviour;
pub use composite::{Composite, ParallelPolicy};
pub use config::TreeConfig;
pub use decorators::{Decorator, OneShotPolicy};
pub use error::{BuildError, SetupError, TickError, UpdateError};
pub use node::{Node, NodeId, Subtree, TypeTag};
pub use snapshot::{NodeSnapshot, TreeSnapshot};
pub use status::Status;
pub use tree::BehaviourTree;
pub use variables::{Comparison, ComparisonExpression, LogicalOperator};
pub use visitors::{DebugVisitor, SnapshotVisitor, Visitor};

pub use arbor_blackboard as blackboard;
