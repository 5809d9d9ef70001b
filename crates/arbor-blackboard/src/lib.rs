//! Shared key/value store for behaviour tree nodes.
//!
//! A [`Blackboard`] is one hierarchical map of `/`-delimited keys to JSON values, plus per-key
//! access metadata and an optional activity stream. Nodes never touch it directly: they go
//! through a [`Client`], which scopes keys to a namespace and only permits the accesses it
//! registered for.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod activity;
pub mod client;
pub mod error;
pub mod key;
pub mod metadata;
pub mod store;

pub use activity::{ActivityItem, ActivityStream, ActivityType};
pub use client::Client;
pub use error::{BlackboardError, RegistrationError};
pub use metadata::{Access, ClientId, KeyMetadata};
pub use serde_json::Value;
pub use store::Blackboard;
