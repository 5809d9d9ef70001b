use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::ClientId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    /// Scalar value read.
    Read,
    /// First write of a key.
    Initialised,
    Write,
    /// Structured value (object/array) handed out to a reader.
    Accessed,
    AccessDenied,
    NoKey,
    /// Write refused because overwriting was not requested.
    NoOverwrite,
    Unset,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Initialised => "INITIALISED",
            Self::Write => "WRITE",
            Self::Accessed => "ACCESSED",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::NoKey => "NO_KEY",
            Self::NoOverwrite => "NO_OVERWRITE",
            Self::Unset => "UNSET",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityItem {
    pub key: String,
    pub client_id: ClientId,
    pub client_name: String,
    pub activity_type: ActivityType,
    pub previous_value: Option<Value>,
    pub current_value: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

/// Bounded FIFO of blackboard activity. Once full, the oldest entry is evicted first.
#[derive(Debug, Clone)]
pub struct ActivityStream {
    capacity: usize,
    items: VecDeque<ActivityItem>,
}

impl ActivityStream {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, item: ActivityItem) {
        if self.capacity == 0 {
            return;
        }
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn items(&self) -> impl Iterator<Item = &ActivityItem> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
