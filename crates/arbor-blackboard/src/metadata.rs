use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access a client requests on a key at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Read,
    /// Non-exclusive: any number of clients may write the same key.
    Write,
    /// At most one holder, and no plain writers alongside it.
    ExclusiveWrite,
}

impl Access {
    pub fn can_write(self) -> bool {
        matches!(self, Self::Write | Self::ExclusiveWrite)
    }
}

impl std::fmt::Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::ExclusiveWrite => "exclusive write",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Which clients hold which access on one store path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyMetadata {
    pub read: BTreeSet<ClientId>,
    pub write: BTreeSet<ClientId>,
    pub exclusive: Option<ClientId>,
}

impl KeyMetadata {
    pub fn is_empty(&self) -> bool {
        self.read.is_empty() && self.write.is_empty() && self.exclusive.is_none()
    }

    pub fn references(&self, client: ClientId) -> bool {
        self.read.contains(&client) || self.write.contains(&client) || self.exclusive == Some(client)
    }

    pub(crate) fn remove(&mut self, client: ClientId) {
        self.read.remove(&client);
        self.write.remove(&client);
        if self.exclusive == Some(client) {
            self.exclusive = None;
        }
    }
}
