use thiserror::Error;

use crate::Access;

/// Raised while wiring clients to keys, i.e. at tree construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("'{key}' is already exclusively written by client '{holder}'")]
    ExclusiveWriteConflict { key: String, holder: String },

    #[error("cannot claim exclusive write on '{key}', already written by {writers:?}")]
    WriteConflict { key: String, writers: Vec<String> },

    #[error("malformed key '{0}'")]
    MalformedKey(String),

    #[error("key '{key}' is not in namespace '{namespace}'")]
    NotInNamespace { key: String, namespace: String },
}

/// Raised by client reads and writes. All variants are recoverable by the caller.
#[derive(Debug, Error)]
pub enum BlackboardError {
    #[error("no such key '{key}'")]
    NoSuchKey { key: String },

    #[error("client '{client}' has no {access} access to '{key}'")]
    AccessDenied {
        client: String,
        key: String,
        access: Access,
    },

    #[error("key '{key}' escapes namespace '{namespace}'")]
    NotInNamespace { key: String, namespace: String },

    #[error("'{key}' already exists and overwrite was not requested")]
    KeyExists { key: String },

    #[error("value under '{key}' is not a {expected}: {source}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize value for '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl BlackboardError {
    /// `true` for the "not configured yet" case callers usually fall back on.
    pub fn is_no_such_key(&self) -> bool {
        matches!(self, Self::NoSuchKey { .. })
    }

    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }
}

pub type Result<T> = std::result::Result<T, BlackboardError>;
