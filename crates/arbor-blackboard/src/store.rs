use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::activity::{ActivityItem, ActivityStream, ActivityType};
use crate::metadata::{Access, ClientId, KeyMetadata};
use crate::{key, BlackboardError, Client, RegistrationError};

#[derive(Debug, Default)]
pub(crate) struct Inner {
    storage: BTreeMap<String, Value>,
    metadata: BTreeMap<String, KeyMetadata>,
    clients: BTreeMap<ClientId, String>,
    activity: Option<ActivityStream>,
}

/// The shared key/value store.
///
/// Cloning a `Blackboard` clones the handle, not the data: every clone (and every [`Client`]
/// created from one) sees the same storage. The internal lock only protects the store's own
/// bookkeeping. Callers sharing a store between threads must serialise their read-modify-write
/// sequences themselves.
#[derive(Debug, Clone, Default)]
pub struct Blackboard {
    inner: Arc<Mutex<Inner>>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root-namespace client.
    pub fn client(&self, name: impl Into<String>) -> Client {
        Client::attach(self.clone(), name.into(), key::ROOT.to_string())
    }

    pub fn namespaced_client(
        &self,
        name: impl Into<String>,
        namespace: &str,
    ) -> Result<Client, RegistrationError> {
        let namespace = key::namespace(namespace)?;
        Ok(Client::attach(self.clone(), name.into(), namespace))
    }

    /// Drop all values, metadata and client records, and disable the activity stream.
    ///
    /// Intended for test isolation; clients created before the reset keep their local
    /// registrations but no longer appear in the store's metadata.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        *inner = Inner::default();
        debug!("blackboard cleared");
    }

    pub fn enable_activity_stream(&self, capacity: usize) {
        let mut inner = self.inner.lock();
        match inner.activity.as_mut() {
            Some(stream) if stream.capacity() == capacity => {}
            _ => inner.activity = Some(ActivityStream::new(capacity)),
        }
    }

    pub fn disable_activity_stream(&self) {
        self.inner.lock().activity = None;
    }

    pub fn activity_stream_enabled(&self) -> bool {
        self.inner.lock().activity.is_some()
    }

    /// Copy of the activity stream, oldest first. `None` when the stream is disabled.
    pub fn activity_stream(&self) -> Option<Vec<ActivityItem>> {
        let inner = self.inner.lock();
        inner
            .activity
            .as_ref()
            .map(|stream| stream.items().cloned().collect())
    }

    pub fn clear_activity_stream(&self) {
        if let Some(stream) = self.inner.lock().activity.as_mut() {
            stream.clear();
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        let Ok(path) = key::absolute(key) else {
            return false;
        };
        self.inner.lock().storage.contains_key(&path)
    }

    /// Unchecked read. Keys are taken as absolute, with or without the leading `/`. Not subject
    /// to access control or activity logging.
    pub fn get(&self, key: &str) -> Option<Value> {
        let path = key::absolute(key).ok()?;
        self.inner.lock().storage.get(&path).cloned()
    }

    /// Unchecked write by absolute key, for seeding a store before clients exist.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), RegistrationError> {
        let path = key::absolute(key)?;
        self.inner.lock().storage.insert(path, value.into());
        Ok(())
    }

    /// Unchecked removal of a value and its access metadata.
    pub fn unset(&self, key: &str) -> Option<Value> {
        let path = key::absolute(key).ok()?;
        let mut inner = self.inner.lock();
        inner.metadata.remove(&path);
        inner.storage.remove(&path)
    }

    /// Every key that holds a value or has a registration, sorted.
    pub fn keys(&self) -> Vec<String> {
        let inner = self.inner.lock();
        let keys: BTreeSet<&String> = inner.storage.keys().chain(inner.metadata.keys()).collect();
        keys.into_iter().cloned().collect()
    }

    /// Keys any of `clients` is registered against.
    pub fn keys_filtered_by_clients(&self, clients: &BTreeSet<ClientId>) -> Vec<String> {
        let inner = self.inner.lock();
        inner
            .metadata
            .iter()
            .filter(|(_, meta)| clients.iter().any(|c| meta.references(*c)))
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn metadata(&self, key: &str) -> Option<KeyMetadata> {
        let path = key::absolute(key).ok()?;
        self.inner.lock().metadata.get(&path).cloned()
    }

    /// All stored values, sorted by key.
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        let inner = self.inner.lock();
        inner
            .storage
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn client_name(&self, id: ClientId) -> Option<String> {
        self.inner.lock().clients.get(&id).cloned()
    }

    /// Registered clients, by id.
    pub fn clients(&self) -> BTreeMap<ClientId, String> {
        self.inner.lock().clients.clone()
    }

    pub(crate) fn with_inner<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl Inner {
    pub(crate) fn add_client(&mut self, id: ClientId, name: &str) {
        self.clients.insert(id, name.to_string());
    }

    fn name_of(&self, id: ClientId) -> String {
        self.clients
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    pub(crate) fn register(
        &mut self,
        client: ClientId,
        path: &str,
        access: Access,
    ) -> Result<(), RegistrationError> {
        if let Some(meta) = self.metadata.get(path) {
            let holder = meta.exclusive.filter(|holder| *holder != client);
            match access {
                Access::Read => {}
                Access::Write => {
                    if let Some(holder) = holder {
                        return Err(self.exclusive_conflict(path, holder));
                    }
                }
                Access::ExclusiveWrite => {
                    if let Some(holder) = holder {
                        return Err(self.exclusive_conflict(path, holder));
                    }
                    let writers: Vec<String> = meta
                        .write
                        .iter()
                        .filter(|w| **w != client)
                        .map(|w| self.name_of(*w))
                        .collect();
                    if !writers.is_empty() {
                        warn!(key = path, ?writers, "exclusive write claim refused");
                        return Err(RegistrationError::WriteConflict {
                            key: path.to_string(),
                            writers,
                        });
                    }
                }
            }
        }

        let meta = self.metadata.entry(path.to_string()).or_default();
        meta.remove(client);
        match access {
            Access::Read => {
                meta.read.insert(client);
            }
            Access::Write => {
                meta.write.insert(client);
            }
            Access::ExclusiveWrite => meta.exclusive = Some(client),
        }
        trace!(key = path, %access, client = %client, "key registered");
        Ok(())
    }

    fn exclusive_conflict(&self, path: &str, holder: ClientId) -> RegistrationError {
        let holder = self.name_of(holder);
        warn!(key = path, holder = %holder, "key is exclusively held");
        RegistrationError::ExclusiveWriteConflict {
            key: path.to_string(),
            holder,
        }
    }

    /// Put `client`'s registration back on `path` if an `unset` dropped it. `false` when another
    /// client claimed the key in the meantime.
    pub(crate) fn restore_registration(&mut self, client: ClientId, path: &str, access: Access) -> bool {
        if self.metadata.get(path).is_some_and(|meta| meta.references(client)) {
            return true;
        }
        if self.register(client, path, access).is_ok() {
            return true;
        }
        self.record(client, path, ActivityType::AccessDenied, None, None);
        false
    }

    pub(crate) fn unregister_key(&mut self, client: ClientId, path: &str) {
        if let Some(meta) = self.metadata.get_mut(path) {
            meta.remove(client);
            if meta.is_empty() {
                self.metadata.remove(path);
            }
        }
    }

    /// Forget a client. With `clear`, values nobody else is registered against are removed too.
    pub(crate) fn unregister_client(&mut self, client: ClientId, clear: bool) {
        let mut orphaned = Vec::new();
        for (path, meta) in self.metadata.iter_mut() {
            if !meta.references(client) {
                continue;
            }
            meta.remove(client);
            if meta.is_empty() {
                orphaned.push(path.clone());
            }
        }
        for path in orphaned {
            self.metadata.remove(&path);
            if clear {
                self.storage.remove(&path);
            }
        }
        self.clients.remove(&client);
    }

    pub(crate) fn record(
        &mut self,
        client: ClientId,
        key: &str,
        activity_type: ActivityType,
        previous_value: Option<Value>,
        current_value: Option<Value>,
    ) {
        if self.activity.is_none() {
            return;
        }
        let client_name = self.name_of(client);
        if let Some(stream) = self.activity.as_mut() {
            stream.push(ActivityItem {
                key: key.to_string(),
                client_id: client,
                client_name,
                activity_type,
                previous_value,
                current_value,
                timestamp: Utc::now(),
            });
        }
    }

    pub(crate) fn read(&mut self, client: ClientId, path: &str) -> Result<Value, BlackboardError> {
        let Some(value) = self.storage.get(path).cloned() else {
            self.record(client, path, ActivityType::NoKey, None, None);
            return Err(BlackboardError::NoSuchKey {
                key: path.to_string(),
            });
        };
        if self.activity.is_some() {
            let activity_type = if value.is_object() || value.is_array() {
                ActivityType::Accessed
            } else {
                ActivityType::Read
            };
            self.record(client, path, activity_type, None, Some(value.clone()));
        }
        trace!(key = path, client = %client, "read");
        Ok(value)
    }

    pub(crate) fn write(
        &mut self,
        client: ClientId,
        path: &str,
        value: Value,
        overwrite: bool,
    ) -> Result<(), BlackboardError> {
        let exists = self.storage.contains_key(path);
        if exists && !overwrite {
            if self.activity.is_some() {
                let current = self.storage.get(path).cloned();
                self.record(client, path, ActivityType::NoOverwrite, current, Some(value));
            }
            return Err(BlackboardError::KeyExists {
                key: path.to_string(),
            });
        }
        let recorded = self.activity.is_some().then(|| value.clone());
        let previous = self.storage.insert(path.to_string(), value);
        let activity_type = if exists {
            ActivityType::Write
        } else {
            ActivityType::Initialised
        };
        self.record(client, path, activity_type, previous, recorded);
        trace!(key = path, client = %client, "write");
        Ok(())
    }

    /// Remove a value together with its access metadata.
    pub(crate) fn unset(&mut self, client: ClientId, path: &str) -> Result<Value, BlackboardError> {
        let Some(previous) = self.storage.remove(path) else {
            self.record(client, path, ActivityType::NoKey, None, None);
            return Err(BlackboardError::NoSuchKey {
                key: path.to_string(),
            });
        };
        self.metadata.remove(path);
        let recorded = self.activity.is_some().then(|| previous.clone());
        self.record(client, path, ActivityType::Unset, recorded, None);
        trace!(key = path, client = %client, "unset");
        Ok(previous)
    }

    pub(crate) fn contains(&self, path: &str) -> bool {
        self.storage.contains_key(path)
    }
}
