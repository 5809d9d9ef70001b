use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::activity::ActivityType;
use crate::error::Result;
use crate::metadata::{Access, ClientId};
use crate::{key, Blackboard, BlackboardError, RegistrationError};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Registration {
    access: Access,
    /// Store path the key actually lives at. Differs from the key when remapped.
    path: String,
}

/// A namespaced, access-scoped view onto a [`Blackboard`].
///
/// Keys must be registered before use. Relative keys resolve against the client's namespace;
/// absolute keys (leading `/`) are used as-is, even outside it. A registration may
/// remap the key to a different store path, after which every access through the key reads and
/// writes the remapped path.
///
/// Dropping a client removes its registrations from the store metadata. Stored values stay.
#[derive(Debug)]
pub struct Client {
    id: ClientId,
    name: String,
    namespace: String,
    blackboard: Blackboard,
    keys: BTreeMap<String, Registration>,
}

impl Client {
    pub(crate) fn attach(blackboard: Blackboard, name: String, namespace: String) -> Self {
        let id = ClientId::new();
        blackboard.with_inner(|inner| inner.add_client(id, &name));
        Self {
            id,
            name,
            namespace,
            blackboard,
            keys: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn register_key(&mut self, key: &str, access: Access) -> std::result::Result<(), RegistrationError> {
        self.register(key, access, None)
    }

    /// Register `key`, redirecting every access through it to the absolute path `remap_to`.
    pub fn register_key_remapped(
        &mut self,
        key: &str,
        access: Access,
        remap_to: &str,
    ) -> std::result::Result<(), RegistrationError> {
        self.register(key, access, Some(remap_to))
    }

    fn register(
        &mut self,
        name: &str,
        access: Access,
        remap_to: Option<&str>,
    ) -> std::result::Result<(), RegistrationError> {
        let key = key::resolve(&self.namespace, name)?;
        let path = match remap_to {
            Some(target) => key::absolute(target)?,
            None => key.clone(),
        };
        let id = self.id;
        let previous = self.keys.get(&key).map(|r| r.path.clone());
        self.blackboard.with_inner(|inner| {
            inner.register(id, &path, access)?;
            if let Some(previous) = previous.filter(|p| *p != path) {
                inner.unregister_key(id, &previous);
            }
            Ok::<_, RegistrationError>(())
        })?;
        self.keys.insert(key, Registration { access, path });
        Ok(())
    }

    /// Drop one registration. Returns `false` if the key was not registered.
    pub fn unregister_key(&mut self, name: &str) -> bool {
        let Ok(key) = key::resolve(&self.namespace, name) else {
            return false;
        };
        let Some(registration) = self.keys.remove(&key) else {
            return false;
        };
        let id = self.id;
        self.blackboard
            .with_inner(|inner| inner.unregister_key(id, &registration.path));
        true
    }

    /// Drop every registration. With `clear`, values no other client references are removed.
    pub fn unregister(&mut self, clear: bool) {
        let id = self.id;
        self.keys.clear();
        self.blackboard
            .with_inner(|inner| inner.unregister_client(id, clear));
    }

    pub fn is_registered(&self, name: &str) -> bool {
        key::resolve(&self.namespace, name)
            .map(|key| self.keys.contains_key(&key))
            .unwrap_or(false)
    }

    pub fn access(&self, name: &str) -> Option<Access> {
        let key = key::resolve(&self.namespace, name).ok()?;
        self.keys.get(&key).map(|r| r.access)
    }

    /// Registered keys with their access and the store path they resolve to.
    pub fn registrations(&self) -> impl Iterator<Item = (&str, Access, &str)> {
        self.keys
            .iter()
            .map(|(key, r)| (key.as_str(), r.access, r.path.as_str()))
    }

    /// Store paths this client touches (after remapping).
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.keys.values().map(|r| r.path.as_str())
    }

    pub fn remappings(&self) -> BTreeMap<String, String> {
        self.keys
            .iter()
            .filter(|(key, r)| **key != r.path)
            .map(|(key, r)| (key.clone(), r.path.clone()))
            .collect()
    }

    /// Whether a registered key currently holds a value.
    pub fn exists(&self, name: &str) -> Result<bool> {
        let key = self.resolve(name, Access::Read)?;
        let Some(registration) = self.keys.get(&key) else {
            return Err(self.denied(&key, Access::Read));
        };
        let path = registration.path.clone();
        Ok(self.blackboard.with_inner(|inner| inner.contains(&path)))
    }

    /// Read a value. `name` may carry an attribute path into a structured value,
    /// e.g. `nested.foo` reads field `foo` of the object stored under `nested`.
    pub fn get(&self, name: &str) -> Result<Value> {
        // The attribute path starts at the first `.` of the last segment.
        let last = name.rfind(key::SEPARATOR).map_or(0, |i| i + 1);
        let (head, attribute) = match name[last..].find('.') {
            Some(dot) => (&name[..last + dot], Some(&name[last + dot + 1..])),
            None => (name, None),
        };
        let key = self.resolve(head, Access::Read)?;
        let Some(registration) = self.keys.get(&key) else {
            return Err(self.denied(&key, Access::Read));
        };
        let id = self.id;
        let value = self
            .blackboard
            .with_inner(|inner| inner.read(id, &registration.path))?;
        match attribute {
            None => Ok(value),
            Some(attribute) => lookup_attribute(&value, attribute)
                .cloned()
                .ok_or_else(|| BlackboardError::NoSuchKey {
                    key: format!("{}.{attribute}", registration.path),
                }),
        }
    }

    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self.get(name)?;
        serde_json::from_value(value).map_err(|source| BlackboardError::TypeMismatch {
            key: name.to_string(),
            expected: std::any::type_name::<T>(),
            source,
        })
    }

    /// Write a value. With `overwrite == false` an existing value is left untouched and
    /// [`BlackboardError::KeyExists`] is returned.
    pub fn set(&self, name: &str, value: impl Into<Value>, overwrite: bool) -> Result<()> {
        let (path, access) = self.writable_path(name)?;
        let id = self.id;
        let value = value.into();
        self.blackboard.with_inner(|inner| {
            if !inner.restore_registration(id, &path, access) {
                return Err(BlackboardError::AccessDenied {
                    client: self.name.clone(),
                    key: path.clone(),
                    access: Access::Write,
                });
            }
            inner.write(id, &path, value, overwrite)
        })
    }

    pub fn set_as<T: Serialize>(&self, name: &str, value: &T, overwrite: bool) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|source| BlackboardError::Serialization {
            key: name.to_string(),
            source,
        })?;
        self.set(name, value, overwrite)
    }

    /// Remove a value and its access metadata. Later reads fail with `NoSuchKey`.
    pub fn unset(&self, name: &str) -> Result<()> {
        let (path, _) = self.writable_path(name)?;
        let id = self.id;
        self.blackboard
            .with_inner(|inner| inner.unset(id, &path))
            .map(|_| ())
    }

    fn writable_path(&self, name: &str) -> Result<(String, Access)> {
        let key = self.resolve(name, Access::Write)?;
        match self.keys.get(&key) {
            Some(registration) if registration.access.can_write() => {
                Ok((registration.path.clone(), registration.access))
            }
            _ => Err(self.denied(&key, Access::Write)),
        }
    }

    fn resolve(&self, name: &str, access: Access) -> Result<String> {
        key::resolve(&self.namespace, name).map_err(|err| {
            let denied = self.denied(name, access);
            match err {
                RegistrationError::NotInNamespace { key, namespace } => {
                    BlackboardError::NotInNamespace { key, namespace }
                }
                // Nothing can be registered under a malformed key.
                _ => denied,
            }
        })
    }

    fn denied(&self, key: &str, access: Access) -> BlackboardError {
        let id = self.id;
        self.blackboard
            .with_inner(|inner| inner.record(id, key, ActivityType::AccessDenied, None, None));
        warn!(client = %self.name, key, %access, "blackboard access denied");
        BlackboardError::AccessDenied {
            client: self.name.clone(),
            key: key.to_string(),
            access,
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.unregister(false);
    }
}

fn lookup_attribute<'a>(value: &'a Value, attribute: &str) -> Option<&'a Value> {
    attribute
        .split('.')
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}
