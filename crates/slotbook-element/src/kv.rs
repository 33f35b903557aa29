use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use slotbook_types::Value;

use crate::error::{ElementError, ElementResult};

/// A key/value map. Only keys already present may be indexed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValuePair {
    #[serde(default)]
    store: BTreeMap<String, Value>,
    #[serde(default)]
    indexed_keys: BTreeSet<String>,
}

impl KeyValuePair {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &BTreeMap<String, Value> {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn indexed_keys(&self) -> &BTreeSet<String> {
        &self.indexed_keys
    }

    pub fn is_indexed(&self, key: &str) -> bool {
        self.indexed_keys.contains(key)
    }

    /// Insert or overwrite `key`. Returns the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.store.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> ElementResult<&Value> {
        self.store
            .get(key)
            .ok_or_else(|| ElementError::UnknownKey(key.to_string()))
    }

    /// Remove `key`, dropping it from the index set as well.
    pub fn delete(&mut self, key: &str) -> ElementResult<Value> {
        let removed = self
            .store
            .remove(key)
            .ok_or_else(|| ElementError::UnknownKey(key.to_string()))?;
        self.indexed_keys.remove(key);
        Ok(removed)
    }

    pub fn set_index(&mut self, key: &str) -> ElementResult<()> {
        if !self.store.contains_key(key) {
            return Err(ElementError::UnknownKey(key.to_string()));
        }
        self.indexed_keys.insert(key.to_string());
        Ok(())
    }

    pub fn unset_index(&mut self, key: &str) -> ElementResult<()> {
        if !self.indexed_keys.remove(key) {
            return Err(ElementError::NotIndexed(key.to_string()));
        }
        Ok(())
    }

    /// Value of an indexed key.
    pub fn lookup(&self, key: &str) -> ElementResult<&Value> {
        if !self.indexed_keys.contains(key) {
            return Err(ElementError::NotIndexed(key.to_string()));
        }
        self.get(key)
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &Value> {
        self.store.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_delete() {
        let mut kv = KeyValuePair::new();
        assert_eq!(kv.set("a", Value::Int(1)), None);
        assert_eq!(kv.set("a", Value::Int(2)), Some(Value::Int(1)));
        assert_eq!(kv.get("a").unwrap(), &Value::Int(2));
        assert_eq!(kv.delete("a").unwrap(), Value::Int(2));
        assert_eq!(kv.get("a"), Err(ElementError::UnknownKey("a".into())));
        assert!(kv.delete("a").is_err());
    }

    #[test]
    fn index_requires_existing_key() {
        let mut kv = KeyValuePair::new();
        assert_eq!(kv.set_index("x"), Err(ElementError::UnknownKey("x".into())));
        kv.set("x", Value::Bool(true));
        kv.set_index("x").unwrap();
        assert_eq!(kv.lookup("x").unwrap(), &Value::Bool(true));
    }

    #[test]
    fn deleting_key_drops_index() {
        let mut kv = KeyValuePair::new();
        kv.set("x", Value::Int(1));
        kv.set_index("x").unwrap();
        kv.delete("x").unwrap();
        assert!(!kv.is_indexed("x"));
        assert_eq!(kv.unset_index("x"), Err(ElementError::NotIndexed("x".into())));
    }

    #[test]
    fn lookup_requires_index() {
        let mut kv = KeyValuePair::new();
        kv.set("x", Value::Int(1));
        assert_eq!(kv.lookup("x"), Err(ElementError::NotIndexed("x".into())));
    }
}
