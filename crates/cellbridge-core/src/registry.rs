//! Type-keyed registry shared by renderers and custom converters.
//!
//! At most one entry per [`TypeKey`]. Lookup walks [`TypeInfo::lineage`]
//! and reports which key matched; callers supply their own default for a
//! miss.

use crate::types::{TypeInfo, TypeKey};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct TypeRegistry<T> {
    entries: HashMap<TypeKey, T>,
}

impl<T> Default for TypeRegistry<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> TypeRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; returns the entry previously registered for `key`.
    pub fn register(&mut self, key: impl Into<TypeKey>, entry: T) -> Option<T> {
        self.entries.insert(key.into(), entry)
    }

    pub fn unregister(&mut self, key: &TypeKey) -> Option<T> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &TypeKey) -> Option<&T> {
        self.entries.get(key)
    }

    /// First registered entry along the lineage of `info`.
    pub fn lookup(&self, info: &TypeInfo) -> Option<(TypeKey, &T)> {
        info.lineage()
            .into_iter()
            .find_map(|key| self.entries.get(&key).map(|entry| (key, entry)))
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&TypeKey> {
        let mut keys: Vec<&TypeKey> = self.entries.keys().collect();
        keys.sort();
        keys
    }
}
