//! Per-section key storage with recursive delegation into child sections.
//!
//! Each [`Section`] owns exactly one `Storage`. Single-segment paths are served
//! locally; multi-segment paths are split at the first separator and handed to
//! the child section's storage. Children are owned through the `Value::Section`
//! entries of their parent's map.
//!
//! Two caches are kept per storage and cleared together on every mutation of
//! the storage or of any descendant: the deep-key set and the value snapshot.

use crate::error::{ConfigError, Result};
use crate::path::{self, PathSplit};
use crate::section::Section;
use crate::value::{Map, Value};
use indexmap::IndexSet;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
pub(crate) struct Storage {
    values: RefCell<Map>,
    /// Deep keys relative to the owner, with the separator they were joined with.
    deep_keys: RefCell<Option<(char, Rc<IndexSet<String>>)>>,
    snapshot: RefCell<Option<Rc<Map>>>,
}

impl Storage {
    pub(crate) fn get(&self, owner: &Section, path: &str) -> Result<Option<Value>> {
        if path.is_empty() {
            return Ok(None);
        }

        match path::split(path, owner.path_separator()) {
            PathSplit::Local(key) => Ok(self.local(key)),
            PathSplit::Nested { first, rest } => match self.local(first) {
                None => Ok(None),
                Some(Value::Section(child)) => child.storage().get(&child, rest),
                Some(_) => Err(ConfigError::NotSection {
                    path: owner.child_path(first),
                }),
            },
        }
    }

    /// Store `value` at `path`, returning the value it replaced.
    ///
    /// With `if_absent`, an existing key is left untouched and `None` is returned.
    pub(crate) fn set(
        &self,
        owner: &Section,
        path: &str,
        value: Value,
        if_absent: bool,
    ) -> Result<Option<Value>> {
        if path.is_empty() {
            return Ok(None);
        }

        match path::split(path, owner.path_separator()) {
            PathSplit::Local(key) => {
                if if_absent && self.values.borrow().contains_key(key) {
                    return Ok(None);
                }
                self.store(owner, key, value)
            }
            PathSplit::Nested { first, rest } => {
                // An empty last segment names no key at any depth.
                if path.ends_with(owner.path_separator()) {
                    return Ok(None);
                }
                // Removing below a missing section has nothing to remove.
                if value.is_null() && self.local(first).is_none() {
                    return Ok(None);
                }
                let child = self.child_or_create(owner, first)?;
                child.storage().set(&child, rest, value, if_absent)
            }
        }
    }

    pub(crate) fn create_section(
        &self,
        owner: &Section,
        path: &str,
        force: bool,
        initials: Option<Map>,
    ) -> Result<Option<Section>> {
        if path.is_empty() {
            return Ok(None);
        }

        match path::split(path, owner.path_separator()) {
            PathSplit::Local(key) => {
                if force && self.values.borrow().contains_key(key) {
                    return Err(ConfigError::AlreadyExists {
                        path: owner.child_path(key),
                    });
                }
                let child = self.new_section(owner, key, initials.unwrap_or_default())?;
                self.insert(key, Value::Section(child.clone()));
                owner.invalidate();
                Ok(Some(child))
            }
            PathSplit::Nested { first, rest } => {
                if path.ends_with(owner.path_separator()) {
                    return Ok(None);
                }
                let child = self.child_or_create(owner, first)?;
                child.storage().create_section(&child, rest, force, initials)
            }
        }
    }

    /// Replace every key with the entries of `map`.
    pub(crate) fn reload(&self, owner: &Section, map: Map) -> Result<()> {
        self.values.borrow_mut().clear();
        self.clear_caches();

        for (key, value) in map {
            match value {
                Value::Map(initials) => {
                    self.create_section(owner, &key, false, Some(initials))?;
                }
                other => {
                    self.set(owner, &key, other, false)?;
                }
            }
        }
        owner.invalidate();
        Ok(())
    }

    pub(crate) fn keys(&self, owner: &Section, deep: bool) -> IndexSet<String> {
        if !deep {
            return self.values.borrow().keys().cloned().collect();
        }

        let separator = owner.path_separator();
        let cached = match &*self.deep_keys.borrow() {
            Some((joined_with, keys)) if *joined_with == separator => Some(Rc::clone(keys)),
            _ => None,
        };
        let keys = match cached {
            Some(keys) => keys,
            None => {
                let mut keys = IndexSet::new();
                self.collect_keys("", separator, &mut keys);
                let keys = Rc::new(keys);
                *self.deep_keys.borrow_mut() = Some((separator, Rc::clone(&keys)));
                keys
            }
        };
        (*keys).clone()
    }

    /// Deep keys qualified by `prefix`; not cached.
    pub(crate) fn keys_with_prefix(&self, prefix: &str, separator: char) -> IndexSet<String> {
        let mut keys = IndexSet::new();
        self.collect_keys(prefix, separator, &mut keys);
        keys
    }

    fn collect_keys(&self, prefix: &str, separator: char, keys: &mut IndexSet<String>) {
        for (key, value) in self.values.borrow().iter() {
            let qualified = path::join(prefix, separator, key);
            match value {
                Value::Section(child) => child.storage().collect_keys(&qualified, separator, keys),
                _ => {
                    keys.insert(qualified);
                }
            }
        }
    }

    /// Nested-mapping projection of this storage and all descendants.
    pub(crate) fn cached_values(&self) -> Rc<Map> {
        if let Some(snapshot) = &*self.snapshot.borrow() {
            return Rc::clone(snapshot);
        }

        let snapshot: Map = self
            .values
            .borrow()
            .iter()
            .map(|(key, value)| {
                let projected = match value {
                    Value::Section(child) => Value::Map((*child.storage().cached_values()).clone()),
                    other => other.clone(),
                };
                (key.clone(), projected)
            })
            .collect();
        let snapshot = Rc::new(snapshot);
        *self.snapshot.borrow_mut() = Some(Rc::clone(&snapshot));
        snapshot
    }

    pub(crate) fn clear_caches(&self) {
        self.deep_keys.borrow_mut().take();
        self.snapshot.borrow_mut().take();
    }

    pub(crate) fn len(&self) -> usize {
        self.values.borrow().len()
    }

    fn local(&self, key: &str) -> Option<Value> {
        self.values.borrow().get(key).cloned()
    }

    fn insert(&self, key: &str, value: Value) -> Option<Value> {
        self.values.borrow_mut().insert(key.to_string(), value)
    }

    fn take(&self, key: &str) -> Option<Value> {
        self.values.borrow_mut().shift_remove(key)
    }

    /// Classify `value` and store it under the local `key`.
    fn store(&self, owner: &Section, key: &str, value: Value) -> Result<Option<Value>> {
        let previous = match value {
            Value::Null => self.take(key),
            Value::Map(map) => {
                let child = self.new_section(owner, key, map)?;
                self.insert(key, Value::Section(child))
            }
            Value::Section(section) => {
                let snapshot = section.values();
                let child = self.new_section(owner, key, snapshot)?;
                self.insert(key, Value::Section(child))
            }
            Value::Object(object) => {
                match owner.options().serializations().serialize_object(&object) {
                    Ok(map) => {
                        let child = self.new_section(owner, key, map)?;
                        self.insert(key, Value::Section(child))
                    }
                    Err(err) if err.is_unserializable() => {
                        tracing::trace!(
                            type_name = object.type_name(),
                            key,
                            "No serializer; storing object as-is"
                        );
                        self.insert(key, Value::Object(object))
                    }
                    Err(err) => return Err(err),
                }
            }
            Value::List(items) => {
                let items = normalize_list(owner, items)?;
                self.insert(key, Value::List(items))
            }
            scalar => self.insert(key, scalar),
        };
        owner.invalidate();
        Ok(previous)
    }

    /// Build a detached child section populated from `initials`.
    fn new_section(&self, owner: &Section, key: &str, initials: Map) -> Result<Section> {
        let child = Section::new_child(owner, key);
        for (initial_key, value) in initials {
            child.storage().set(&child, &initial_key, value, false)?;
        }
        Ok(child)
    }

    fn child_or_create(&self, owner: &Section, key: &str) -> Result<Section> {
        match self.local(key) {
            Some(Value::Section(child)) => Ok(child),
            Some(_) => Err(ConfigError::NotSection {
                path: owner.child_path(key),
            }),
            None => {
                let child = Section::new_child(owner, key);
                self.insert(key, Value::Section(child.clone()));
                owner.invalidate();
                Ok(child)
            }
        }
    }
}

/// Element-wise normalization of a stored sequence.
///
/// Objects with a serialization strategy become mappings, objects without one
/// stay as they are, and sections are copied out as mappings.
fn normalize_list(owner: &Section, items: Vec<Value>) -> Result<Vec<Value>> {
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(object) => {
                match owner.options().serializations().serialize_object(&object) {
                    Ok(map) => Ok(Value::Map(map)),
                    Err(err) if err.is_unserializable() => Ok(Value::Object(object)),
                    Err(err) => Err(err),
                }
            }
            Value::Section(section) => Ok(Value::Map(section.values())),
            Value::List(nested) => normalize_list(owner, nested).map(Value::List),
            other => Ok(other),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::{Config, ConfigError, Map, Value};

    fn map(entries: Vec<(&str, Value)>) -> Map {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_get_through_missing_section_is_none() {
        let config = Config::new();
        assert_eq!(config.get("a.b.c").unwrap(), None);
        assert!(config.keys(false).is_empty());
    }

    #[test]
    fn test_get_through_scalar_is_not_section() {
        let config = Config::new();
        config.set("db", 1).unwrap();
        let err = config.get("db.port").unwrap_err();
        assert_eq!(
            err,
            ConfigError::NotSection {
                path: "db".to_string()
            }
        );
    }

    #[test]
    fn test_set_through_scalar_is_not_section() {
        let config = Config::new();
        config.set("a.b", 1).unwrap();
        let err = config.set("a.b.c", 2).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"a.b is not a section");
    }

    #[test]
    fn test_set_returns_previous() {
        let config = Config::new();
        assert_eq!(config.set("k", "v1").unwrap(), None);
        assert_eq!(config.set("k", "v2").unwrap(), Some(Value::from("v1")));
    }

    #[test]
    fn test_removal_keeps_order_and_creates_nothing() {
        let config = Config::new();
        config.set("a", 1).unwrap();
        config.set("b", 2).unwrap();
        config.set("c", 3).unwrap();
        config.set("b", Value::Null).unwrap();
        let keys: Vec<String> = config.keys(false).into_iter().collect();
        assert_eq!(keys, vec!["a", "c"]);

        assert_eq!(config.set("x.y", Value::Null).unwrap(), None);
        assert!(!config.contains("x").unwrap());
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let config = Config::new();
        config.set("a", 1).unwrap();
        config.set("b", 2).unwrap();
        config.set("a", 3).unwrap();
        let keys: Vec<String> = config.keys(false).into_iter().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_map_value_becomes_section() {
        let config = Config::new();
        config
            .set("owner", map(vec![("name", Value::from("X"))]))
            .unwrap();
        let owner = config.get("owner").unwrap().unwrap();
        let owner = owner.as_section().unwrap();
        assert_eq!(owner.full_path(), "owner");
        assert_eq!(owner.get("name").unwrap(), Some(Value::from("X")));
    }

    #[test]
    fn test_nested_maps_in_initials_become_sections() {
        let config = Config::new();
        let inner = map(vec![("k1", Value::from("v1"))]);
        config
            .create_child_with("structure", map(vec![("map", Value::Map(inner))]))
            .unwrap();
        assert!(config.get("structure.map").unwrap().unwrap().as_section().is_some());
        assert_eq!(config.get("structure.map.k1").unwrap(), Some(Value::from("v1")));
    }

    #[test]
    fn test_forced_creation_conflict() {
        let config = Config::new();
        config.set("db", 1).unwrap();
        let err = config.create_section("db", true, None).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"db already exists");
        assert_eq!(config.get("db").unwrap(), Some(Value::Int(1)));
    }

    #[test]
    fn test_unforced_creation_replaces() {
        let config = Config::new();
        config.set("db", 1).unwrap();
        let section = config.create_child("db").unwrap().unwrap();
        assert_eq!(section.name(), "db");
        assert!(config.get("db").unwrap().unwrap().as_section().is_some());
    }

    #[test]
    fn test_nested_creation_reuses_intermediates() {
        let config = Config::new();
        config.set("a.keep", true).unwrap();
        let leaf = config.create_section("a.b", true, None).unwrap().unwrap();
        assert_eq!(leaf.full_path(), "a.b");
        assert_eq!(config.get("a.keep").unwrap(), Some(Value::Bool(true)));
    }

    #[test]
    fn test_empty_path_is_noop() {
        let config = Config::new();
        assert_eq!(config.get("").unwrap(), None);
        assert_eq!(config.set("", 1).unwrap(), None);
        assert!(config.create_section("", true, None).unwrap().is_none());
        assert!(config.keys(false).is_empty());
    }

    #[test]
    fn test_trailing_separator_creates_nothing() {
        let config = Config::new();
        assert_eq!(config.set("a.", 1).unwrap(), None);
        assert_eq!(config.set("a.b.", 1).unwrap(), None);
        assert!(config.create_section("c.", true, None).unwrap().is_none());
        assert!(config.keys(false).is_empty());

        config.set("a.b", 1).unwrap();
        assert_eq!(config.set("a.", 2).unwrap(), None);
        let deep: Vec<String> = config.keys(true).into_iter().collect();
        assert_eq!(deep, vec!["a.b"]);
    }

    #[test]
    fn test_deep_keys_cache_invalidated_by_descendant() {
        let config = Config::new();
        config.set("a.b", 1).unwrap();
        let before = config.keys(true);
        assert!(before.contains("a.b"));

        let a = config.get_child("a").unwrap().unwrap();
        a.set("c", 2).unwrap();
        let after = config.keys(true);
        assert!(after.contains("a.c"));
        assert_eq!(config.values().get("a").unwrap().as_map().unwrap().len(), 2);
    }

    #[test]
    fn test_reload_replaces_everything() {
        let config = Config::new();
        config.set("old", 1).unwrap();
        config
            .reload(map(vec![
                ("title", Value::from("Test")),
                ("db", Value::Map(map(vec![("port", Value::from(3306))]))),
            ]))
            .unwrap();
        let keys: Vec<String> = config.keys(true).into_iter().collect();
        assert_eq!(keys, vec!["title", "db.port"]);
    }

    #[test]
    fn test_list_sections_are_copied_out() {
        let config = Config::new();
        let db = config.create_child("db").unwrap().unwrap();
        db.set("port", 1).unwrap();
        config.set("all", vec![Value::Section(db)]).unwrap();
        let all = config.get_list("all").unwrap();
        assert_eq!(all[0].as_map().unwrap().get("port"), Some(&Value::Int(1)));
    }
}
