//! Sections: named nodes of a configuration tree.

use crate::error::Result;
use crate::options::ConfigOptions;
use crate::path;
use crate::storage::Storage;
use crate::value::{Map, Value};
use indexmap::IndexSet;
use std::fmt;
use std::rc::{Rc, Weak};

struct Node {
    name: String,
    full_path: String,
    parent: Weak<Node>,
    root: Weak<Node>,
    options: Rc<ConfigOptions>,
    storage: Storage,
}

/// A handle to one node of a configuration tree.
///
/// Handles are cheap to clone and compare by identity. A section is owned by
/// the storage of its parent (the root by its [`Config`](crate::Config)), and
/// only holds weak back-references to its parent and root. Once a section is
/// replaced or removed from its parent it keeps working as a detached subtree,
/// but [`parent`](Section::parent) may stop resolving.
#[derive(Clone)]
pub struct Section {
    node: Rc<Node>,
}

impl Section {
    pub(crate) fn new_root(options: Rc<ConfigOptions>) -> Self {
        let node = Rc::new_cyclic(|root| Node {
            name: String::new(),
            full_path: String::new(),
            parent: Weak::new(),
            root: root.clone(),
            options,
            storage: Storage::default(),
        });
        Section { node }
    }

    pub(crate) fn new_child(parent: &Section, name: &str) -> Self {
        let full_path = parent.child_path(name);
        tracing::trace!(path = %full_path, "Creating section");
        let node = Rc::new(Node {
            name: name.to_string(),
            full_path,
            parent: Rc::downgrade(&parent.node),
            root: parent.node.root.clone(),
            options: Rc::clone(&parent.node.options),
            storage: Storage::default(),
        });
        Section { node }
    }

    /// Key under which this section is stored in its parent. Empty for the root.
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Separator-joined names from the root down to this section.
    ///
    /// Computed once, with the separator in effect when the section was created.
    pub fn full_path(&self) -> &str {
        &self.node.full_path
    }

    pub fn parent(&self) -> Option<Section> {
        self.node.parent.upgrade().map(|node| Section { node })
    }

    pub fn root(&self) -> Option<Section> {
        self.node.root.upgrade().map(|node| Section { node })
    }

    pub fn is_root(&self) -> bool {
        // The root is the only node whose root reference points at itself.
        std::ptr::eq(self.node.root.as_ptr(), Rc::as_ptr(&self.node))
    }

    pub fn options(&self) -> &ConfigOptions {
        &self.node.options
    }

    pub fn path_separator(&self) -> char {
        self.node.options.path_separator()
    }

    /// Value stored at `path`, or `None` if any segment is absent.
    ///
    /// # Errors
    ///
    /// Fails with [`ConfigError::NotSection`](crate::ConfigError::NotSection)
    /// when an intermediate segment holds a non-section value.
    pub fn get(&self, path: &str) -> Result<Option<Value>> {
        self.storage().get(self, path)
    }

    /// Store `value` at `path`, creating missing intermediate sections.
    ///
    /// Storing [`Value::Null`] removes the key. Mappings become child sections,
    /// objects are serialized when a strategy exists. Returns the replaced value.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<Option<Value>> {
        self.storage().set(self, path, value.into(), false)
    }

    /// Like [`set`](Self::set), but leaves an existing key untouched.
    pub fn set_if_absent(&self, path: &str, value: impl Into<Value>) -> Result<Option<Value>> {
        self.storage().set(self, path, value.into(), true)
    }

    /// Remove the value at `path`, returning it. Removing a missing key is a no-op.
    pub fn remove(&self, path: &str) -> Result<Option<Value>> {
        self.storage().set(self, path, Value::Null, false)
    }

    /// Create a section at `path`, populated from `initials`.
    ///
    /// Existing intermediate sections are reused. With `force`, an existing
    /// value at the final segment is an error; without it, the value is replaced.
    ///
    /// # Errors
    ///
    /// Fails with [`ConfigError::AlreadyExists`](crate::ConfigError::AlreadyExists)
    /// on a forced conflict, or [`ConfigError::NotSection`](crate::ConfigError::NotSection)
    /// when an intermediate is a non-section value.
    pub fn create_section(
        &self,
        path: &str,
        force: bool,
        initials: Option<Map>,
    ) -> Result<Option<Section>> {
        self.storage().create_section(self, path, force, initials)
    }

    /// Unforced creation of an empty section.
    pub fn create_child(&self, path: &str) -> Result<Option<Section>> {
        self.create_section(path, false, None)
    }

    pub fn create_child_with(&self, path: &str, initials: Map) -> Result<Option<Section>> {
        self.create_section(path, false, Some(initials))
    }

    /// Local keys, or with `deep`, the leaf paths of the whole subtree in
    /// first-insertion order, relative to this section.
    pub fn keys(&self, deep: bool) -> IndexSet<String> {
        self.storage().keys(self, deep)
    }

    /// Deep keys of this subtree qualified as seen from `ancestor`.
    ///
    /// If `ancestor` is not actually an ancestor, the keys are qualified from
    /// the root.
    pub fn keys_relative_to(&self, ancestor: &Section) -> IndexSet<String> {
        let separator = self.path_separator();
        let mut names = Vec::new();
        let mut current = Some(self.clone());
        while let Some(section) = current {
            if &section == ancestor || section.is_root() {
                break;
            }
            names.push(section.name().to_string());
            current = section.parent();
        }
        let prefix = names
            .iter()
            .rev()
            .fold(String::new(), |prefix, name| path::join(&prefix, separator, name));
        self.storage().keys_with_prefix(&prefix, separator)
    }

    /// A nested-mapping snapshot of this subtree.
    pub fn values(&self) -> Map {
        (*self.cached_values()).clone()
    }

    /// Shared snapshot, rebuilt only after a mutation in this subtree.
    pub fn cached_values(&self) -> Rc<Map> {
        self.storage().cached_values()
    }

    /// Replace the whole content of this section with `map`.
    pub fn reload(&self, map: Map) -> Result<()> {
        tracing::debug!(path = %self.full_path(), keys = map.len(), "Reloading section");
        self.storage().reload(self, map)
    }

    /// Number of local keys.
    pub fn len(&self) -> usize {
        self.storage().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn storage(&self) -> &Storage {
        &self.node.storage
    }

    pub(crate) fn child_path(&self, name: &str) -> String {
        path::join(self.full_path(), self.path_separator(), name)
    }

    /// Drop cached keys and snapshots of this section and all its ancestors.
    pub(crate) fn invalidate(&self) {
        self.storage().clear_caches();
        let mut parent = self.parent();
        while let Some(section) = parent {
            section.storage().clear_caches();
            parent = section.parent();
        }
    }
}

impl PartialEq for Section {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("name", &self.node.name)
            .field("full_path", &self.node.full_path)
            .finish()
    }
}
