//! The root of a configuration tree.

use crate::options::ConfigOptions;
use crate::section::Section;
use std::ops::Deref;
use std::rc::Rc;

/// A configuration tree: the root [`Section`] together with the options its
/// sections share.
///
/// `Config` dereferences to its root section, so every section operation is
/// available directly. The tree is single-threaded; the serialization service
/// in its options may be shared across threads.
///
/// ```rust
/// use config_tree::{Config, Value};
///
/// let config = Config::new();
/// config.set("database.port", 5432).unwrap();
/// assert_eq!(config.get("database.port").unwrap(), Some(Value::Int(5432)));
/// assert!(config.has_child("database").unwrap());
/// ```
pub struct Config {
    root: Section,
}

impl Config {
    /// An empty tree with default options and the global serialization service.
    pub fn new() -> Self {
        Self::with_options(ConfigOptions::new())
    }

    pub fn with_options(options: ConfigOptions) -> Self {
        Config {
            root: Section::new_root(Rc::new(options)),
        }
    }

    /// The root section.
    pub fn section(&self) -> &Section {
        &self.root
    }

    /// Give up the root handle. The tree stays alive as long as the handle does.
    pub fn into_section(self) -> Section {
        self.root
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Config {
    type Target = Section;

    fn deref(&self) -> &Section {
        &self.root
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("options", self.root.options())
            .field("values", &self.root.values())
            .finish()
    }
}
