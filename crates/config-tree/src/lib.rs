//! Hierarchical, path-addressed configuration trees.
//!
//! A configuration is a tree of named [`Section`]s holding values. Every value
//! is addressed by a path of segments joined with a configurable separator
//! (`.` by default), so `database.primary.port` names the `port` key of the
//! `primary` section of the `database` section.
//!
//! # Key Features
//!
//! - **Recursive storage**: multi-segment paths are delegated section by
//!   section, creating intermediate sections on write
//! - **Insertion order**: keys, deep keys and snapshots follow first insertion
//! - **Cached views**: deep-key sets and value snapshots are rebuilt only after
//!   a mutation in the subtree
//! - **Object serialization**: typed objects become sections, via a registered
//!   [`ConfigSerializer`] or `#[derive(AutoSerialize)]` reflection
//!
//! # Example
//!
//! ```rust
//! use config_tree::{Config, Map, Value};
//!
//! let config = Config::new();
//! config.set("title", "Test").unwrap();
//! config.set("owner.name", "Tom Preston-Werner").unwrap();
//! config.set("database.ports", [8000, 8001, 8002]).unwrap();
//!
//! let keys: Vec<String> = config.keys(true).into_iter().collect();
//! assert_eq!(keys, vec!["title", "owner.name", "database.ports"]);
//!
//! // Export as a plain nested mapping.
//! let values: Map = config.values();
//! assert!(matches!(values.get("owner"), Some(Value::Map(_))));
//! ```

mod accessors;
mod config;
mod error;
pub mod number;
mod options;
pub mod path;
mod section;
mod serialization;
mod storage;
mod value;

pub use config::Config;

pub use error::{ConfigError, Result};

pub use options::{ConfigOptions, DEFAULT_PATH_SEPARATOR};

pub use section::Section;

pub use serialization::{
    Arguments,
    Builder,
    ConfigSerializer,
    ConfigType,
    Constructor,
    Descriptor,
    Getter,
    Object,
    Serializations,
    Setter,
    TaggedField,
    convert_field,
    convert_field_in,
};

pub use value::{FromValue, Map, Value};

#[cfg(feature = "derive")]
pub use config_tree_derive::AutoSerialize;
