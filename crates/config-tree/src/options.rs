//! Options shared by every section of one configuration tree.

use crate::serialization::Serializations;
use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

/// Separator used when no other is configured.
pub const DEFAULT_PATH_SEPARATOR: char = '.';

/// Options owned by a root [`Config`](crate::Config) and read by all of its sections.
///
/// The path separator is read on every path operation, so changing it affects
/// how later paths are parsed. Full paths of existing sections are computed
/// once at construction and keep the separator they were built with.
pub struct ConfigOptions {
    path_separator: Cell<char>,
    serializations: Arc<Serializations>,
}

impl ConfigOptions {
    /// Default options backed by [`Serializations::global`].
    pub fn new() -> Self {
        ConfigOptions {
            path_separator: Cell::new(DEFAULT_PATH_SEPARATOR),
            serializations: Serializations::global(),
        }
    }

    pub fn with_path_separator(self, separator: char) -> Self {
        self.path_separator.set(separator);
        self
    }

    /// Use an explicitly constructed serialization service.
    pub fn with_serializations(mut self, serializations: Arc<Serializations>) -> Self {
        self.serializations = serializations;
        self
    }

    pub fn path_separator(&self) -> char {
        self.path_separator.get()
    }

    pub fn set_path_separator(&self, separator: char) -> &Self {
        self.path_separator.set(separator);
        self
    }

    pub fn serializations(&self) -> &Serializations {
        &self.serializations
    }

    pub fn serializations_handle(&self) -> Arc<Serializations> {
        Arc::clone(&self.serializations)
    }
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfigOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOptions")
            .field("path_separator", &self.path_separator.get())
            .field("serializations", &self.serializations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_separator() {
        assert_eq!(ConfigOptions::new().path_separator(), DEFAULT_PATH_SEPARATOR);
    }

    #[test]
    fn test_separator_is_mutable_in_place() {
        let options = ConfigOptions::new().with_path_separator('/');
        assert_eq!(options.path_separator(), '/');
        options.set_path_separator(':');
        assert_eq!(options.path_separator(), ':');
    }

    #[test]
    fn test_isolated_serializations() {
        let isolated = Arc::new(Serializations::new());
        let options = ConfigOptions::new().with_serializations(Arc::clone(&isolated));
        assert!(Arc::ptr_eq(&options.serializations_handle(), &isolated));
    }
}
