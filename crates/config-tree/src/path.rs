//! Path resolution for separator-delimited section paths.

/// Result of splitting a path at its first separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSplit<'a> {
    /// The path contains no separator and addresses a local key.
    Local(&'a str),
    /// The path addresses something below `first`; `rest` is a full path
    /// relative to that child.
    Nested { first: &'a str, rest: &'a str },
}

/// Split `path` at the first occurrence of `separator`.
///
/// Callers treat the empty path as "nothing addressed" before splitting.
pub fn split(path: &str, separator: char) -> PathSplit<'_> {
    match path.split_once(separator) {
        Some((first, rest)) => PathSplit::Nested { first, rest },
        None => PathSplit::Local(path),
    }
}

/// Qualify `name` with a parent path, omitting the separator under the root.
pub fn join(parent_path: &str, separator: char, name: &str) -> String {
    if parent_path.is_empty() {
        name.to_string()
    } else {
        let mut path = String::with_capacity(parent_path.len() + name.len() + 1);
        path.push_str(parent_path);
        path.push(separator);
        path.push_str(name);
        path
    }
}
