//! Typed and compound accessors layered over [`Section::get`] and [`Section::set`].

use crate::error::Result;
use crate::number;
use crate::section::Section;
use crate::serialization::ConfigType;
use crate::value::{FromValue, Map, Value};

impl Section {
    pub fn contains(&self, path: &str) -> Result<bool> {
        Ok(self.get(path)?.is_some())
    }

    /// Value at `path` converted to `T`, or `None` when absent or not convertible.
    pub fn get_as<T: FromValue>(&self, path: &str) -> Result<Option<T>> {
        Ok(self.get(path)?.and_then(|value| T::from_value(&value)))
    }

    pub fn get_or_default(&self, path: &str, default: impl Into<Value>) -> Result<Value> {
        Ok(self.get(path)?.unwrap_or_else(|| default.into()))
    }

    /// Store `new` unless the key is absent or already holds `old`.
    ///
    /// Returns whether `new` was stored. A present value that differs from
    /// `old` is overwritten; one equal to `old` is left alone.
    pub fn replace(&self, path: &str, old: &Value, new: impl Into<Value>) -> Result<bool> {
        match self.get(path)? {
            None => Ok(false),
            Some(current) if current == *old => Ok(false),
            Some(_) => {
                self.set(path, new)?;
                Ok(true)
            }
        }
    }

    /// If `path` is absent, store the non-null result of `mapping` and return it.
    /// Otherwise return the current value.
    pub fn compute_if_absent<F>(&self, path: &str, mapping: F) -> Result<Option<Value>>
    where
        F: FnOnce(&str) -> Value,
    {
        if let Some(current) = self.get(path)? {
            return Ok(Some(current));
        }
        let value = mapping(path);
        if value.is_null() {
            return Ok(None);
        }
        self.set(path, value)?;
        self.get(path)
    }

    /// If `path` is present, replace it with the result of `remapping`.
    ///
    /// A null result removes the key.
    pub fn compute_if_present<F>(&self, path: &str, remapping: F) -> Result<Option<Value>>
    where
        F: FnOnce(&str, Value) -> Value,
    {
        let Some(current) = self.get(path)? else {
            return Ok(None);
        };
        self.set(path, remapping(path, current))?;
        self.get(path)
    }

    /// Replace `path` with the result of `remapping` applied to its current value.
    ///
    /// A null result removes the key.
    pub fn compute<F>(&self, path: &str, remapping: F) -> Result<Option<Value>>
    where
        F: FnOnce(&str, Option<Value>) -> Value,
    {
        let current = self.get(path)?;
        let value = remapping(path, current.clone());
        if value.is_null() {
            if current.is_some() {
                self.remove(path)?;
            }
            return Ok(None);
        }
        self.set(path, value)?;
        self.get(path)
    }

    /// Store `value`, or `remapping(current, value)` if `path` is present.
    pub fn merge<F>(&self, path: &str, value: impl Into<Value>, remapping: F) -> Result<Option<Value>>
    where
        F: FnOnce(Value, Value) -> Value,
    {
        let value = value.into();
        let merged = match self.get(path)? {
            Some(current) => remapping(current, value),
            None => value,
        };
        self.set(path, merged)?;
        self.get(path)
    }

    /// Whether `path` holds an integer within `i32` range.
    pub fn is_int(&self, path: &str) -> Result<bool> {
        Ok(matches!(self.get(path)?, Some(Value::Int(i)) if i32::try_from(i).is_ok()))
    }

    pub fn get_int(&self, path: &str) -> Result<i32> {
        Ok(number::to_int(self.get(path)?.as_ref()))
    }

    pub fn is_long(&self, path: &str) -> Result<bool> {
        Ok(matches!(self.get(path)?, Some(Value::Int(_))))
    }

    pub fn get_long(&self, path: &str) -> Result<i64> {
        Ok(number::to_long(self.get(path)?.as_ref()))
    }

    pub fn is_double(&self, path: &str) -> Result<bool> {
        Ok(matches!(self.get(path)?, Some(Value::Float(_))))
    }

    pub fn get_double(&self, path: &str) -> Result<f64> {
        Ok(number::to_double(self.get(path)?.as_ref()))
    }

    pub fn is_boolean(&self, path: &str) -> Result<bool> {
        Ok(matches!(self.get(path)?, Some(Value::Bool(_))))
    }

    /// `true` for a stored `true`, or a string equal to `"true"` ignoring case.
    pub fn get_boolean(&self, path: &str) -> Result<bool> {
        Ok(match self.get(path)? {
            Some(Value::Bool(b)) => b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        })
    }

    pub fn is_string(&self, path: &str) -> Result<bool> {
        Ok(matches!(self.get(path)?, Some(Value::String(_))))
    }

    /// String at `path`; other present values are rendered with `Display`.
    pub fn get_string(&self, path: &str) -> Result<Option<String>> {
        Ok(self.get(path)?.map(|value| match value {
            Value::String(s) => s,
            other => other.to_string(),
        }))
    }

    pub fn is_list(&self, path: &str) -> Result<bool> {
        Ok(matches!(self.get(path)?, Some(Value::List(_))))
    }

    /// List at `path`, or an empty list if absent or not a list.
    pub fn get_list(&self, path: &str) -> Result<Vec<Value>> {
        Ok(match self.get(path)? {
            Some(Value::List(items)) => items,
            _ => Vec::new(),
        })
    }

    pub fn get_string_list(&self, path: &str) -> Result<Vec<String>> {
        Ok(self
            .get_list(path)?
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect())
    }

    pub fn get_int_list(&self, path: &str) -> Result<Vec<i32>> {
        Ok(self.get_list(path)?.iter().map(|item| number::to_int(Some(item))).collect())
    }

    pub fn get_long_list(&self, path: &str) -> Result<Vec<i64>> {
        Ok(self.get_list(path)?.iter().map(|item| number::to_long(Some(item))).collect())
    }

    pub fn get_double_list(&self, path: &str) -> Result<Vec<f64>> {
        Ok(self.get_list(path)?.iter().map(|item| number::to_double(Some(item))).collect())
    }

    /// Mapping elements of the list at `path`; other elements are skipped.
    pub fn get_map_list(&self, path: &str) -> Result<Vec<Map>> {
        Ok(self
            .get_list(path)?
            .into_iter()
            .filter_map(|item| match item {
                Value::Map(map) => Some(map),
                _ => None,
            })
            .collect())
    }

    pub fn has_child(&self, path: &str) -> Result<bool> {
        Ok(matches!(self.get(path)?, Some(Value::Section(_))))
    }

    pub fn get_child(&self, path: &str) -> Result<Option<Section>> {
        Ok(match self.get(path)? {
            Some(Value::Section(section)) => Some(section),
            _ => None,
        })
    }

    /// Rebuild a `T` stored at `path`.
    ///
    /// A section is deserialized through the tree's serialization service; an
    /// object kept as-is is returned if it is a `T`.
    ///
    /// # Errors
    ///
    /// Deserialization errors are returned, including
    /// [`ConfigError::NoSerializer`](crate::ConfigError::NoSerializer) for a
    /// section when `T` has no strategy.
    pub fn get_object<T: ConfigType>(&self, path: &str) -> Result<Option<T>> {
        match self.get(path)? {
            Some(Value::Section(section)) => self
                .options()
                .serializations()
                .deserialize::<T>(&section.cached_values())
                .map(Some),
            Some(Value::Object(object)) => Ok(object.downcast_ref::<T>().cloned()),
            _ => Ok(None),
        }
    }

    /// Rebuild every `T` in the list at `path`.
    ///
    /// Mappings are deserialized, objects of type `T` are cloned, and anything
    /// else is skipped.
    pub fn get_object_list<T: ConfigType>(&self, path: &str) -> Result<Vec<T>> {
        let serializations = self.options().serializations();
        let mut objects = Vec::new();
        for item in self.get_list(path)? {
            match item {
                Value::Map(map) => objects.push(serializations.deserialize::<T>(&map)?),
                Value::Object(object) => {
                    if let Some(object) = object.downcast_ref::<T>() {
                        objects.push(object.clone());
                    }
                }
                _ => {}
            }
        }
        Ok(objects)
    }
}
