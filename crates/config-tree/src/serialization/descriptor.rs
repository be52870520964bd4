//! Serialization descriptors for tag-based reflection.
//!
//! A [`Descriptor`] is the per-type description that stands in for runtime
//! field reflection: an ordered list of tagged fields, the parameterized
//! constructors the type offers, and an optional empty constructor. It is
//! usually generated by `#[derive(AutoSerialize)]`, but can be written by hand.
//!
//! ```rust
//! use config_tree::{
//!     Arguments, ConfigType, Descriptor, Serializations, TaggedField, Value, convert_field_in,
//! };
//! use std::any::TypeId;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Point { x: i32, y: i32 }
//!
//! impl ConfigType for Point {
//!     fn descriptor() -> Option<Descriptor<Self>> {
//!         Some(
//!             Descriptor::new()
//!                 .field(TaggedField::<Self>::new::<i32>(
//!                     "x", "x",
//!                     |p: &Self| Value::from(p.x),
//!                     |p: &mut Self, v: Option<Value>, s: &Serializations| -> config_tree::Result<()> {
//!                         p.x = convert_field_in(v, "Point", "x", s)?;
//!                         Ok(())
//!                     },
//!                 ))
//!                 .field(TaggedField::<Self>::new::<i32>(
//!                     "y", "y",
//!                     |p: &Self| Value::from(p.y),
//!                     |p: &mut Self, v: Option<Value>, s: &Serializations| -> config_tree::Result<()> {
//!                         p.y = convert_field_in(v, "Point", "y", s)?;
//!                         Ok(())
//!                     },
//!                 ))
//!                 .constructor(
//!                     vec![TypeId::of::<i32>(), TypeId::of::<i32>()],
//!                     |args: &mut Arguments| -> config_tree::Result<Self> {
//!                         Ok(Point { x: args.next()?, y: args.next()? })
//!                     },
//!                 ),
//!         )
//!     }
//! }
//! ```

use super::Serializations;
use crate::error::{ConfigError, Result};
use crate::value::{FromValue, Value};
use std::any::{TypeId, type_name};
use std::fmt;

/// Reads a tagged field out of an object.
pub type Getter<T> = fn(&T) -> Value;

/// Injects a serialized value (or its absence) into a tagged field.
///
/// The service is the one driving deserialization, for nested objects.
pub type Setter<T> = fn(&mut T, Option<Value>, &Serializations) -> Result<()>;

/// Builds an object from arguments supplied in tagged-field order.
pub type Builder<T> = for<'a, 'b> fn(&'a mut Arguments<'b>) -> Result<T>;

/// A field marked for serialization under an external tag name.
pub struct TaggedField<T> {
    tag: &'static str,
    field: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    get: Getter<T>,
    set: Setter<T>,
}

impl<T> TaggedField<T> {
    /// Describe a field of type `F` serialized under `tag`.
    pub fn new<F: 'static>(
        tag: &'static str,
        field: &'static str,
        get: Getter<T>,
        set: Setter<T>,
    ) -> Self {
        TaggedField {
            tag,
            field,
            type_id: TypeId::of::<F>(),
            type_name: type_name::<F>(),
            get,
            set,
        }
    }

    /// External name used as the key of the serialized mapping.
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// Rust identifier of the field.
    pub fn field_name(&self) -> &'static str {
        self.field
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn value(&self, object: &T) -> Value {
        (self.get)(object)
    }

    pub fn inject(
        &self,
        object: &mut T,
        value: Option<Value>,
        serializations: &Serializations,
    ) -> Result<()> {
        (self.set)(object, value, serializations)
    }
}

impl<T> fmt::Debug for TaggedField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaggedField")
            .field("tag", &self.tag)
            .field("field", &self.field)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// A constructor taking one argument per declared parameter type.
pub struct Constructor<T> {
    params: Vec<TypeId>,
    build: Builder<T>,
}

impl<T> Constructor<T> {
    pub fn params(&self) -> &[TypeId] {
        &self.params
    }

    pub(crate) fn build(&self) -> Builder<T> {
        self.build
    }
}

/// Everything tag-based reflection needs to know about a type.
pub struct Descriptor<T> {
    fields: Vec<TaggedField<T>>,
    constructors: Vec<Constructor<T>>,
    empty: Option<fn() -> T>,
}

impl<T> Descriptor<T> {
    pub fn new() -> Self {
        Descriptor {
            fields: Vec::new(),
            constructors: Vec::new(),
            empty: None,
        }
    }

    /// Append a tagged field. Declaration order is serialization order.
    pub fn field(mut self, field: TaggedField<T>) -> Self {
        self.fields.push(field);
        self
    }

    /// Offer a parameterized constructor with the given parameter types.
    ///
    /// It is only chosen when `params` equals the tagged-field types in order.
    pub fn constructor(mut self, params: Vec<TypeId>, build: Builder<T>) -> Self {
        self.constructors.push(Constructor { params, build });
        self
    }

    /// Offer an empty constructor, used with per-field injection.
    pub fn empty_constructor(mut self, empty: fn() -> T) -> Self {
        self.empty = Some(empty);
        self
    }

    pub fn fields(&self) -> &[TaggedField<T>] {
        &self.fields
    }

    pub(crate) fn into_parts(self) -> (Vec<TaggedField<T>>, Vec<Constructor<T>>, Option<fn() -> T>) {
        (self.fields, self.constructors, self.empty)
    }
}

impl<T> Default for Descriptor<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Positional constructor arguments, one per tagged field in declaration order.
pub struct Arguments<'a> {
    owner: &'static str,
    entries: std::vec::IntoIter<(&'static str, Option<Value>)>,
    serializations: &'a Serializations,
}

impl<'a> Arguments<'a> {
    pub(crate) fn new(
        owner: &'static str,
        entries: Vec<(&'static str, Option<Value>)>,
        serializations: &'a Serializations,
    ) -> Self {
        Arguments {
            owner,
            entries: entries.into_iter(),
            serializations,
        }
    }

    /// Take the next argument, converted to `A`.
    pub fn next<A: FromValue>(&mut self) -> Result<A> {
        match self.entries.next() {
            Some((key, value)) => convert_field_in(value, self.owner, key, self.serializations),
            None => Err(ConfigError::custom(format!(
                "{}: constructor takes more arguments than there are tagged fields",
                self.owner
            ))),
        }
    }

    pub fn remaining(&self) -> usize {
        self.entries.len()
    }
}

/// Convert a serialized field value, reporting the owner and tag on failure.
///
/// Nested objects are resolved through [`Serializations::global`]; use
/// [`convert_field_in`] when another service is driving deserialization.
pub fn convert_field<F: FromValue>(
    value: Option<Value>,
    owner: &'static str,
    key: &str,
) -> Result<F> {
    convert_field_in(value, owner, key, &Serializations::global())
}

/// Like [`convert_field`], resolving nested objects through `serializations`.
pub fn convert_field_in<F: FromValue>(
    value: Option<Value>,
    owner: &'static str,
    key: &str,
    serializations: &Serializations,
) -> Result<F> {
    match value {
        Some(value) => F::from_value_in(&value, serializations).ok_or_else(|| {
            ConfigError::FieldType {
                owner,
                key: key.to_string(),
                expected: type_name::<F>(),
                found: value.kind_name(),
            }
        }),
        None => F::from_missing().ok_or_else(|| ConfigError::MissingField {
            owner,
            key: key.to_string(),
        }),
    }
}
