//! Type-erased objects awaiting serialization.

use super::{ConfigType, Serializations};
use crate::error::Result;
use crate::value::Map;
use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

type Erased = dyn Any + Send + Sync;

/// An opaque typed object stored as a [`Value`](crate::Value).
///
/// The object remembers its concrete type so the serialization subsystem can
/// look up a strategy for it after erasure.
#[derive(Clone)]
pub struct Object {
    value: Arc<Erased>,
    type_id: TypeId,
    type_name: &'static str,
    serialize: fn(&Erased, &Serializations) -> Result<Map>,
    eq: fn(&Erased, &Erased) -> bool,
    debug: fn(&Erased, &mut fmt::Formatter<'_>) -> fmt::Result,
}

impl Object {
    pub fn new<T: ConfigType>(value: T) -> Self {
        Object {
            value: Arc::new(value),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            serialize: serialize_erased::<T>,
            eq: eq_erased::<T>,
            debug: debug_erased::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        (*self.value).downcast_ref::<T>()
    }

    /// Serialize through `serializations` using the object's concrete type.
    pub fn serialize_with(&self, serializations: &Serializations) -> Result<Map> {
        (self.serialize)(&*self.value, serializations)
    }
}

fn serialize_erased<T: ConfigType>(value: &Erased, serializations: &Serializations) -> Result<Map> {
    match value.downcast_ref::<T>() {
        Some(object) => serializations.serialize(object),
        None => Err(crate::ConfigError::NoSerializer {
            type_name: type_name::<T>(),
        }),
    }
}

fn eq_erased<T: ConfigType>(a: &Erased, b: &Erased) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn debug_erased<T: ConfigType>(value: &Erased, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value.downcast_ref::<T>() {
        Some(object) => fmt::Debug::fmt(object, f),
        None => f.write_str(type_name::<T>()),
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && (self.eq)(&*self.value, &*other.value)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.debug)(&*self.value, f)
    }
}
