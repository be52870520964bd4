//! Object (de)serialization to and from the flat mapping a section stores.
//!
//! Two strategies are tried in order:
//!
//! 1. A [`ConfigSerializer`] registered for the exact type.
//! 2. Tag-based reflection, for types whose [`ConfigType::descriptor`] returns
//!    a [`Descriptor`] (usually via `#[derive(AutoSerialize)]`).
//!
//! A type matching neither fails with [`ConfigError::NoSerializer`].
//!
//! # Example
//!
//! ```rust
//! use config_tree::{ConfigSerializer, ConfigType, Map, Result, Serializations, Value};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Endpoint { host: String, port: i64 }
//!
//! impl ConfigType for Endpoint {}
//!
//! struct EndpointSerializer;
//!
//! impl ConfigSerializer for EndpointSerializer {
//!     type Target = Endpoint;
//!
//!     fn serialize(&self, object: &Endpoint) -> Result<Map> {
//!         let mut map = Map::new();
//!         map.insert("host".into(), Value::from(&object.host));
//!         map.insert("port".into(), Value::from(object.port));
//!         Ok(map)
//!     }
//!
//!     fn deserialize(&self, serialized: &Map) -> Result<Endpoint> {
//!         Ok(Endpoint {
//!             host: config_tree::convert_field(serialized.get("host").cloned(), "Endpoint", "host")?,
//!             port: config_tree::convert_field(serialized.get("port").cloned(), "Endpoint", "port")?,
//!         })
//!     }
//! }
//!
//! let serializations = Serializations::new();
//! serializations.register(EndpointSerializer).unwrap();
//!
//! let endpoint = Endpoint { host: "localhost".into(), port: 5432 };
//! let map = serializations.serialize(&endpoint).unwrap();
//! assert_eq!(serializations.deserialize::<Endpoint>(&map).unwrap(), endpoint);
//! ```

mod cache;
mod descriptor;
mod object;

pub use descriptor::{
    Arguments, Builder, Constructor, Descriptor, Getter, Setter, TaggedField, convert_field,
    convert_field_in,
};
pub use object::Object;

use crate::error::{ConfigError, Result};
use crate::value::Map;
use cache::ReflectionCache;
use once_cell::sync::Lazy;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// A custom serializer for one concrete type.
pub trait ConfigSerializer: Send + Sync {
    /// The type this serializer handles. At most one serializer per type can
    /// be registered.
    type Target: ConfigType;

    /// Convert `object` into a field-name → value mapping.
    fn serialize(&self, object: &Self::Target) -> Result<Map>;

    /// Rebuild an object from a mapping produced by [`serialize`](Self::serialize).
    fn deserialize(&self, serialized: &Map) -> Result<Self::Target>;
}

type BoxedSerializer<T> = Box<dyn ConfigSerializer<Target = T>>;

/// A type that can be stored in a tree as an opaque [`Object`].
///
/// The default implementation opts out of tag-based reflection, leaving
/// registered serializers as the only strategy for the type.
pub trait ConfigType: Any + Clone + fmt::Debug + PartialEq + Send + Sync {
    /// Reflection descriptor, `Some` only for types opted into tag-based reflection.
    fn descriptor() -> Option<Descriptor<Self>> {
        None
    }
}

struct Registration {
    type_name: &'static str,
    /// Holds a `BoxedSerializer<T>` for the keyed type.
    serializer: Arc<dyn Any + Send + Sync>,
}

static GLOBAL: Lazy<Arc<Serializations>> = Lazy::new(|| Arc::new(Serializations::new()));

/// The serializer registration table and reflection metadata cache.
///
/// Construct one per isolated context, or share [`Serializations::global`].
/// Registration, unregistration and cache clearing take exclusive locks;
/// lookups only take shared ones.
#[derive(Default)]
pub struct Serializations {
    serializers: RwLock<HashMap<TypeId, Registration>>,
    reflection: ReflectionCache,
}

impl Serializations {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide instance used by configs built without explicit options.
    pub fn global() -> Arc<Serializations> {
        Arc::clone(&GLOBAL)
    }

    /// Register `serializer` for its target type.
    ///
    /// # Errors
    ///
    /// Fails with [`ConfigError::AlreadyRegistered`] if the type already has a
    /// serializer; the existing registration is kept.
    pub fn register<S: ConfigSerializer + 'static>(&self, serializer: S) -> Result<()> {
        let mut serializers = self
            .serializers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let id = TypeId::of::<S::Target>();
        let target = type_name::<S::Target>();
        if serializers.contains_key(&id) {
            return Err(ConfigError::AlreadyRegistered { type_name: target });
        }

        let boxed: BoxedSerializer<S::Target> = Box::new(serializer);
        serializers.insert(
            id,
            Registration {
                type_name: target,
                serializer: Arc::new(boxed),
            },
        );
        tracing::debug!(type_name = target, "Registered serializer");
        Ok(())
    }

    /// Remove the serializer registered for `T`.
    ///
    /// # Errors
    ///
    /// Fails with [`ConfigError::NotRegistered`] if `T` has none.
    pub fn unregister<T: ConfigType>(&self) -> Result<()> {
        let removed = self
            .serializers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&TypeId::of::<T>());
        match removed {
            Some(registration) => {
                tracing::debug!(type_name = registration.type_name, "Unregistered serializer");
                Ok(())
            }
            None => Err(ConfigError::NotRegistered {
                type_name: type_name::<T>(),
            }),
        }
    }

    pub fn is_registered<T: ConfigType>(&self) -> bool {
        self.serializers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<T>())
    }

    /// Names of all types with a registered serializer, in no particular order.
    pub fn registered_types(&self) -> Vec<&'static str> {
        self.serializers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|registration| registration.type_name)
            .collect()
    }

    /// Discard all memoized reflection metadata.
    pub fn clear_cache(&self) {
        self.reflection.clear();
        tracing::debug!("Cleared reflection cache");
    }

    /// Number of types with memoized reflection metadata.
    pub fn cached_types(&self) -> usize {
        self.reflection.len()
    }

    /// Serialize `object` with the first applicable strategy.
    pub fn serialize<T: ConfigType>(&self, object: &T) -> Result<Map> {
        if let Some(serializer) = self.serializer_for::<T>() {
            return serializer.serialize(object);
        }
        match self.reflection.metadata::<T>() {
            Some(metadata) => Ok(metadata.serialize(object)),
            None => Err(ConfigError::NoSerializer {
                type_name: type_name::<T>(),
            }),
        }
    }

    /// Deserialize a `T` with the first applicable strategy.
    pub fn deserialize<T: ConfigType>(&self, serialized: &Map) -> Result<T> {
        if let Some(serializer) = self.serializer_for::<T>() {
            return serializer.deserialize(serialized);
        }
        match self.reflection.metadata::<T>() {
            Some(metadata) => metadata.deserialize(serialized, self),
            None => Err(ConfigError::NoSerializer {
                type_name: type_name::<T>(),
            }),
        }
    }

    /// Serialize a type-erased object by its concrete type.
    pub fn serialize_object(&self, object: &Object) -> Result<Map> {
        object.serialize_with(self)
    }

    fn serializer_for<T: ConfigType>(&self) -> Option<Arc<BoxedSerializer<T>>> {
        let entry = self
            .serializers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<T>())
            .map(|registration| Arc::clone(&registration.serializer))?;
        entry.downcast::<BoxedSerializer<T>>().ok()
    }
}

impl fmt::Debug for Serializations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializations")
            .field("registered", &self.registered_types())
            .field("cached_types", &self.cached_types())
            .finish()
    }
}
