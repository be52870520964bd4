//! Memoized reflection metadata, one entry per type.

use super::{ConfigType, Serializations};
use super::descriptor::{Arguments, Builder, Descriptor, TaggedField};
use crate::error::{ConfigError, Result};
use crate::value::Map;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// How a reflective type is constructed during deserialization.
pub(crate) enum ConstructionStrategy<T> {
    /// A constructor whose parameters match the tagged-field types.
    Parameterized(Builder<T>),
    /// Empty constructor followed by field injection.
    Empty(fn() -> T),
    /// Neither is available; deserialization is a construction error.
    Unavailable,
}

pub(crate) struct TypeMetadata<T> {
    fields: Vec<TaggedField<T>>,
    strategy: ConstructionStrategy<T>,
}

impl<T: 'static> TypeMetadata<T> {
    fn from_descriptor(descriptor: Descriptor<T>) -> Self {
        let (fields, constructors, empty) = descriptor.into_parts();
        let field_types: Vec<TypeId> = fields.iter().map(TaggedField::type_id).collect();

        let strategy = match constructors.iter().find(|c| c.params() == field_types.as_slice()) {
            Some(constructor) => ConstructionStrategy::Parameterized(constructor.build()),
            None => match empty {
                Some(empty) => ConstructionStrategy::Empty(empty),
                None => ConstructionStrategy::Unavailable,
            },
        };

        TypeMetadata { fields, strategy }
    }

    pub(crate) fn fields(&self) -> &[TaggedField<T>] {
        &self.fields
    }

    pub(crate) fn strategy(&self) -> &ConstructionStrategy<T> {
        &self.strategy
    }

    /// Ordered tag-name → field-value mapping. A repeated tag keeps its first field.
    pub(crate) fn serialize(&self, object: &T) -> Map {
        let mut map = Map::with_capacity(self.fields.len());
        for field in &self.fields {
            if !map.contains_key(field.tag()) {
                map.insert(field.tag().to_string(), field.value(object));
            }
        }
        map
    }

    /// Rebuild a `T`, resolving nested objects through `serializations`.
    pub(crate) fn deserialize(
        &self,
        serialized: &Map,
        serializations: &Serializations,
    ) -> Result<T> {
        match &self.strategy {
            ConstructionStrategy::Parameterized(build) => {
                let entries = self
                    .fields
                    .iter()
                    .map(|field| (field.tag(), serialized.get(field.tag()).cloned()))
                    .collect();
                build(&mut Arguments::new(type_name::<T>(), entries, serializations))
            }
            ConstructionStrategy::Empty(empty) => {
                let mut object = empty();
                for field in &self.fields {
                    // Absent keys keep the value the empty constructor chose.
                    if let Some(value) = serialized.get(field.tag()) {
                        field.inject(&mut object, Some(value.clone()), serializations)?;
                    }
                }
                Ok(object)
            }
            ConstructionStrategy::Unavailable => Err(ConfigError::Construction {
                type_name: type_name::<T>(),
            }),
        }
    }
}

/// Process-wide table of [`TypeMetadata`], keyed by type.
#[derive(Default)]
pub(crate) struct ReflectionCache {
    entries: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl ReflectionCache {
    /// Metadata for `T`, built from its descriptor on first use.
    ///
    /// Returns `None` for types that are not opted into reflection.
    pub(crate) fn metadata<T: ConfigType>(&self) -> Option<Arc<TypeMetadata<T>>> {
        let id = TypeId::of::<T>();
        let cached = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned();
        if let Some(entry) = cached {
            return entry.downcast::<TypeMetadata<T>>().ok();
        }

        let metadata = TypeMetadata::from_descriptor(T::descriptor()?);
        tracing::trace!(
            type_name = type_name::<T>(),
            fields = metadata.fields().len(),
            "Caching reflection metadata"
        );
        let entry = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_insert_with(|| Arc::new(metadata) as Arc<dyn Any + Send + Sync>)
            .clone();
        entry.downcast::<TypeMetadata<T>>().ok()
    }

    pub(crate) fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
