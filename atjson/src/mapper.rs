//! The mapping engine: walks the metadata of a registered class to turn an
//! instance into a JSON value and back.

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::class::{ClassRegistration, JsonClass, JsonSerializable, UndecoratedProperties};
use crate::config::{MapperConfig, StringParser};
use crate::error::{MappingError, Result};
use crate::hooks::{AfterDeserializeHook, CustomSerializeHook};
use crate::metadata::{ClassId, MetadataStore};
use crate::utils::json_type_name;

/// Serializes and deserializes instances of registered classes.
///
/// Cheap to clone; clones share the same [`MetadataStore`].
#[derive(Debug, Clone)]
pub struct JsonMapper {
    store: Arc<MetadataStore>,
    config: MapperConfig,
}

impl JsonMapper {
    pub fn new(store: impl Into<Arc<MetadataStore>>) -> Self {
        Self::with_config(store, MapperConfig::default())
    }

    pub fn with_config(store: impl Into<Arc<MetadataStore>>, config: MapperConfig) -> Self {
        Self {
            store: store.into(),
            config,
        }
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Serialize `obj` according to the metadata of its runtime class.
    ///
    /// A [`CustomSerialize`](crate::CustomSerialize) hook, own or inherited,
    /// replaces the default walk over the decorated properties.
    pub fn serialize(&self, obj: &dyn JsonSerializable) -> Result<Value> {
        let class = obj.class_id();
        let registration = self.registration(class)?;
        let any = obj.as_any();

        if let Some(hook) = self.store.lookup::<CustomSerializeHook>(class.type_id(), None) {
            tracing::trace!(class = %class, owner = %hook.owner, "custom serialization");
            let target = self.store.upcast(any, class, hook.owner)?;
            return hook
                .value
                .invoke(target, self)
                .unwrap_or_else(|| Err(lineage_error(class, hook.owner)));
        }

        let mut out = Map::new();
        for key in self.store.field_keys(class.type_id()) {
            let Some(rule) = self.store.rule(class.type_id(), key) else {
                continue;
            };
            let owner = self.store.upcast(any, class, rule.owner)?;
            let value = rule
                .value
                .serialize(self, class, owner)
                .map_err(|e| e.in_property(class.short_name(), key))?;
            tracing::trace!(class = %class, property = key, "serialized property");
            out.insert(rule.value.external_name().to_string(), value);
        }

        if !registration.ignore_undecorated_properties() {
            if let Some(bag) = self.store.lookup::<UndecoratedProperties>(class.type_id(), None) {
                let owner = self.store.upcast(any, class, bag.owner)?;
                let extra = bag
                    .value
                    .get(owner)
                    .ok_or_else(|| lineage_error(class, bag.owner))?;
                for (key, value) in extra {
                    if !out.contains_key(key) {
                        out.insert(key.clone(), value.clone());
                    }
                }
            }
        }

        Ok(Value::Object(out))
    }

    /// Like [`serialize`](Self::serialize), with `None` mapped to `null`.
    pub fn serialize_optional(&self, obj: Option<&dyn JsonSerializable>) -> Result<Value> {
        match obj {
            Some(obj) => self.serialize(obj),
            None => Ok(Value::Null),
        }
    }

    pub fn serialize_to_string(&self, obj: &dyn JsonSerializable) -> Result<String> {
        let value = self.serialize(obj)?;
        Ok(serde_json::to_string(&value)?)
    }

    /// Build a `T` from a JSON value, or from JSON text parsed with the
    /// configured [`StringParser`].
    pub fn deserialize<T: JsonClass>(&self, source: impl Into<Value>) -> Result<T> {
        self.deserialize_with_parser(source, self.config.string_parser.as_ref())
    }

    pub fn deserialize_with_parser<T: JsonClass>(
        &self,
        source: impl Into<Value>,
        parser: &dyn StringParser,
    ) -> Result<T> {
        let value = parse_source(source.into(), parser)?;
        self.deserialize_value(value)
    }

    /// Build a `T` from an already parsed value. Strings are not parsed.
    pub fn deserialize_value<T: JsonClass>(&self, value: Value) -> Result<T> {
        let class = ClassId::of::<T>();
        let registration = self.registration(class)?;
        let mut source = match value {
            Value::Object(source) => source,
            other => {
                return Err(MappingError::ShapeMismatch {
                    expected: "object",
                    found: json_type_name(&other),
                })
            }
        };

        let mut instance = T::default();
        let mut consumed = HashSet::new();
        for key in self.store.field_keys(class.type_id()) {
            let Some(rule) = self.store.rule(class.type_id(), key) else {
                continue;
            };
            let external = rule.value.external_name();
            let Some(slot) = source.get_mut(external) else {
                continue;
            };
            let value = slot.take();
            consumed.insert(external.to_string());

            let owner = self.store.upcast_mut(&mut instance, class, rule.owner)?;
            rule.value
                .deserialize(self, class, owner, value)
                .map_err(|e| e.in_property(class.short_name(), key))?;
            tracing::trace!(class = %class, property = key, "deserialized property");
        }

        if !registration.ignore_undecorated_properties() {
            self.keep_undecorated(&mut instance, class, source, &consumed)?;
        }

        if let Some(hook) = self.store.lookup::<AfterDeserializeHook>(class.type_id(), None) {
            let target = self.store.upcast_mut(&mut instance, class, hook.owner)?;
            if !hook.value.invoke(target) {
                return Err(lineage_error(class, hook.owner));
            }
            tracing::trace!(class = %class, owner = %hook.owner, "ran after-deserialize hook");
        }

        Ok(instance)
    }

    /// Build one `T` per element of a JSON array (or JSON text of an array).
    pub fn deserialize_array<T: JsonClass>(&self, source: impl Into<Value>) -> Result<Vec<T>> {
        match parse_source(source.into(), self.config.string_parser.as_ref())? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| self.deserialize_value(item))
                .collect(),
            other => Err(MappingError::ShapeMismatch {
                expected: "array",
                found: json_type_name(&other),
            }),
        }
    }

    fn registration(&self, class: ClassId) -> Result<&ClassRegistration> {
        self.store
            .registration(class.type_id())
            .ok_or_else(|| MappingError::UnregisteredClass {
                class: class.to_string(),
            })
    }

    fn keep_undecorated(
        &self,
        instance: &mut dyn Any,
        class: ClassId,
        source: Map<String, Value>,
        consumed: &HashSet<String>,
    ) -> Result<()> {
        let bag = self
            .store
            .lookup::<UndecoratedProperties>(class.type_id(), None)
            .ok_or_else(|| {
                MappingError::configuration(format!(
                    "'{}' keeps undecorated properties but declares no field to hold them",
                    class
                ))
            })?;
        let owner = self.store.upcast_mut(instance, class, bag.owner)?;
        let extra = bag
            .value
            .get_mut(owner)
            .ok_or_else(|| lineage_error(class, bag.owner))?;

        for (key, value) in source {
            if !consumed.contains(&key) {
                extra.insert(key, value);
            }
        }
        Ok(())
    }
}

fn parse_source(source: Value, parser: &dyn StringParser) -> Result<Value> {
    match source {
        Value::String(text) => parser.parse(&text),
        other => Ok(other),
    }
}

fn lineage_error(class: ClassId, ancestor: ClassId) -> MappingError {
    MappingError::BrokenLineage {
        class: class.to_string(),
        ancestor: ancestor.to_string(),
    }
}
