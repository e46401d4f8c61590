//! Mapping rule factories.
//!
//! Each factory builds a [`MappingRule`] for one field type; applying it with
//! [`ClassBuilder::property`](crate::ClassBuilder::property) records the rule
//! in the metadata store and appends the field to the class's registry.

mod array;
mod array_of_complex_property;
mod common;
mod complex_property;
mod map;
mod property;

pub use array::array;
pub use array_of_complex_property::array_of_complex;
pub use common::{
    identity_deserialize, identity_serialize, make_custom_decorator, map_array, serialize_array,
    CustomFunctions,
};
pub use complex_property::complex;
pub use map::{map, map_of_complex};
pub use property::{custom, property};

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::lens::Lens;
use crate::mapper::JsonMapper;
use crate::metadata::ClassId;

/// Serialization function of a property holding a `T`.
pub type SerializeFn<T> = Arc<dyn Fn(&JsonMapper, &T) -> Result<Value> + Send + Sync>;

/// Deserialization function of a property holding a `T`.
pub type DeserializeFn<T> = Arc<dyn Fn(&JsonMapper, Value) -> Result<T> + Send + Sync>;

/// External (JSON side) name of a property, when it differs from the field key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyName(pub Option<String>);

impl From<()> for PropertyName {
    fn from(_: ()) -> Self {
        PropertyName(None)
    }
}

impl From<&str> for PropertyName {
    fn from(name: &str) -> Self {
        PropertyName(Some(name.to_string()))
    }
}

impl From<String> for PropertyName {
    fn from(name: String) -> Self {
        PropertyName(Some(name))
    }
}

/// Options accepted by the property factories.
pub struct MappingOptions<T> {
    pub name: Option<String>,
    pub serialize: Option<SerializeFn<T>>,
    pub deserialize: Option<DeserializeFn<T>>,
}

impl<T> MappingOptions<T> {
    pub fn new() -> Self {
        Self {
            name: None,
            serialize: None,
            deserialize: None,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new().with_name(name)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_serialize<F>(mut self, serialize: F) -> Self
    where
        F: Fn(&JsonMapper, &T) -> Result<Value> + Send + Sync + 'static,
    {
        self.serialize = Some(Arc::new(serialize));
        self
    }

    pub fn with_deserialize<F>(mut self, deserialize: F) -> Self
    where
        F: Fn(&JsonMapper, Value) -> Result<T> + Send + Sync + 'static,
    {
        self.deserialize = Some(Arc::new(deserialize));
        self
    }

    /// Keep only the name, for a rule over a different field type.
    pub(crate) fn name_only<U>(&self) -> MappingOptions<U> {
        MappingOptions {
            name: self.name.clone(),
            serialize: None,
            deserialize: None,
        }
    }
}

impl<T> Default for MappingOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for MappingOptions<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            serialize: self.serialize.clone(),
            deserialize: self.deserialize.clone(),
        }
    }
}

impl<T> fmt::Debug for MappingOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingOptions")
            .field("name", &self.name)
            .field("serialize", &self.serialize.is_some())
            .field("deserialize", &self.deserialize.is_some())
            .finish()
    }
}

impl<T> From<PropertyName> for MappingOptions<T> {
    fn from(name: PropertyName) -> Self {
        Self {
            name: name.0,
            ..Self::new()
        }
    }
}

impl<T> From<()> for MappingOptions<T> {
    fn from(_: ()) -> Self {
        Self::new()
    }
}

impl<T> From<&str> for MappingOptions<T> {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl<T> From<String> for MappingOptions<T> {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

/// What a rule maps, as seen by collaborators reading the metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Plain,
    Array {
        /// Item class, for arrays of complex objects.
        item: Option<ClassId>,
        throw_if_not_array: bool,
    },
    Complex(ClassId),
    Map {
        /// Value class, for maps of complex objects.
        value: Option<ClassId>,
    },
    Custom,
}

/// Declarative mapping of one property holding a `T`.
pub struct MappingRule<T> {
    name: Option<String>,
    serialize: SerializeFn<T>,
    deserialize: DeserializeFn<T>,
    kind: PropertyKind,
}

impl<T> MappingRule<T> {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The JSON key: the rule's name, or the field key when unnamed.
    pub fn external_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(key)
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    pub(crate) fn with_kind(mut self, kind: PropertyKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn serialize(&self, mapper: &JsonMapper, value: &T) -> Result<Value> {
        (self.serialize)(mapper, value)
    }

    pub fn deserialize(&self, mapper: &JsonMapper, value: Value) -> Result<T> {
        (self.deserialize)(mapper, value)
    }
}

impl<T> fmt::Debug for MappingRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingRule")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A mapping rule applied to a field of a registered class, with the type of
/// the field erased.
pub trait PropertyMapping: Send + Sync {
    /// Field key the rule was applied to.
    fn key(&self) -> &'static str;

    fn name(&self) -> Option<&str>;

    fn kind(&self) -> &PropertyKind;

    fn external_name(&self) -> &str {
        self.name().unwrap_or(self.key())
    }

    /// Serialize the field of `owner`, which must be an instance of the class
    /// the rule was applied to. `class` is the runtime class of the instance
    /// being mapped, `owner` its projection onto that class.
    fn serialize(&self, mapper: &JsonMapper, class: ClassId, owner: &dyn Any) -> Result<Value>;

    /// Deserialize `value` into the field of `owner`.
    fn deserialize(
        &self,
        mapper: &JsonMapper,
        class: ClassId,
        owner: &mut dyn Any,
        value: Value,
    ) -> Result<()>;
}

pub(crate) struct BoundProperty<O, V, G, M> {
    key: &'static str,
    rule: MappingRule<V>,
    lens: Lens<O, V, G, M>,
}

impl<O, V, G, M> BoundProperty<O, V, G, M> {
    pub(crate) fn new(key: &'static str, rule: MappingRule<V>, lens: Lens<O, V, G, M>) -> Self {
        Self { key, rule, lens }
    }
}

impl<O, V, G, M> PropertyMapping for BoundProperty<O, V, G, M>
where
    O: Any,
    V: Any,
    G: Fn(&O) -> &V + Send + Sync + 'static,
    M: Fn(&mut O) -> &mut V + Send + Sync + 'static,
{
    fn key(&self) -> &'static str {
        self.key
    }

    fn name(&self) -> Option<&str> {
        self.rule.name()
    }

    fn kind(&self) -> &PropertyKind {
        self.rule.kind()
    }

    fn serialize(&self, mapper: &JsonMapper, class: ClassId, owner: &dyn Any) -> Result<Value> {
        let value = self.lens.get(owner).ok_or_else(|| owner_mismatch::<O>(class))?;
        self.rule.serialize(mapper, value)
    }

    fn deserialize(
        &self,
        mapper: &JsonMapper,
        class: ClassId,
        owner: &mut dyn Any,
        value: Value,
    ) -> Result<()> {
        let field = self
            .lens
            .get_mut(owner)
            .ok_or_else(|| owner_mismatch::<O>(class))?;
        *field = self.rule.deserialize(mapper, value)?;
        Ok(())
    }
}

fn owner_mismatch<O: Any>(class: ClassId) -> crate::MappingError {
    crate::MappingError::BrokenLineage {
        class: class.to_string(),
        ancestor: ClassId::of::<O>().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataStore;
    use serde_json::json;

    #[derive(Default)]
    struct Point {
        x: i32,
    }

    #[derive(Default)]
    struct Label {
        text: String,
    }

    type Get = fn(&Point) -> &i32;
    type GetMut = fn(&mut Point) -> &mut i32;

    fn bound_x() -> BoundProperty<Point, i32, Get, GetMut> {
        let get: Get = |p| &p.x;
        let get_mut: GetMut = |p| &mut p.x;
        BoundProperty::new("x", property(()), Lens::new(get, get_mut))
    }

    #[test]
    fn test_bound_property_reads_and_writes_its_field() {
        let mapper = JsonMapper::new(MetadataStore::new());
        let bound = bound_x();
        let mut point = Point { x: 3 };

        assert_eq!(
            bound.serialize(&mapper, ClassId::of::<Point>(), &point).unwrap(),
            json!(3)
        );
        bound
            .deserialize(&mapper, ClassId::of::<Point>(), &mut point, json!(8))
            .unwrap();
        assert_eq!(point.x, 8);
    }

    #[test]
    fn test_wrong_owner_names_both_classes() {
        let mapper = JsonMapper::new(MetadataStore::new());
        let bound = bound_x();
        let mut label = Label::default();

        let err = bound
            .serialize(&mapper, ClassId::of::<Label>(), &label)
            .unwrap_err();
        assert_eq!(err.to_string(), "Lineage of 'Label' does not reach 'Point'");

        let err = bound
            .deserialize(&mapper, ClassId::of::<Label>(), &mut label, json!(1))
            .unwrap_err();
        assert!(matches!(err, crate::MappingError::BrokenLineage { .. }));
        assert!(label.text.is_empty());
    }
}
