//! Class registration: per-class options, the [`JsonClass`] description hook
//! and the builder that applies mapping rules to fields.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::decorators::{BoundProperty, MappingRule};
use crate::error::{MappingError, Result};
use crate::hooks::{AfterDeserialize, AfterDeserializeHook, CustomSerialize, CustomSerializeHook};
use crate::lens::{Lens, Projection};
use crate::metadata::{ClassId, MetadataStore, PropertyMetadata};

/// Class-level mapping options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassOptions {
    /// When `true` (the default) properties without a mapping rule are dropped
    /// in both directions. When `false` they are copied verbatim through the
    /// field declared with [`ClassBuilder::undecorated`].
    pub ignore_undecorated_properties: bool,
}

impl Default for ClassOptions {
    fn default() -> Self {
        Self {
            ignore_undecorated_properties: true,
        }
    }
}

impl ClassOptions {
    pub fn keep_undecorated() -> Self {
        Self {
            ignore_undecorated_properties: false,
        }
    }
}

/// Recorded once per class by [`MetadataStore::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRegistration {
    options: ClassOptions,
}

impl ClassRegistration {
    pub(crate) fn new(options: ClassOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ClassOptions {
        self.options
    }

    pub fn ignore_undecorated_properties(&self) -> bool {
        self.options.ignore_undecorated_properties
    }
}

/// A struct that can be mapped to and from JSON.
///
/// `Default` plays the role of the no-argument constructor: deserialization
/// starts from `T::default()` and only overwrites the fields present in the
/// source.
///
/// ```ignore
/// #[derive(Default)]
/// struct Person {
///     age: u32,
/// }
///
/// impl JsonClass for Person {
///     fn describe(class: &mut ClassBuilder<'_, Self>) -> Result<(), MappingError> {
///         class.property("age", |p| &p.age, |p| &mut p.age, json::property("eta"))?;
///         Ok(())
///     }
/// }
/// ```
pub trait JsonClass: Default + Any {
    fn options() -> ClassOptions {
        ClassOptions::default()
    }

    /// Declare the mapping rules, parent class and hooks of this class.
    fn describe(class: &mut ClassBuilder<'_, Self>) -> Result<()>;
}

/// Object-safe view of a mapped instance, resolving its runtime class.
pub trait JsonSerializable: Any {
    fn class_id(&self) -> ClassId;
    fn as_any(&self) -> &dyn Any;
}

impl<T: JsonClass> JsonSerializable for T {
    fn class_id(&self) -> ClassId {
        ClassId::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Holds the accessor for the map keeping undecorated properties.
pub struct UndecoratedProperties(pub(crate) Box<dyn Projection>);

impl UndecoratedProperties {
    pub(crate) fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a Map<String, Value>> {
        self.0.project(owner)?.downcast_ref::<Map<String, Value>>()
    }

    pub(crate) fn get_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<&'a mut Map<String, Value>> {
        self.0.project_mut(owner)?.downcast_mut::<Map<String, Value>>()
    }
}

/// Applies mapping metadata to the fields of `T` while it is being registered.
pub struct ClassBuilder<'s, T> {
    store: &'s mut MetadataStore,
    class: ClassId,
    _marker: PhantomData<fn() -> T>,
}

impl<'s, T: JsonClass> ClassBuilder<'s, T> {
    pub(crate) fn new(store: &'s mut MetadataStore) -> Self {
        Self {
            store,
            class: ClassId::of::<T>(),
            _marker: PhantomData,
        }
    }

    pub fn class_id(&self) -> ClassId {
        self.class
    }

    /// Declare `P` as the parent of `T`, reachable through the embedded value
    /// returned by `get`/`get_mut`. `P` is registered first if needed and its
    /// rules, hooks and decorated fields become visible on `T`.
    pub fn extends<P, G, M>(&mut self, get: G, get_mut: M) -> Result<&mut Self>
    where
        P: JsonClass,
        G: Fn(&T) -> &P + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut P + Send + Sync + 'static,
    {
        let parent = ClassId::of::<P>();
        if parent == self.class {
            return Err(MappingError::configuration(format!(
                "'{}' cannot extend itself",
                self.class
            )));
        }
        if self.store.is_registering(parent.type_id()) {
            return Err(MappingError::configuration(format!(
                "'{}' and '{}' form an inheritance cycle",
                self.class, parent
            )));
        }
        self.store.register::<P>()?;
        self.store
            .set_parent(self.class, parent, Box::new(Lens::new(get, get_mut)));
        tracing::debug!(class = %self.class, parent = %parent, "declared parent class");
        Ok(self)
    }

    /// Apply `rule` to the field reached by `get`/`get_mut`, recording it under
    /// `key` and appending `key` to the class's field registry.
    pub fn property<V, G, M>(
        &mut self,
        key: &'static str,
        get: G,
        get_mut: M,
        rule: MappingRule<V>,
    ) -> Result<&mut Self>
    where
        V: Any,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        let external = rule.external_name(key).to_string();
        let bound: PropertyMetadata = Arc::new(BoundProperty::new(key, rule, Lens::new(get, get_mut)));
        self.store.define(self.class, Some(key), bound);
        self.store.append_field(self.class, key);

        tracing::debug!(
            class = %self.class,
            property = key,
            external = %external,
            "decorated property"
        );
        Ok(self)
    }

    /// Declare the map receiving (and supplying) properties that carry no
    /// mapping rule, used when undecorated properties are kept.
    pub fn undecorated<G, M>(&mut self, get: G, get_mut: M) -> &mut Self
    where
        G: Fn(&T) -> &Map<String, Value> + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut Map<String, Value> + Send + Sync + 'static,
    {
        self.store.define(
            self.class,
            None,
            UndecoratedProperties(Box::new(Lens::new(get, get_mut))),
        );
        self
    }

    /// Route serialization of `T` through [`CustomSerialize`].
    pub fn custom_serialize(&mut self) -> &mut Self
    where
        T: CustomSerialize,
    {
        self.store
            .define(self.class, None, CustomSerializeHook::of::<T>());
        self
    }

    /// Run [`AfterDeserialize`] on every freshly deserialized `T`.
    pub fn after_deserialize(&mut self) -> &mut Self
    where
        T: AfterDeserialize,
    {
        self.store
            .define(self.class, None, AfterDeserializeHook::of::<T>());
        self
    }

    /// Attach arbitrary metadata to the class or one of its properties.
    pub fn define<K: Any + Send + Sync>(&mut self, property: Option<&'static str>, value: K) -> &mut Self {
        self.store.define(self.class, property, value);
        self
    }

    pub fn store(&self) -> &MetadataStore {
        self.store
    }
}
