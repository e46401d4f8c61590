//! Metadata store for mapped classes.
//!
//! Every registered class owns a slot of metadata entries. An entry is keyed by
//! its Rust type (the metadata key) and optionally by a property name. Lookups
//! fall back along the declared ancestor chain, so a subclass sees the rules of
//! its parents unless it overrides them, while defining metadata on a subclass
//! never touches the parent's slot.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::class::{ClassBuilder, ClassRegistration, JsonClass};
use crate::decorators::PropertyMapping;
use crate::error::{MappingError, Result};
use crate::lens::Projection;
use crate::utils::short_type_name;

/// Identity of a mapped class.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId {
    id: TypeId,
    name: &'static str,
}

impl ClassId {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn short_name(&self) -> &'static str {
        short_type_name(self.name)
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.name)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Mapping rule bound to one property of one class.
pub type PropertyMetadata = Arc<dyn PropertyMapping>;

/// Ordered keys of a class's decorated properties, inherited ones first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRegistry(Vec<&'static str>);

impl FieldRegistry {
    pub fn keys(&self) -> &[&'static str] {
        &self.0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|k| *k == key)
    }

    fn push(&mut self, key: &'static str) {
        if !self.contains(key) {
            self.0.push(key);
        }
    }
}

/// A metadata value found by [`MetadataStore::lookup`], with the class whose
/// slot held it.
pub struct Resolved<'a, K> {
    pub value: &'a K,
    pub owner: ClassId,
}

pub(crate) struct Parent {
    pub(crate) class: ClassId,
    pub(crate) link: Box<dyn Projection>,
}

type Slot = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

struct Target {
    class: ClassId,
    parent: Option<Parent>,
    class_slot: Slot,
    property_slots: HashMap<&'static str, Slot>,
}

impl Target {
    fn new(class: ClassId) -> Self {
        Self {
            class,
            parent: None,
            class_slot: HashMap::new(),
            property_slots: HashMap::new(),
        }
    }

    fn slot(&self, property: Option<&str>) -> Option<&Slot> {
        match property {
            None => Some(&self.class_slot),
            Some(key) => self.property_slots.get(key),
        }
    }
}

/// Process-wide registry of mapping metadata, constructed explicitly and handed
/// to the [`JsonMapper`](crate::JsonMapper).
#[derive(Default)]
pub struct MetadataStore {
    targets: HashMap<TypeId, Target>,
    registering: HashSet<TypeId>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T`, running its [`JsonClass::describe`] once.
    ///
    /// Registering an already registered class does nothing.
    pub fn register<T: JsonClass>(&mut self) -> Result<()> {
        let class = ClassId::of::<T>();
        if self.is_registered(class.type_id()) {
            return Ok(());
        }

        self.ensure_target(class);
        self.registering.insert(class.type_id());
        let described = {
            let mut builder = ClassBuilder::<T>::new(self);
            T::describe(&mut builder)
        };
        self.registering.remove(&class.type_id());
        described?;
        self.check_external_names(class)?;

        let options = T::options();
        if !options.ignore_undecorated_properties
            && self
                .get::<crate::class::UndecoratedProperties>(class.type_id(), None)
                .is_none()
        {
            return Err(MappingError::configuration(format!(
                "'{}' keeps undecorated properties but declares no field to hold them",
                class
            )));
        }

        self.define(class, None, ClassRegistration::new(options));
        tracing::debug!(
            class = %class,
            ignore_undecorated = options.ignore_undecorated_properties,
            fields = self.field_keys(class.type_id()).len(),
            "registered class"
        );
        Ok(())
    }

    pub fn is_registered(&self, class: TypeId) -> bool {
        self.registration(class).is_some()
    }

    /// True while the `describe` of `class` is running.
    pub(crate) fn is_registering(&self, class: TypeId) -> bool {
        self.registering.contains(&class)
    }

    /// Registration recorded on `class` itself. Not inherited.
    pub fn registration(&self, class: TypeId) -> Option<&ClassRegistration> {
        self.get_own::<ClassRegistration>(class, None)
    }

    pub fn class_name(&self, class: TypeId) -> Option<ClassId> {
        self.targets.get(&class).map(|t| t.class)
    }

    /// Associate `value` with `target` (and `property`, when given).
    ///
    /// Overwrites a previous value of the same metadata type in the same slot
    /// only; ancestors keep their own entries.
    pub fn define<K: Any + Send + Sync>(
        &mut self,
        target: ClassId,
        property: Option<&'static str>,
        value: K,
    ) {
        let entry = self.ensure_target(target);
        let slot = match property {
            None => &mut entry.class_slot,
            Some(key) => entry.property_slots.entry(key).or_default(),
        };
        slot.insert(TypeId::of::<K>(), Box::new(value));
    }

    /// Value defined directly on `target`, without looking at ancestors.
    pub fn get_own<K: Any>(&self, target: TypeId, property: Option<&str>) -> Option<&K> {
        self.targets
            .get(&target)?
            .slot(property)?
            .get(&TypeId::of::<K>())?
            .downcast_ref::<K>()
    }

    /// Value for `target`, falling back to the nearest ancestor defining it.
    pub fn get<K: Any>(&self, target: TypeId, property: Option<&str>) -> Option<&K> {
        self.lookup(target, property).map(|found| found.value)
    }

    pub fn lookup<K: Any>(&self, target: TypeId, property: Option<&str>) -> Option<Resolved<'_, K>> {
        let mut current = self.targets.get(&target);
        while let Some(entry) = current {
            if let Some(value) = entry
                .slot(property)
                .and_then(|slot| slot.get(&TypeId::of::<K>()))
                .and_then(|value| value.downcast_ref::<K>())
            {
                return Some(Resolved {
                    value,
                    owner: entry.class,
                });
            }
            current = entry
                .parent
                .as_ref()
                .and_then(|parent| self.targets.get(&parent.class.type_id()));
        }
        None
    }

    /// The mapping rule of `property`, own or inherited.
    pub fn rule(&self, class: TypeId, property: &str) -> Option<Resolved<'_, PropertyMetadata>> {
        self.lookup::<PropertyMetadata>(class, Some(property))
    }

    /// Decorated property keys of `class`, inherited ones included.
    pub fn field_keys(&self, class: TypeId) -> Vec<&'static str> {
        self.get::<FieldRegistry>(class, None)
            .map(|registry| registry.keys().to_vec())
            .unwrap_or_default()
    }

    pub fn parent_of(&self, class: TypeId) -> Option<ClassId> {
        self.targets.get(&class)?.parent.as_ref().map(|p| p.class)
    }

    /// Classes from `class` up to the root of its declared lineage.
    pub fn lineage(&self, class: TypeId) -> Vec<ClassId> {
        let mut chain = Vec::new();
        let mut current = self.targets.get(&class);
        while let Some(entry) = current {
            chain.push(entry.class);
            current = entry
                .parent
                .as_ref()
                .and_then(|parent| self.targets.get(&parent.class.type_id()));
        }
        chain
    }

    pub(crate) fn set_parent(&mut self, child: ClassId, parent: ClassId, link: Box<dyn Projection>) {
        let inherited = self.field_keys(parent.type_id());
        let entry = self.ensure_target(child);
        entry.parent = Some(Parent {
            class: parent,
            link,
        });

        // Keys decorated on the child before the parent was declared keep their
        // place after the inherited ones.
        let mut registry = FieldRegistry(inherited);
        if let Some(own) = self.get_own::<FieldRegistry>(child.type_id(), None) {
            for key in own.keys() {
                registry.push(key);
            }
        }
        self.define(child, None, registry);
    }

    pub(crate) fn append_field(&mut self, class: ClassId, key: &'static str) {
        let mut registry = self
            .get::<FieldRegistry>(class.type_id(), None)
            .cloned()
            .unwrap_or_default();
        registry.push(key);
        self.define(class, None, registry);
    }

    /// Every decorated property of `class`, inherited ones included, must map
    /// to a distinct external name. Runs once the lineage is complete, so a
    /// subclass may rename inherited properties in any order.
    fn check_external_names(&self, class: ClassId) -> Result<()> {
        let mut seen: HashMap<&str, &'static str> = HashMap::new();
        for key in self.field_keys(class.type_id()) {
            let Some(rule) = self.rule(class.type_id(), key) else {
                continue;
            };
            let name = rule.value.external_name();
            if let Some(existing) = seen.insert(name, key) {
                return Err(MappingError::DuplicateExternalName {
                    class: class.to_string(),
                    name: name.to_string(),
                    existing: existing.to_string(),
                    property: key.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Walk the parent links from `from` to `to`, projecting `obj` along the way.
    pub(crate) fn upcast<'a>(
        &self,
        mut obj: &'a dyn Any,
        from: ClassId,
        to: ClassId,
    ) -> Result<&'a dyn Any> {
        let mut current = from;
        while current != to {
            let parent = self.parent_link(current, to)?;
            obj = parent
                .link
                .project(obj)
                .ok_or_else(|| broken_lineage(current, to))?;
            current = parent.class;
        }
        Ok(obj)
    }

    pub(crate) fn upcast_mut<'a>(
        &self,
        mut obj: &'a mut dyn Any,
        from: ClassId,
        to: ClassId,
    ) -> Result<&'a mut dyn Any> {
        let mut current = from;
        while current != to {
            let parent = self.parent_link(current, to)?;
            obj = parent
                .link
                .project_mut(obj)
                .ok_or_else(|| broken_lineage(current, to))?;
            current = parent.class;
        }
        Ok(obj)
    }

    fn parent_link(&self, current: ClassId, to: ClassId) -> Result<&Parent> {
        self.targets
            .get(&current.type_id())
            .and_then(|entry| entry.parent.as_ref())
            .ok_or_else(|| broken_lineage(current, to))
    }

    fn ensure_target(&mut self, class: ClassId) -> &mut Target {
        self.targets
            .entry(class.type_id())
            .or_insert_with(|| Target::new(class))
    }
}

fn broken_lineage(class: ClassId, ancestor: ClassId) -> MappingError {
    MappingError::BrokenLineage {
        class: class.to_string(),
        ancestor: ancestor.to_string(),
    }
}

impl fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<_> = self.targets.values().map(|t| t.class.name()).collect();
        classes.sort_unstable();
        f.debug_struct("MetadataStore")
            .field("classes", &classes)
            .finish()
    }
}
