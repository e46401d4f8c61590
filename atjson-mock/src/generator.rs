use std::any::TypeId;
use std::ops::RangeInclusive;

use atjson::{ClassId, JsonClass, JsonMapper, MappingError, PropertyKind};
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde_json::{Map, Value};

use crate::error::{MockError, Result};
use crate::hints::{ArrayHint, Generator, TypeHint};

const STRING_LEN: usize = 12;

#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Length of generated arrays (and maps) without an [`ArrayHint`].
    pub array_len: RangeInclusive<usize>,
    /// Silence the warnings about properties generation cannot fill.
    pub ignore_warnings: bool,
    /// Nesting limit for complex properties.
    pub max_depth: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            array_len: 1..=9,
            ignore_warnings: false,
            max_depth: 16,
        }
    }
}

impl MockConfig {
    pub fn with_array_len(mut self, array_len: RangeInclusive<usize>) -> Self {
        self.array_len = array_len;
        self
    }

    pub fn with_ignore_warnings(mut self, ignore_warnings: bool) -> Self {
        self.ignore_warnings = ignore_warnings;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Builds random instances of registered classes from their mapping metadata
/// and generation hints.
///
/// Values are generated in their external (JSON) form and then deserialized
/// through the mapper, so custom rules and hooks run exactly as they would on
/// real input.
#[derive(Debug, Clone)]
pub struct MockGenerator {
    mapper: JsonMapper,
    config: MockConfig,
}

impl MockGenerator {
    pub fn new(mapper: JsonMapper) -> Self {
        Self::with_config(mapper, MockConfig::default())
    }

    pub fn with_config(mapper: JsonMapper, config: MockConfig) -> Self {
        Self { mapper, config }
    }

    pub fn mapper(&self) -> &JsonMapper {
        &self.mapper
    }

    pub fn generate<T: JsonClass>(&self) -> Result<T> {
        self.generate_with(&mut rand::thread_rng())
    }

    /// Like [`generate`](Self::generate), drawing from `rng`; a seeded rng
    /// gives reproducible instances.
    pub fn generate_with<T: JsonClass, R: RngCore>(&self, rng: &mut R) -> Result<T> {
        let value = self.generate_value(ClassId::of::<T>(), rng)?;
        Ok(self.mapper.deserialize_value(value)?)
    }

    /// The JSON document [`generate_with`](Self::generate_with) would map.
    pub fn generate_value(&self, class: ClassId, rng: &mut dyn RngCore) -> Result<Value> {
        self.object(class, rng, 0)
    }

    fn object(&self, class: ClassId, rng: &mut dyn RngCore, depth: usize) -> Result<Value> {
        if depth > self.config.max_depth {
            return Err(MockError::TooDeep {
                class: class.to_string(),
                max_depth: self.config.max_depth,
            });
        }
        let store = self.mapper.store();
        let id = class.type_id();
        if !store.is_registered(id) {
            return Err(MappingError::UnregisteredClass {
                class: class.to_string(),
            }
            .into());
        }

        let mut out = Map::new();
        for key in store.field_keys(id) {
            let Some(rule) = store.rule(id, key) else {
                continue;
            };
            let property = Property { class, id, key };
            if let Some(value) = self.property(&property, rule.value.kind(), rng, depth)? {
                out.insert(rule.value.external_name().to_string(), value);
            }
        }
        tracing::trace!(class = %class, depth = depth, "generated object");
        Ok(Value::Object(out))
    }

    fn property(
        &self,
        property: &Property,
        kind: &PropertyKind,
        rng: &mut dyn RngCore,
        depth: usize,
    ) -> Result<Option<Value>> {
        if let Some(generator) = property.hint::<Generator>(self) {
            return Ok(Some(generator.generate(rng)));
        }
        let hint = property.hint::<TypeHint>(self);

        let value = match kind {
            PropertyKind::Complex(nested) => Some(self.object(*nested, rng, depth + 1)?),
            PropertyKind::Array { item, .. } => {
                let len = self.array_len(property, rng)?;
                match (item, hint) {
                    (Some(nested), _) => Some(Value::Array(
                        (0..len)
                            .map(|_| self.object(*nested, rng, depth + 1))
                            .collect::<Result<_>>()?,
                    )),
                    (None, Some(hint)) => Some(Value::Array(
                        (0..len).filter_map(|_| primitive(hint, rng)).collect(),
                    )),
                    (None, None) => {
                        self.warn(property, "array without a type hint, generating []");
                        Some(Value::Array(Vec::new()))
                    }
                }
            }
            PropertyKind::Map { value } => {
                let len = self.array_len(property, rng)?;
                let mut entries = Map::new();
                match (value, hint) {
                    (Some(nested), _) => {
                        for i in 0..len {
                            entries.insert(format!("key{}", i), self.object(*nested, rng, depth + 1)?);
                        }
                    }
                    (None, Some(hint)) => {
                        for i in 0..len {
                            if let Some(value) = primitive(hint, rng) {
                                entries.insert(format!("key{}", i), value);
                            }
                        }
                    }
                    (None, None) => self.warn(property, "map without a type hint, generating {}"),
                }
                Some(Value::Object(entries))
            }
            PropertyKind::Plain | PropertyKind::Custom => match hint {
                Some(hint) => primitive(hint, rng),
                None => {
                    self.warn(property, "no type hint, keeping the default value");
                    None
                }
            },
        };
        Ok(value)
    }

    fn array_len(&self, property: &Property, rng: &mut dyn RngCore) -> Result<usize> {
        let range = match property.hint::<ArrayHint>(self) {
            Some(hint) if hint.min_len > hint.max_len => {
                return Err(MockError::InvalidArrayHint {
                    class: property.class.to_string(),
                    property: property.key.to_string(),
                    min_len: hint.min_len,
                    max_len: hint.max_len,
                })
            }
            Some(hint) => hint.min_len..=hint.max_len,
            None => self.config.array_len.clone(),
        };
        if range.is_empty() {
            return Ok(0);
        }
        Ok(rng.gen_range(range))
    }

    fn warn(&self, property: &Property, message: &str) {
        if !self.config.ignore_warnings {
            tracing::warn!(class = %property.class, property = property.key, "{}", message);
        }
    }
}

struct Property {
    class: ClassId,
    id: TypeId,
    key: &'static str,
}

impl Property {
    fn hint<'g, K: std::any::Any>(&self, generator: &'g MockGenerator) -> Option<&'g K> {
        generator.mapper.store().get::<K>(self.id, Some(self.key))
    }
}

fn primitive(hint: &TypeHint, rng: &mut dyn RngCore) -> Option<Value> {
    let value = match hint {
        TypeHint::String => Value::String(
            (0..STRING_LEN)
                .map(|_| char::from(rng.sample(Alphanumeric)))
                .collect(),
        ),
        TypeHint::Number => Value::from(rng.gen::<f64>()),
        TypeHint::Integer => Value::from(rng.gen_range(0..10_000i64)),
        TypeHint::Boolean => Value::Bool(rng.gen()),
        TypeHint::Enum(values) => return values.choose(rng).cloned(),
    };
    Some(value)
}
