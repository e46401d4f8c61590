use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{DeserializeFn, MappingOptions, MappingRule, PropertyKind, SerializeFn};
use crate::error::{MappingError, Result};
use crate::mapper::JsonMapper;
use crate::utils::json_type_name;

/// The pair of functions a custom decorator contributes to a rule.
pub struct CustomFunctions<T> {
    pub serialize: SerializeFn<T>,
    pub deserialize: DeserializeFn<T>,
}

/// Build a reusable property factory from a function producing the
/// serialize/deserialize pair for the given options.
///
/// The returned factory keeps the external name from its options and always
/// installs the functions produced by `build`.
///
/// ```ignore
/// let stringified = make_custom_decorator(|_: &MappingOptions<u32>| CustomFunctions {
///     serialize: Arc::new(|_: &JsonMapper, n: &u32| Ok(Value::String(n.to_string()))),
///     deserialize: Arc::new(|_: &JsonMapper, v: Value| {
///         v.as_str()
///             .and_then(|s| s.parse().ok())
///             .ok_or_else(|| MappingError::custom("not a numeric string"))
///     }),
/// });
/// class.property("x", |c| &c.x, |c| &mut c.x, stringified(().into()))?;
/// ```
pub fn make_custom_decorator<T, F>(build: F) -> impl Fn(MappingOptions<T>) -> MappingRule<T>
where
    F: Fn(&MappingOptions<T>) -> CustomFunctions<T>,
{
    move |options| {
        let CustomFunctions {
            serialize,
            deserialize,
        } = build(&options);
        MappingRule {
            name: options.name,
            serialize,
            deserialize,
            kind: PropertyKind::Custom,
        }
    }
}

/// Serialize through `serde`, without transformation.
pub fn identity_serialize<T: Serialize + 'static>() -> SerializeFn<T> {
    Arc::new(|_: &JsonMapper, value: &T| serde_json::to_value(value).map_err(MappingError::from))
}

/// Deserialize through `serde`, without transformation.
pub fn identity_deserialize<T: DeserializeOwned + 'static>() -> DeserializeFn<T> {
    Arc::new(|_: &JsonMapper, value: Value| serde_json::from_value(value).map_err(MappingError::from))
}

/// Apply `item` to every element of a JSON array, in order.
///
/// Any other value yields `Ok(None)`, the "present but not an array" marker,
/// unless `throw_if_not_array` is set, in which case the error names the JSON
/// type found.
pub fn map_array<T, F>(value: Value, item: F, throw_if_not_array: bool) -> Result<Option<Vec<T>>>
where
    F: FnMut(Value) -> Result<T>,
{
    match value {
        Value::Array(items) => items.into_iter().map(item).collect::<Result<Vec<_>>>().map(Some),
        other => not_an_array(&other, throw_if_not_array),
    }
}

/// Serialize the items of an array field; a missing array becomes `null`.
pub fn serialize_array<T, F>(items: Option<&[T]>, mut item: F) -> Result<Value>
where
    F: FnMut(&T) -> Result<Value>,
{
    match items {
        Some(items) => items
            .iter()
            .map(&mut item)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        None => Ok(Value::Null),
    }
}

fn not_an_array<T>(value: &Value, throw_if_not_array: bool) -> Result<Option<T>> {
    let found = json_type_name(value);
    if throw_if_not_array {
        return Err(MappingError::ShapeMismatch {
            expected: "array",
            found,
        });
    }
    if !value.is_null() {
        tracing::warn!(found = found, "expected array, mapping to null");
    }
    Ok(None)
}
