use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::{make_custom_decorator, CustomFunctions, MappingOptions, MappingRule, PropertyKind, PropertyName};
use crate::class::JsonClass;
use crate::error::{MappingError, Result};
use crate::mapper::JsonMapper;
use crate::metadata::ClassId;
use crate::utils::json_type_name;

/// Rule for a string-keyed map of plain values.
///
/// A `null` source gives an empty map; any non-object source is an error.
/// Entry order is preserved both ways.
pub fn map<V>(name: impl Into<PropertyName>) -> MappingRule<IndexMap<String, V>>
where
    V: Serialize + DeserializeOwned + 'static,
{
    entries(
        name.into(),
        |_: &JsonMapper, value: &V| serde_json::to_value(value).map_err(MappingError::from),
        |_: &JsonMapper, value: Value| serde_json::from_value(value).map_err(MappingError::from),
    )
    .with_kind(PropertyKind::Map { value: None })
}

/// Rule for a string-keyed map whose values are objects of registered class `C`.
pub fn map_of_complex<C: JsonClass>(name: impl Into<PropertyName>) -> MappingRule<IndexMap<String, C>> {
    entries(
        name.into(),
        |mapper: &JsonMapper, value: &C| mapper.serialize(value),
        |mapper: &JsonMapper, value: Value| mapper.deserialize_value::<C>(value),
    )
    .with_kind(PropertyKind::Map {
        value: Some(ClassId::of::<C>()),
    })
}

fn entries<V, S, D>(name: PropertyName, serialize_value: S, deserialize_value: D) -> MappingRule<IndexMap<String, V>>
where
    V: 'static,
    S: Fn(&JsonMapper, &V) -> Result<Value> + Send + Sync + 'static,
    D: Fn(&JsonMapper, Value) -> Result<V> + Send + Sync + 'static,
{
    let serialize_value = Arc::new(serialize_value);
    let deserialize_value = Arc::new(deserialize_value);

    make_custom_decorator(move |_: &MappingOptions<IndexMap<String, V>>| {
        let serialize_value = serialize_value.clone();
        let deserialize_value = deserialize_value.clone();
        CustomFunctions {
            serialize: Arc::new(move |mapper: &JsonMapper, map: &IndexMap<String, V>| {
                map.iter()
                    .map(|(key, value)| serialize_value(mapper, value).map(|value| (key.clone(), value)))
                    .collect::<Result<Map<String, Value>>>()
                    .map(Value::Object)
            }),
            deserialize: Arc::new(move |mapper: &JsonMapper, value: Value| match value {
                Value::Null => Ok(IndexMap::new()),
                Value::Object(object) => object
                    .into_iter()
                    .map(|(key, value)| deserialize_value(mapper, value).map(|value| (key, value)))
                    .collect::<Result<IndexMap<_, _>>>(),
                other => Err(MappingError::ShapeMismatch {
                    expected: "object",
                    found: json_type_name(&other),
                }),
            }),
        }
    })(MappingOptions::from(name))
}
