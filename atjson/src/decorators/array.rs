use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{
    identity_deserialize, identity_serialize, make_custom_decorator, map_array, serialize_array,
    CustomFunctions, MappingOptions, MappingRule, PropertyKind,
};
use crate::error::{MappingError, Result};
use crate::mapper::JsonMapper;

/// Rule for array fields, stored as `Option<Vec<T>>`.
///
/// The serialize/deserialize functions of `options`, when given, apply to each
/// item and must be given together. On deserialization a present value that
/// is not an array becomes `None`, or fails when `throw_if_not_array` is set.
/// `None` serializes to `null`.
pub fn array<T>(
    options: impl Into<MappingOptions<T>>,
    throw_if_not_array: bool,
) -> Result<MappingRule<Option<Vec<T>>>>
where
    T: Serialize + DeserializeOwned + 'static,
{
    let options = options.into();
    let (serialize_item, deserialize_item) = match (options.serialize.clone(), options.deserialize.clone()) {
        (Some(serialize), Some(deserialize)) => (serialize, deserialize),
        (None, None) => (identity_serialize::<T>(), identity_deserialize::<T>()),
        _ => {
            return Err(MappingError::configuration(
                "serialize and deserialize must be defined together",
            ))
        }
    };

    let rule = make_custom_decorator(move |_: &MappingOptions<Option<Vec<T>>>| CustomFunctions {
        serialize: {
            let item = serialize_item.clone();
            Arc::new(move |mapper: &JsonMapper, items: &Option<Vec<T>>| {
                serialize_array(items.as_deref(), |value| item(mapper, value))
            })
        },
        deserialize: {
            let item = deserialize_item.clone();
            Arc::new(move |mapper: &JsonMapper, value: Value| {
                map_array(value, |value| item(mapper, value), throw_if_not_array)
            })
        },
    })(options.name_only());

    Ok(rule.with_kind(PropertyKind::Array {
        item: None,
        throw_if_not_array,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataStore;
    use serde_json::json;

    fn mapper() -> JsonMapper {
        JsonMapper::new(MetadataStore::new())
    }

    #[test]
    fn test_array_maps_items_in_order() {
        let rule = array::<i32>((), false).unwrap();
        let mapper = mapper();

        assert_eq!(
            rule.deserialize(&mapper, json!([1, 2, 3])).unwrap(),
            Some(vec![1, 2, 3])
        );
        assert_eq!(rule.serialize(&mapper, &Some(vec![4, 5])).unwrap(), json!([4, 5]));
        assert_eq!(rule.serialize(&mapper, &None).unwrap(), Value::Null);
    }

    #[test]
    fn test_array_non_array_source() {
        let mapper = mapper();

        let lenient = array::<String>("foo", false).unwrap();
        assert_eq!(lenient.external_name("bar"), "foo");
        assert_eq!(lenient.deserialize(&mapper, json!("bar")).unwrap(), None);

        let strict = array::<String>("foo", true).unwrap();
        let err = strict.deserialize(&mapper, json!("bar")).unwrap_err();
        assert!(err.to_string().contains("string"));
        assert_eq!(
            strict.kind(),
            &PropertyKind::Array {
                item: None,
                throw_if_not_array: true
            }
        );
    }

    #[test]
    fn test_array_with_item_functions() {
        let options = MappingOptions::<i64>::new()
            .with_serialize(|_, n: &i64| Ok(Value::String(n.to_string())))
            .with_deserialize(|_, v: Value| {
                v.as_str()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| MappingError::custom("expected a numeric string"))
            });
        let rule = array(options, false).unwrap();
        let mapper = mapper();

        assert_eq!(
            rule.deserialize(&mapper, json!(["1", "2"])).unwrap(),
            Some(vec![1, 2])
        );
        assert_eq!(
            rule.serialize(&mapper, &Some(vec![3, 4])).unwrap(),
            json!(["3", "4"])
        );
    }

    #[test]
    fn test_array_requires_both_item_functions() {
        let options = MappingOptions::<i64>::new().with_serialize(|_, n: &i64| Ok(json!(n)));
        let err = array(options, false).unwrap_err();
        assert!(matches!(err, MappingError::Configuration(_)));
        assert!(err
            .to_string()
            .contains("serialize and deserialize must be defined together"));
    }
}
