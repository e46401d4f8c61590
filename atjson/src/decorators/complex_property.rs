use std::sync::Arc;

use serde_json::Value;

use super::{make_custom_decorator, CustomFunctions, MappingOptions, MappingRule, PropertyKind, PropertyName};
use crate::class::{JsonClass, JsonSerializable};
use crate::mapper::JsonMapper;
use crate::metadata::ClassId;

/// Rule for a nested object of registered class `C`, stored as `Option<C>`.
///
/// `null` maps to `None` both ways; any other value goes through the mapper
/// for `C`, which must be registered.
pub fn complex<C: JsonClass>(name: impl Into<PropertyName>) -> MappingRule<Option<C>> {
    let name: PropertyName = name.into();
    make_custom_decorator(|_: &MappingOptions<Option<C>>| CustomFunctions {
        serialize: Arc::new(|mapper: &JsonMapper, value: &Option<C>| {
            mapper.serialize_optional(value.as_ref().map(|v| v as &dyn JsonSerializable))
        }),
        deserialize: Arc::new(|mapper: &JsonMapper, value: Value| match value {
            Value::Null => Ok(None),
            other => mapper.deserialize_value::<C>(other).map(Some),
        }),
    })(MappingOptions::from(name))
    .with_kind(PropertyKind::Complex(ClassId::of::<C>()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassBuilder;
    use crate::decorators::property;
    use crate::error::{MappingError, Result};
    use crate::metadata::MetadataStore;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i32,
    }

    impl JsonClass for Point {
        fn describe(class: &mut ClassBuilder<'_, Self>) -> Result<()> {
            class.property("x", |p| &p.x, |p| &mut p.x, property(()))?;
            Ok(())
        }
    }

    #[test]
    fn test_complex_delegates_to_mapper() {
        let mut store = MetadataStore::new();
        store.register::<Point>().unwrap();
        let mapper = JsonMapper::new(store);
        let rule = complex::<Point>("at");

        assert_eq!(rule.kind(), &PropertyKind::Complex(ClassId::of::<Point>()));
        assert_eq!(
            rule.deserialize(&mapper, json!({"x": 2})).unwrap(),
            Some(Point { x: 2 })
        );
        assert_eq!(rule.deserialize(&mapper, Value::Null).unwrap(), None);
        assert_eq!(rule.serialize(&mapper, &Some(Point { x: 5 })).unwrap(), json!({"x": 5}));
        assert_eq!(rule.serialize(&mapper, &None).unwrap(), Value::Null);
    }

    #[test]
    fn test_complex_of_unregistered_class_fails() {
        let mapper = JsonMapper::new(MetadataStore::new());
        let err = complex::<Point>(())
            .deserialize(&mapper, json!({"x": 2}))
            .unwrap_err();
        assert!(matches!(err, MappingError::UnregisteredClass { .. }));
        assert!(err.to_string().contains("Point"));
    }
}
