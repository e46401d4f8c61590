use std::sync::Arc;

use serde_json::Value;

use super::{
    make_custom_decorator, map_array, serialize_array, CustomFunctions, MappingOptions, MappingRule,
    PropertyKind, PropertyName,
};
use crate::class::JsonClass;
use crate::mapper::JsonMapper;
use crate::metadata::ClassId;

/// Rule for an array of nested objects of registered class `C`.
///
/// Follows [`array`](super::array) for the array itself; every item goes
/// through the mapper for `C`, so an item that is not an object (`null`
/// included) is rejected.
pub fn array_of_complex<C: JsonClass>(
    name: impl Into<PropertyName>,
    throw_if_not_array: bool,
) -> MappingRule<Option<Vec<C>>> {
    let name: PropertyName = name.into();
    make_custom_decorator(move |_: &MappingOptions<Option<Vec<C>>>| CustomFunctions {
        serialize: Arc::new(|mapper: &JsonMapper, items: &Option<Vec<C>>| {
            serialize_array(items.as_deref(), |item| mapper.serialize(item))
        }),
        deserialize: Arc::new(move |mapper: &JsonMapper, value: Value| {
            map_array(value, |item| mapper.deserialize_value::<C>(item), throw_if_not_array)
        }),
    })(MappingOptions::from(name))
    .with_kind(PropertyKind::Array {
        item: Some(ClassId::of::<C>()),
        throw_if_not_array,
    })
}
