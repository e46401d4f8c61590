use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{
    identity_deserialize, identity_serialize, make_custom_decorator, CustomFunctions,
    MappingOptions, MappingRule, PropertyKind, PropertyName,
};
use crate::error::Result;
use crate::mapper::JsonMapper;

/// The basic rule for simple properties.
///
/// Values pass through `serde` unchanged unless the options carry a custom
/// serialize or deserialize function; a missing side stays the identity.
///
/// `options` can be `()`, an external name (`"eta"`), or full
/// [`MappingOptions`].
pub fn property<T>(options: impl Into<MappingOptions<T>>) -> MappingRule<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    make_custom_decorator(|opt: &MappingOptions<T>| CustomFunctions {
        serialize: opt.serialize.clone().unwrap_or_else(identity_serialize::<T>),
        deserialize: opt
            .deserialize
            .clone()
            .unwrap_or_else(identity_deserialize::<T>),
    })(options.into())
    .with_kind(PropertyKind::Plain)
}

/// A rule from an arbitrary pair of functions, for field types `serde` does
/// not handle or external shapes that need conversion.
pub fn custom<T, S, D>(name: impl Into<PropertyName>, serialize: S, deserialize: D) -> MappingRule<T>
where
    T: 'static,
    S: Fn(&JsonMapper, &T) -> Result<Value> + Send + Sync + 'static,
    D: Fn(&JsonMapper, Value) -> Result<T> + Send + Sync + 'static,
{
    let name: PropertyName = name.into();
    let serialize: super::SerializeFn<T> = Arc::new(serialize);
    let deserialize: super::DeserializeFn<T> = Arc::new(deserialize);
    make_custom_decorator(move |_: &MappingOptions<T>| CustomFunctions {
        serialize: serialize.clone(),
        deserialize: deserialize.clone(),
    })(MappingOptions::from(name))
}
