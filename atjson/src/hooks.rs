//! Optional per-class escape hatches.
//!
//! A class opts into a hook by implementing the trait and declaring it in its
//! [`describe`](crate::JsonClass::describe) through
//! [`ClassBuilder::custom_serialize`](crate::ClassBuilder::custom_serialize) or
//! [`ClassBuilder::after_deserialize`](crate::ClassBuilder::after_deserialize).
//! The declaration records a capability in the metadata store, which the
//! mapper queries at runtime.

use std::any::Any;

use serde_json::Value;

use crate::error::Result;
use crate::mapper::JsonMapper;

/// Replaces the default serialization of a class entirely.
pub trait CustomSerialize {
    fn custom_serialize(&self, mapper: &JsonMapper) -> Result<Value>;
}

/// Runs once on every instance built by deserialization, after all fields are set.
///
/// Overriding implementations on a subclass do not chain automatically; call
/// the parent's `after_deserialize` explicitly to keep its behavior.
pub trait AfterDeserialize {
    fn after_deserialize(&mut self);
}

type CustomSerializeFn = fn(&dyn Any, &JsonMapper) -> Option<Result<Value>>;

/// Capability record for [`CustomSerialize`].
#[derive(Clone, Copy)]
pub struct CustomSerializeHook(CustomSerializeFn);

impl CustomSerializeHook {
    pub(crate) fn of<T: CustomSerialize + Any>() -> Self {
        fn call<T: CustomSerialize + Any>(obj: &dyn Any, mapper: &JsonMapper) -> Option<Result<Value>> {
            obj.downcast_ref::<T>().map(|t| t.custom_serialize(mapper))
        }
        Self(call::<T>)
    }

    /// `None` when `obj` is not an instance of the class that declared the hook.
    pub(crate) fn invoke(&self, obj: &dyn Any, mapper: &JsonMapper) -> Option<Result<Value>> {
        (self.0)(obj, mapper)
    }
}

/// Capability record for [`AfterDeserialize`].
#[derive(Clone, Copy)]
pub struct AfterDeserializeHook(fn(&mut dyn Any) -> bool);

impl AfterDeserializeHook {
    pub(crate) fn of<T: AfterDeserialize + Any>() -> Self {
        fn call<T: AfterDeserialize + Any>(obj: &mut dyn Any) -> bool {
            match obj.downcast_mut::<T>() {
                Some(t) => {
                    t.after_deserialize();
                    true
                }
                None => false,
            }
        }
        Self(call::<T>)
    }

    pub(crate) fn invoke(&self, obj: &mut dyn Any) -> bool {
        (self.0)(obj)
    }
}
