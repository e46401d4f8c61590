//! Generation hints, recorded in the class's metadata next to its mapping
//! rules. They are read by [`MockGenerator`](crate::MockGenerator) only and
//! have no effect on mapping.

use std::fmt;
use std::sync::Arc;

use atjson::{ClassBuilder, JsonClass};
use rand::RngCore;
use serde_json::Value;

/// Shape of the JSON value to generate for a property (or for each item of an
/// array or map property).
#[derive(Debug, Clone, PartialEq)]
pub enum TypeHint {
    String,
    Number,
    Integer,
    Boolean,
    /// One of the given values, picked uniformly.
    Enum(Vec<Value>),
}

impl TypeHint {
    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        TypeHint::Enum(values.into_iter().map(Into::into).collect())
    }
}

/// Length bounds of a generated array, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayHint {
    pub min_len: usize,
    pub max_len: usize,
}

impl ArrayHint {
    pub fn exactly(len: usize) -> Self {
        Self {
            min_len: len,
            max_len: len,
        }
    }
}

/// Supplies the external (JSON) value of a property; takes precedence over
/// every other hint.
#[derive(Clone)]
pub struct Generator(Arc<dyn Fn(&mut dyn RngCore) -> Value + Send + Sync>);

impl Generator {
    pub fn new<F>(generate: F) -> Self
    where
        F: Fn(&mut dyn RngCore) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(generate))
    }

    pub fn generate(&self, rng: &mut dyn RngCore) -> Value {
        (self.0)(rng)
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Generator(..)")
    }
}

/// Hint declarations for use inside [`JsonClass::describe`].
pub trait HintExt {
    fn type_hint(&mut self, property: &'static str, hint: TypeHint) -> &mut Self;

    fn array_hint(&mut self, property: &'static str, hint: ArrayHint) -> &mut Self;

    fn generator<F>(&mut self, property: &'static str, generate: F) -> &mut Self
    where
        F: Fn(&mut dyn RngCore) -> Value + Send + Sync + 'static;
}

impl<T: JsonClass> HintExt for ClassBuilder<'_, T> {
    fn type_hint(&mut self, property: &'static str, hint: TypeHint) -> &mut Self {
        self.define(Some(property), hint)
    }

    fn array_hint(&mut self, property: &'static str, hint: ArrayHint) -> &mut Self {
        self.define(Some(property), hint)
    }

    fn generator<F>(&mut self, property: &'static str, generate: F) -> &mut Self
    where
        F: Fn(&mut dyn RngCore) -> Value + Send + Sync + 'static,
    {
        self.define(Some(property), Generator::new(generate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_one_of_collects_values() {
        assert_eq!(
            TypeHint::one_of(["M", "F"]),
            TypeHint::Enum(vec![json!("M"), json!("F")])
        );
    }

    #[test]
    fn test_generator_calls_through() {
        let generator = Generator::new(|_| json!([1, 2, 3]));
        let mut rng = rand::thread_rng();
        assert_eq!(generator.generate(&mut rng), json!([1, 2, 3]));
    }
}
