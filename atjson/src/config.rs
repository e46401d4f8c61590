use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{MappingError, Result};

/// Turns JSON text into a [`Value`] before it is mapped.
pub trait StringParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Value>;
}

impl<F> StringParser for F
where
    F: Fn(&str) -> Result<Value> + Send + Sync,
{
    fn parse(&self, text: &str) -> Result<Value> {
        self(text)
    }
}

/// Parses with `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl StringParser for JsonParser {
    fn parse(&self, text: &str) -> Result<Value> {
        serde_json::from_str(text).map_err(MappingError::from)
    }
}

#[derive(Clone)]
pub struct MapperConfig {
    pub string_parser: Arc<dyn StringParser>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            string_parser: Arc::new(JsonParser),
        }
    }
}

impl MapperConfig {
    pub fn with_string_parser(mut self, parser: impl StringParser + 'static) -> Self {
        self.string_parser = Arc::new(parser);
        self
    }
}

impl fmt::Debug for MapperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperConfig").finish_non_exhaustive()
    }
}
