use thiserror::Error;

/// Everything that can go wrong while registering or mapping a class.
#[derive(Error, Debug)]
pub enum MappingError {
    /// Inconsistent mapping declaration, raised while the class is being described.
    #[error("Invalid mapping configuration: {0}")]
    Configuration(String),

    #[error("Class '{class}' is not registered; register it before mapping")]
    UnregisteredClass { class: String },

    #[error("Expected {expected}, got {found}")]
    ShapeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error(
        "Properties '{existing}' and '{property}' of '{class}' both map to the external key '{name}'"
    )]
    DuplicateExternalName {
        class: String,
        name: String,
        existing: String,
        property: String,
    },

    #[error("Failed to map property '{property}' of '{class}': {source}")]
    Property {
        class: String,
        property: String,
        #[source]
        source: Box<MappingError>,
    },

    #[error("Lineage of '{class}' does not reach '{ancestor}'")]
    BrokenLineage { class: String, ancestor: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

impl MappingError {
    /// Error raised from a user supplied serialize or deserialize function.
    pub fn custom(message: impl std::fmt::Display) -> Self {
        MappingError::Custom(message.to_string())
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        MappingError::Configuration(message.into())
    }

    pub(crate) fn in_property(self, class: &str, property: &str) -> Self {
        MappingError::Property {
            class: class.to_string(),
            property: property.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping the property context wrappers.
    pub fn root_cause(&self) -> &MappingError {
        match self {
            MappingError::Property { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T, E = MappingError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_nested_property_context() {
        let err = MappingError::ShapeMismatch {
            expected: "array",
            found: "string",
        }
        .in_property("Inner", "xs")
        .in_property("Outer", "inner");

        assert!(matches!(
            err.root_cause(),
            MappingError::ShapeMismatch {
                found: "string",
                ..
            }
        ));
        let message = err.to_string();
        assert!(message.contains("Outer"));
        assert!(message.contains("Expected array, got string"));
    }
}
