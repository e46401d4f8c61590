use atjson::MappingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MockError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("Invalid array hint on '{class}.{property}': min_len {min_len} exceeds max_len {max_len}")]
    InvalidArrayHint {
        class: String,
        property: String,
        min_len: usize,
        max_len: usize,
    },

    #[error("Nesting of '{class}' exceeds {max_depth} levels; the class graph is probably cyclic")]
    TooDeep { class: String, max_depth: usize },
}

pub type Result<T, E = MockError> = std::result::Result<T, E>;
