//! Random instances of `atjson` mapped classes, for tests and fixtures.
//!
//! The generator only reads the metadata registered by the classes: field
//! registries and rule kinds drive the overall shape, and the hints declared
//! with [`HintExt`] pick the values.
//!
//! ```ignore
//! impl JsonClass for User {
//!     fn describe(class: &mut ClassBuilder<'_, Self>) -> atjson::Result<()> {
//!         class
//!             .property("name", |u| &u.name, |u| &mut u.name, json::property(()))?
//!             .type_hint("name", TypeHint::String);
//!         Ok(())
//!     }
//! }
//!
//! let user: User = MockGenerator::new(mapper).generate()?;
//! ```

mod error;
mod generator;
pub mod hints;

pub use error::{MockError, Result};
pub use generator::{MockConfig, MockGenerator};
pub use hints::{ArrayHint, Generator, HintExt, TypeHint};
