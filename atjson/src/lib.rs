//! Declarative mapping between Rust structs and JSON.
//!
//! A struct becomes mappable by implementing [`JsonClass`]: its `describe`
//! function applies mapping rules from [`decorators`] to its fields, may
//! declare a parent class it embeds, and may opt into the [`CustomSerialize`]
//! and [`AfterDeserialize`] hooks. Registering the class records all of this in
//! a [`MetadataStore`], which a [`JsonMapper`] then consults to serialize and
//! deserialize instances.
//!
//! ```ignore
//! use atjson::{decorators as json, ClassBuilder, JsonClass, JsonMapper, MetadataStore, Result};
//!
//! #[derive(Default)]
//! struct Person {
//!     age: u32,
//!     tags: Option<Vec<String>>,
//! }
//!
//! impl JsonClass for Person {
//!     fn describe(class: &mut ClassBuilder<'_, Self>) -> Result<()> {
//!         class
//!             .property("age", |p| &p.age, |p| &mut p.age, json::property("eta"))?
//!             .property("tags", |p| &p.tags, |p| &mut p.tags, json::array((), false)?)?;
//!         Ok(())
//!     }
//! }
//!
//! let mut store = MetadataStore::new();
//! store.register::<Person>()?;
//! let mapper = JsonMapper::new(store);
//! let person: Person = mapper.deserialize(r#"{"eta": 16, "tags": ["a"]}"#)?;
//! ```

pub mod class;
pub mod config;
pub mod decorators;
pub mod error;
pub mod hooks;
mod lens;
pub mod mapper;
pub mod metadata;
pub mod utils;

pub use class::{ClassBuilder, ClassOptions, ClassRegistration, JsonClass, JsonSerializable};
pub use config::{JsonParser, MapperConfig, StringParser};
pub use decorators::{MappingOptions, MappingRule, PropertyKind, PropertyMapping, PropertyName};
pub use error::{MappingError, Result};
pub use hooks::{AfterDeserialize, CustomSerialize};
pub use mapper::JsonMapper;
pub use metadata::{ClassId, FieldRegistry, MetadataStore, PropertyMetadata, Resolved};
