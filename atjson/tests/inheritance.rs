use std::any::TypeId;

use atjson::decorators as json;
use atjson::{
    AfterDeserialize, ClassBuilder, ClassId, CustomSerialize, JsonClass, JsonMapper,
    MappingError, MetadataStore, Result,
};
use serde_json::{json, Value};

#[derive(Debug, Default, PartialEq)]
struct X {
    x: i64,
}

impl AfterDeserialize for X {
    fn after_deserialize(&mut self) {
        self.x += 1;
    }
}

impl JsonClass for X {
    fn describe(class: &mut ClassBuilder<'_, Self>) -> Result<()> {
        class
            .property("x", |c| &c.x, |c| &mut c.x, json::property(()))?
            .after_deserialize();
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq)]
struct Z {
    base: X,
    z: i64,
}

impl AfterDeserialize for Z {
    fn after_deserialize(&mut self) {
        self.base.after_deserialize();
        self.z *= 2;
    }
}

impl JsonClass for Z {
    fn describe(class: &mut ClassBuilder<'_, Self>) -> Result<()> {
        class
            .extends::<X, _, _>(|c| &c.base, |c| &mut c.base)?
            .property("z", |c| &c.z, |c| &mut c.z, json::property(()))?
            .after_deserialize();
        Ok(())
    }
}

/// Inherits the hook of `X` without overriding it.
#[derive(Debug, Default, PartialEq)]
struct Y {
    base: X,
    y: String,
}

impl JsonClass for Y {
    fn describe(class: &mut ClassBuilder<'_, Self>) -> Result<()> {
        class
            .extends::<X, _, _>(|c| &c.base, |c| &mut c.base)?
            .property("y", |c| &c.y, |c| &mut c.y, json::property("why"))?;
        Ok(())
    }
}

/// Overrides the external name of the inherited `x`.
#[derive(Debug, Default, PartialEq)]
struct Renamed {
    base: X,
}

impl JsonClass for Renamed {
    fn describe(class: &mut ClassBuilder<'_, Self>) -> Result<()> {
        class
            .extends::<X, _, _>(|c| &c.base, |c| &mut c.base)?
            .property("x", |c| &c.base.x, |c| &mut c.base.x, json::property("ex"))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Shape {
    sides: u8,
}

impl CustomSerialize for Shape {
    fn custom_serialize(&self, _mapper: &JsonMapper) -> Result<Value> {
        Ok(json!(format!("{}-gon", self.sides)))
    }
}

impl JsonClass for Shape {
    fn describe(class: &mut ClassBuilder<'_, Self>) -> Result<()> {
        class
            .property("sides", |s| &s.sides, |s| &mut s.sides, json::property(()))?
            .custom_serialize();
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Square {
    shape: Shape,
}

impl JsonClass for Square {
    fn describe(class: &mut ClassBuilder<'_, Self>) -> Result<()> {
        class.extends::<Shape, _, _>(|s| &s.shape, |s| &mut s.shape)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Loop;

impl JsonClass for Loop {
    fn describe(class: &mut ClassBuilder<'_, Self>) -> Result<()> {
        class.extends::<Loop, _, _>(|l| l, |l| l)?;
        Ok(())
    }
}

/// Maps its own `other` onto the external key the parent uses for `x`,
/// declaring the parent only afterwards.
#[derive(Debug, Default)]
struct Shadowing {
    base: X,
    other: i64,
}

impl JsonClass for Shadowing {
    fn describe(class: &mut ClassBuilder<'_, Self>) -> Result<()> {
        class
            .property("other", |c| &c.other, |c| &mut c.other, json::property("x"))?
            .extends::<X, _, _>(|c| &c.base, |c| &mut c.base)?;
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq)]
struct Pair {
    a: i64,
    b: i64,
}

impl JsonClass for Pair {
    fn describe(class: &mut ClassBuilder<'_, Self>) -> Result<()> {
        class
            .property("a", |p| &p.a, |p| &mut p.a, json::property("n"))?
            .property("b", |p| &p.b, |p| &mut p.b, json::property("m"))?;
        Ok(())
    }
}

/// Swaps the external names of the two inherited properties.
#[derive(Debug, Default, PartialEq)]
struct Swapped {
    base: Pair,
}

impl JsonClass for Swapped {
    fn describe(class: &mut ClassBuilder<'_, Self>) -> Result<()> {
        class
            .extends::<Pair, _, _>(|c| &c.base, |c| &mut c.base)?
            .property("a", |c| &c.base.a, |c| &mut c.base.a, json::property("m"))?
            .property("b", |c| &c.base.b, |c| &mut c.base.b, json::property("n"))?;
        Ok(())
    }
}

// Neither `Default` is ever called: registration fails first.
#[derive(Debug, Default)]
struct Ping {
    base: Box<Pong>,
}

#[derive(Debug, Default)]
struct Pong {
    base: Box<Ping>,
}

impl JsonClass for Ping {
    fn describe(class: &mut ClassBuilder<'_, Self>) -> Result<()> {
        class.extends::<Pong, _, _>(|c| &*c.base, |c| &mut *c.base)?;
        Ok(())
    }
}

impl JsonClass for Pong {
    fn describe(class: &mut ClassBuilder<'_, Self>) -> Result<()> {
        class.extends::<Ping, _, _>(|c| &*c.base, |c| &mut *c.base)?;
        Ok(())
    }
}

fn mapper() -> JsonMapper {
    let mut store = MetadataStore::new();
    store.register::<Z>().unwrap();
    store.register::<Y>().unwrap();
    store.register::<Renamed>().unwrap();
    store.register::<Square>().unwrap();
    JsonMapper::new(store)
}

#[test]
fn test_subclass_chains_parent_hook_explicitly() {
    let z: Z = mapper().deserialize(json!({"x": 10, "z": 20})).unwrap();
    assert_eq!(z.base.x, 11);
    assert_eq!(z.z, 40);
}

#[test]
fn test_parent_alone_runs_only_its_hook() {
    let x: X = mapper().deserialize(json!({"x": 10, "z": 20})).unwrap();
    assert_eq!(x, X { x: 11 });
}

#[test]
fn test_subclass_inherits_hook_and_rules() {
    let mapper = mapper();

    let y: Y = mapper.deserialize(json!({"x": 1, "why": "w"})).unwrap();
    assert_eq!(y.base.x, 2);
    assert_eq!(y.y, "w");

    assert_eq!(
        mapper.serialize(&y).unwrap(),
        json!({"x": 2, "why": "w"})
    );
}

#[test]
fn test_subclass_override_leaves_parent_untouched() {
    let mapper = mapper();

    let renamed: Renamed = mapper.deserialize(json!({"ex": 5, "x": 100})).unwrap();
    assert_eq!(renamed.base.x, 6);
    assert_eq!(mapper.serialize(&renamed).unwrap(), json!({"ex": 6}));

    let x: X = mapper.deserialize(json!({"ex": 5, "x": 100})).unwrap();
    assert_eq!(x.x, 101);
    assert_eq!(mapper.serialize(&X { x: 1 }).unwrap(), json!({"x": 1}));
}

#[test]
fn test_field_registry_is_a_superset_of_the_parent() {
    let mapper = mapper();
    let store = mapper.store();

    assert_eq!(store.field_keys(TypeId::of::<Z>()), vec!["x", "z"]);
    assert_eq!(store.field_keys(TypeId::of::<X>()), vec!["x"]);
    assert_eq!(store.parent_of(TypeId::of::<Z>()), Some(ClassId::of::<X>()));
    assert_eq!(
        store.lineage(TypeId::of::<Z>()),
        vec![ClassId::of::<Z>(), ClassId::of::<X>()]
    );
}

#[test]
fn test_registering_subclass_registers_parent() {
    let mut store = MetadataStore::new();
    store.register::<Z>().unwrap();
    assert!(store.is_registered(TypeId::of::<X>()));
}

#[test]
fn test_inherited_custom_serialize_hook() {
    let square = Square {
        shape: Shape { sides: 4 },
    };
    assert_eq!(mapper().serialize(&square).unwrap(), json!("4-gon"));
}

#[test]
fn test_class_cannot_extend_itself() {
    let mut store = MetadataStore::new();
    let err = store.register::<Loop>().unwrap_err();
    assert!(matches!(err, MappingError::Configuration(_)));
}

#[test]
fn test_mutual_inheritance_is_a_configuration_error() {
    let mut store = MetadataStore::new();
    let err = store.register::<Ping>().unwrap_err();

    assert!(matches!(err, MappingError::Configuration(_)));
    let message = err.to_string();
    assert!(message.contains("Ping"), "{message}");
    assert!(message.contains("Pong"), "{message}");
    assert!(!store.is_registered(TypeId::of::<Ping>()));
    assert!(!store.is_registered(TypeId::of::<Pong>()));

    store.register::<Z>().unwrap();
    assert!(store.is_registered(TypeId::of::<Z>()));
}

#[test]
fn test_collision_with_parent_declared_later_is_rejected() {
    let mut store = MetadataStore::new();
    let err = store.register::<Shadowing>().unwrap_err();

    match err {
        MappingError::DuplicateExternalName {
            class,
            name,
            existing,
            property,
        } => {
            assert_eq!(class, "Shadowing");
            assert_eq!(name, "x");
            assert_eq!(existing, "x");
            assert_eq!(property, "other");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!store.is_registered(TypeId::of::<Shadowing>()));
}

#[test]
fn test_subclass_may_swap_inherited_external_names() {
    let mut store = MetadataStore::new();
    store.register::<Swapped>().unwrap();
    let mapper = JsonMapper::new(store);

    let swapped: Swapped = mapper.deserialize(json!({"m": 1, "n": 2})).unwrap();
    assert_eq!(swapped.base, Pair { a: 1, b: 2 });
    assert_eq!(mapper.serialize(&swapped).unwrap(), json!({"m": 1, "n": 2}));

    let pair: Pair = mapper.deserialize(json!({"m": 1, "n": 2})).unwrap();
    assert_eq!(pair, Pair { a: 2, b: 1 });
}
