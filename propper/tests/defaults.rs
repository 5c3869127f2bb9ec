//! Initial values: array isolation, shared objects and factories

mod common;

use std::sync::{Arc, Mutex};

use common::managed_type;
use propper::{Managed, ManagedExt, PropArgs, PropConfig, PropValue, Propper, Result};

fn named<T: ManagedExt>(mut blogger: T, name: &str) -> Result<T> {
    blogger.set("name", name)?;
    Ok(blogger)
}

#[test]
fn test_default_arrays_are_per_instance() -> Result<()> {
    managed_type!(StupidBlogger);
    Propper::register::<StupidBlogger>()
        .typed("name", "", "string")?
        .prop_default("flaws", PropValue::array(["stupid", "fat", "smelly"]))?
        .prop_default("tags", PropValue::array(Vec::<PropValue>::new()))?;

    let mut mike = named(StupidBlogger::new(), "Mike")?;
    let mut bob = named(StupidBlogger::new(), "Bob")?;

    assert_eq!(mike.get("tags")?, PropValue::array(Vec::<PropValue>::new()));
    assert_eq!(bob.get("flaws")?, PropValue::array(["stupid", "fat", "smelly"]));

    bob.get("tags")?.as_array().unwrap().push("manga");
    assert_eq!(mike.get("tags")?, PropValue::array(Vec::<PropValue>::new()));
    assert_eq!(bob.get("tags")?, PropValue::array(["manga"]));

    mike.get("flaws")?.as_array().unwrap().push("short");
    assert_eq!(
        mike.get("flaws")?,
        PropValue::array(["stupid", "fat", "smelly", "short"])
    );
    assert_eq!(bob.get("flaws")?, PropValue::array(["stupid", "fat", "smelly"]));
    Ok(())
}

#[test]
fn test_config_objects() -> Result<()> {
    managed_type!(StupidBlogger);
    let flaw_messages = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&flaw_messages);

    Propper::register::<StupidBlogger>()
        .add_prop(
            "name",
            PropArgs::new().config_first(
                PropConfig::new()
                    .of_type("string")
                    .default_value("Stupid Blogger"),
            ),
        )?
        .add_prop(
            "flaws",
            PropArgs::new()
                .default_value(PropValue::array(["stupid", "fat", "smelly"]))
                .typed_config(PropConfig::new().of_type("array").handler(
                    move |value, target, _message, _prop| {
                        let name = target.get("name")?;
                        record.lock().unwrap().push((value.clone(), name));
                        Ok(())
                    },
                )),
        )?
        .add_prop(
            "tags",
            PropArgs::new().config_first(
                PropConfig::new()
                    .of_type("array")
                    .start(|| PropValue::array(Vec::<PropValue>::new())),
            ),
        )?;

    let mut unnamed = StupidBlogger::new();
    assert_eq!(unnamed.get("name")?, "Stupid Blogger");

    let mut mike = named(StupidBlogger::new(), "Mike")?;
    let mut bob = named(StupidBlogger::new(), "Bob")?;

    bob.get("tags")?.as_array().unwrap().push("manga");
    assert_eq!(mike.get("tags")?, PropValue::array(Vec::<PropValue>::new()));
    assert_eq!(bob.get("tags")?, PropValue::array(["manga"]));

    mike.get("flaws")?.as_array().unwrap().push("short");
    assert_eq!(bob.get("flaws")?, PropValue::array(["stupid", "fat", "smelly"]));

    mike.set("flaws", "arrogant")?;
    assert_eq!(
        *flaw_messages.lock().unwrap(),
        vec![(PropValue::from("arrogant"), PropValue::from("Mike"))]
    );
    assert_eq!(
        mike.get("flaws")?,
        PropValue::array(["stupid", "fat", "smelly", "short"])
    );
    Ok(())
}

#[test]
fn test_object_default_is_shared() -> Result<()> {
    managed_type!(Alpha);
    Propper::register::<Alpha>().prop_default("my_map", PropValue::empty_object())?;

    let mut a1 = Alpha::new();
    a1.get("my_map")?.as_object().unwrap().insert("omega", "o");
    let mut a2 = Alpha::new();

    let shared = a2.get("my_map")?;
    assert!(a1.get("my_map")?.strict_eq(&shared));
    assert_eq!(shared.as_object().unwrap().get("omega"), Some(PropValue::from("o")));
    Ok(())
}

#[test]
fn test_function_default_is_a_factory() -> Result<()> {
    managed_type!(Alpha);
    Propper::register::<Alpha>()
        .prop_default("my_map", PropValue::function(|_| PropValue::empty_object()))?;

    let mut a1 = Alpha::new();
    a1.get("my_map")?.as_object().unwrap().insert("omega", "o");
    let mut a2 = Alpha::new();

    let own = a2.get("my_map")?;
    assert!(!a1.get("my_map")?.strict_eq(&own));
    assert_eq!(own.as_object().unwrap().get("omega"), None);
    // the first read is stored
    assert!(own.strict_eq(&a2.get("my_map")?));
    Ok(())
}

#[test]
fn test_function_typed_default_is_the_value() -> Result<()> {
    managed_type!(Button);
    let noop = PropValue::function(|_| PropValue::Undefined);
    Propper::register::<Button>().typed("on_click", noop.clone(), "function")?;

    let mut b = Button::new();
    let handler = b.get("on_click")?;
    assert!(handler.strict_eq(&noop));
    assert!(handler.as_function().unwrap().call(&[]).is_undefined());
    Ok(())
}

#[test]
fn test_set_on_get_false_recomputes() -> Result<()> {
    managed_type!(Clock);
    let ticks = Arc::new(Mutex::new(0_i32));
    let counter = Arc::clone(&ticks);
    Propper::register::<Clock>().add_prop(
        "now",
        PropArgs::new().config(PropConfig::new().set_on_get(false).start(move || {
            let mut ticks = counter.lock().unwrap();
            *ticks += 1;
            PropValue::from(*ticks)
        })),
    )?;

    let mut c = Clock::new();
    assert_eq!(c.get("now")?, 1.0);
    assert_eq!(c.get("now")?, 2.0);
    assert!(!c.slots().is_set("_now"));

    c.set("now", 10)?;
    assert_eq!(c.get("now")?, 10.0);
    assert_eq!(*ticks.lock().unwrap(), 2);
    Ok(())
}

#[test]
fn test_explicit_undefined_default() -> Result<()> {
    managed_type!(Slot);
    Propper::register::<Slot>().add_prop(
        "value",
        PropArgs::new()
            .default_value(5)
            .config(PropConfig::new().default_value(PropValue::Undefined)),
    )?;

    let mut s = Slot::new();
    assert!(s.get("value")?.is_undefined());
    Ok(())
}
