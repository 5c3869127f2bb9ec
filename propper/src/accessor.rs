//! Accessors for managed properties.
//!
//! A type opts in by owning a [`Slots`] and implementing [`Managed`]. Reads
//! and writes go through [`read_prop`] and [`write_prop`], which look the
//! property up in the global [`SchemaRegistry`] for the instance's type.
//!
//! Per instance and property a slot is either unset or set. The first read
//! of an unset slot runs the start factory; a write runs the validator and
//! the change hook unless the value is strictly equal to the current one.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::error::{PropError, Result};
use crate::registry::{ManagedProp, SchemaRegistry, TypeKey};
use crate::value::PropValue;

/// Per-instance storage for managed properties, keyed by local name.
#[derive(Debug)]
pub struct Slots {
    owner: TypeKey,
    values: HashMap<String, PropValue>,
}

impl Slots {
    /// Empty storage for an instance of `T`.
    pub fn of<T: Managed>() -> Self {
        Self {
            owner: TypeKey::of::<T>(),
            values: HashMap::new(),
        }
    }

    /// The type whose schema governs these slots.
    pub fn owner(&self) -> TypeKey {
        self.owner
    }

    /// Whether the slot under `local_name` has been populated.
    pub fn is_set(&self, local_name: &str) -> bool {
        self.values.contains_key(local_name)
    }

    /// Current slot value without materializing a default.
    pub fn peek(&self, local_name: &str) -> Option<&PropValue> {
        self.values.get(local_name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn store(&mut self, local_name: &str, value: PropValue) -> Option<PropValue> {
        self.values.insert(local_name.to_string(), value)
    }
}

/// A type carrying managed properties.
///
/// ```rust,ignore
/// struct User {
///     slots: Slots,
/// }
///
/// impl Managed for User {
///     fn slots(&self) -> &Slots { &self.slots }
///     fn slots_mut(&mut self) -> &mut Slots { &mut self.slots }
/// }
///
/// Propper::register::<User>().typed("first", "", "string")?;
/// let mut mike = User { slots: Slots::of::<User>() };
/// mike.set("first", "Mike")?;
/// ```
///
/// Concrete types get their accessors from [`ManagedExt`]; hooks and
/// handlers, which see `&mut dyn Managed`, use the same-named methods on
/// the trait object.
pub trait Managed: 'static {
    fn slots(&self) -> &Slots;
    fn slots_mut(&mut self) -> &mut Slots;
}

/// Accessors for every concrete [`Managed`] type.
pub trait ManagedExt: Managed + Sized {
    /// Read a property, materializing its default on first access.
    fn get(&mut self, name: &str) -> Result<PropValue> {
        read_prop(self, name)
    }

    /// Assign a property.
    fn set(&mut self, name: &str, value: impl Into<PropValue>) -> Result<()> {
        write_prop(self, name, value.into())
    }

    /// Enumerable property names.
    fn prop_names(&self) -> Vec<String> {
        SchemaRegistry::global().enumerable_names(self.slots().owner())
    }
}

impl<T: Managed> ManagedExt for T {}

impl dyn Managed {
    /// Read a property, materializing its default on first access.
    pub fn get(&mut self, name: &str) -> Result<PropValue> {
        read_prop(self, name)
    }

    /// Assign a property.
    pub fn set(&mut self, name: &str, value: impl Into<PropValue>) -> Result<()> {
        write_prop(self, name, value.into())
    }

    /// Enumerable property names.
    pub fn prop_names(&self) -> Vec<String> {
        SchemaRegistry::global().enumerable_names(self.slots().owner())
    }
}

fn lookup(this: &dyn Managed, name: &str) -> Result<Arc<ManagedProp>> {
    let owner = this.slots().owner();
    SchemaRegistry::global()
        .lookup(owner, name)
        .ok_or_else(|| PropError::unknown_property(name, owner.short_name()))
}

/// Read `name` from `this`.
pub fn read_prop(this: &mut dyn Managed, name: &str) -> Result<PropValue> {
    let prop = lookup(this, name)?;
    if let Some(value) = this.slots().peek(&prop.local_name) {
        return Ok(value.clone());
    }

    let value = (prop.start)();
    if prop.set_on_get {
        trace!(property = name, local_name = %prop.local_name, "default materialized");
        this.slots_mut().store(&prop.local_name, value.clone());
    }
    Ok(value)
}

/// Assign `value` to `name` on `this`.
///
/// Rejected values go to the property's bad-value handler and leave the slot
/// untouched; the handler's result is returned.
pub fn write_prop(this: &mut dyn Managed, name: &str, value: PropValue) -> Result<()> {
    let prop = lookup(this, name)?;
    if let Some(current) = this.slots().peek(&prop.local_name) {
        if current.strict_eq(&value) {
            return Ok(());
        }
    }

    if let Some(validator) = &prop.validator {
        if let Some(message) = validator(&value) {
            return (prop.on_bad_value)(&value, this, &message, prop.name());
        }
    }

    let last = this
        .slots_mut()
        .store(&prop.local_name, value.clone())
        .unwrap_or_default();
    if !value.strict_eq(&last) {
        if let Some(on_change) = &prop.on_change {
            on_change(&value, &last, this, prop.name());
        }
    }
    Ok(())
}
