//! Schema registry.
//!
//! One schema per target type, keyed by [`TypeKey`]. A schema maps property
//! names to their registration record and may name a parent type whose
//! properties it inherits. The registry is written at registration time and
//! read by accessors afterwards.
//!
//! Lookups hand out `Arc` clones; no lock is held while factories,
//! validators, hooks or handlers run.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use tracing::debug;

use crate::config::{BadValueHandler, OnChange, PropConfig, StartFn};
use crate::error::{PropError, Result};
use crate::validator::{TypeSpec, Validator};

static GLOBAL: OnceLock<SchemaRegistry> = OnceLock::new();

/// Identity of a target type.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Full type path.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

/// What was registered for a property: its name, declared type and the
/// options object as given.
#[derive(Clone, Debug)]
pub struct SchemaDef {
    pub name: String,
    pub type_spec: Option<TypeSpec>,
    pub config: PropConfig,
}

/// A registered property with its resolved accessor pieces.
pub struct ManagedProp {
    pub def: SchemaDef,
    pub local_name: String,
    pub enumerable: bool,
    pub set_on_get: bool,
    pub(crate) start: StartFn,
    pub(crate) validator: Option<Validator>,
    pub(crate) on_bad_value: BadValueHandler,
    pub(crate) on_change: Option<OnChange>,
}

impl ManagedProp {
    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn is_validated(&self) -> bool {
        self.validator.is_some()
    }
}

impl fmt::Debug for ManagedProp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedProp")
            .field("def", &self.def)
            .field("local_name", &self.local_name)
            .field("enumerable", &self.enumerable)
            .field("set_on_get", &self.set_on_get)
            .field("validated", &self.is_validated())
            .finish()
    }
}

#[derive(Default)]
struct Schema {
    parent: Option<TypeKey>,
    props: IndexMap<String, Arc<ManagedProp>>,
}

/// Registry of per-type schemas.
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<TypeKey, Schema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by accessors.
    pub fn global() -> &'static SchemaRegistry {
        GLOBAL.get_or_init(SchemaRegistry::new)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<TypeKey, Schema>> {
        self.schemas.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TypeKey, Schema>> {
        self.schemas.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace a property. Returns the replaced record, if any.
    pub(crate) fn insert(&self, owner: TypeKey, prop: ManagedProp) -> Option<Arc<ManagedProp>> {
        let name = prop.def.name.clone();
        self.write()
            .entry(owner)
            .or_default()
            .props
            .insert(name, Arc::new(prop))
    }

    /// Make `parent`'s properties visible through `child`.
    pub fn set_parent(&self, child: TypeKey, parent: TypeKey) -> Result<()> {
        let mut schemas = self.write();
        let cyclic = child == parent || chain(&schemas, parent).contains(&child);
        if cyclic {
            return Err(PropError::InheritanceCycle {
                child: child.short_name().to_string(),
                parent: parent.short_name().to_string(),
            });
        }
        schemas.entry(child).or_default().parent = Some(parent);
        debug!(child = child.name(), parent = parent.name(), "schema parent linked");
        Ok(())
    }

    pub fn parent(&self, owner: TypeKey) -> Option<TypeKey> {
        self.read().get(&owner).and_then(|schema| schema.parent)
    }

    /// Find a property on `owner` or its ancestors.
    pub fn lookup(&self, owner: TypeKey, name: &str) -> Option<Arc<ManagedProp>> {
        let schemas = self.read();
        chain(&schemas, owner)
            .into_iter()
            .find_map(|key| schemas.get(&key)?.props.get(name).cloned())
    }

    pub fn contains(&self, owner: TypeKey, name: &str) -> bool {
        self.lookup(owner, name).is_some()
    }

    /// Resolved records visible through `owner`: inherited entries first,
    /// the closest registration wins.
    pub fn props(&self, owner: TypeKey) -> IndexMap<String, Arc<ManagedProp>> {
        let schemas = self.read();
        let mut props = IndexMap::new();
        for key in chain(&schemas, owner).into_iter().rev() {
            if let Some(schema) = schemas.get(&key) {
                for (name, prop) in &schema.props {
                    props.insert(name.clone(), Arc::clone(prop));
                }
            }
        }
        props
    }

    /// Introspection view: property name to `{name, type, config}`.
    pub fn schema(&self, owner: TypeKey) -> IndexMap<String, SchemaDef> {
        self.props(owner)
            .into_iter()
            .map(|(name, prop)| (name, prop.def.clone()))
            .collect()
    }

    /// Names of enumerable properties, in registration order.
    pub fn enumerable_names(&self, owner: TypeKey) -> Vec<String> {
        self.props(owner)
            .into_iter()
            .filter(|(_, prop)| prop.enumerable)
            .map(|(name, _)| name)
            .collect()
    }
}

/// `owner` followed by its ancestors. Cycles are rejected by `set_parent`.
fn chain(schemas: &HashMap<TypeKey, Schema>, owner: TypeKey) -> Vec<TypeKey> {
    let mut keys = vec![owner];
    let mut current = owner;
    while let Some(parent) = schemas.get(&current).and_then(|schema| schema.parent) {
        keys.push(parent);
        current = parent;
    }
    keys
}

/// Schema of `T` in the global registry.
pub fn schema_of<T: ?Sized + 'static>() -> IndexMap<String, SchemaDef> {
    SchemaRegistry::global().schema(TypeKey::of::<T>())
}
