//! Property registration.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::accessor::Managed;
use crate::config::PropConfig;
use crate::error::Result;
use crate::policy;
use crate::registry::{ManagedProp, SchemaDef, SchemaRegistry, TypeKey};
use crate::signature::{normalize, NormalizedArgs, PropArgs};
use crate::start::{build_start, StartPlan};
use crate::type_tests::TypeTests;
use crate::validator::{self, check_name, TypeSpec};
use crate::value::PropValue;

/// Display name used in messages when none is given.
pub const DEFAULT_DISPLAY_NAME: &str = "instance";

/// Registrar binding managed properties to one target type.
///
/// Registrations go to the global [`SchemaRegistry`] and are visible to
/// every instance of the target, including ones created earlier.
#[derive(Debug, Clone)]
pub struct Propper {
    target: TypeKey,
    display_name: String,
    type_tests: Arc<TypeTests>,
}

impl Propper {
    /// Registrar for `T` using the built-in type tests.
    pub fn register<T: Managed>() -> Self {
        Self::named::<T>(DEFAULT_DISPLAY_NAME)
    }

    /// Registrar for `T` that names the type `display_name` in messages.
    pub fn named<T: Managed>(display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            target: TypeKey::of::<T>(),
            display_name: if display_name.is_empty() {
                DEFAULT_DISPLAY_NAME.to_string()
            } else {
                display_name
            },
            type_tests: TypeTests::shared_builtin(),
        }
    }

    /// Use `tests` to resolve type names for later registrations.
    pub fn with_type_tests(mut self, tests: TypeTests) -> Self {
        self.type_tests = Arc::new(tests);
        self
    }

    /// Inherit the properties registered for `P`.
    pub fn extends<P: Managed>(&mut self) -> Result<&mut Self> {
        SchemaRegistry::global().set_parent(self.target, TypeKey::of::<P>())?;
        Ok(self)
    }

    pub fn target(&self) -> TypeKey {
        self.target
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn type_tests(&self) -> &TypeTests {
        &self.type_tests
    }

    /// Register the property `name`.
    ///
    /// Fails without registering anything when the name is not an
    /// identifier, a type name is missing from the type-test table, or a
    /// pattern does not compile. Registering a name again replaces the
    /// earlier registration.
    pub fn add_prop(&mut self, name: &str, args: PropArgs) -> Result<&mut Self> {
        check_name(name)?;
        let NormalizedArgs {
            default,
            type_spec,
            config,
            on_bad_value,
        } = normalize(name, args);

        let validator = validator::resolve(
            name,
            type_spec.as_ref(),
            config.test.as_ref(),
            &self.type_tests,
        )?;
        let on_bad_value = policy::resolve(
            on_bad_value,
            config.on_bad_value.as_ref(),
            name,
            type_spec.as_ref(),
            &self.display_name,
        );
        let StartPlan { start, set_on_get } = build_start(
            default,
            type_spec.as_ref(),
            config.start.clone(),
            config.set_on_get.unwrap_or(true),
        );
        let local_name = config
            .local_name
            .clone()
            .unwrap_or_else(|| format!("_{name}"));

        debug!(
            property = name,
            owner = self.target.name(),
            local_name = %local_name,
            validated = validator.is_some(),
            "registering managed property"
        );

        let prop = ManagedProp {
            enumerable: config.enumerable.unwrap_or(true),
            on_change: config.on_change.clone(),
            def: SchemaDef {
                name: name.to_string(),
                type_spec,
                config,
            },
            local_name,
            set_on_get,
            start,
            validator,
            on_bad_value,
        };
        if SchemaRegistry::global().insert(self.target, prop).is_some() {
            debug!(property = name, owner = self.target.name(), "replaced earlier registration");
        }
        Ok(self)
    }

    /// Untyped property starting out `Undefined`.
    pub fn prop(&mut self, name: &str) -> Result<&mut Self> {
        self.add_prop(name, PropArgs::new())
    }

    /// Untyped property with a default.
    pub fn prop_default(&mut self, name: &str, default: impl Into<PropValue>) -> Result<&mut Self> {
        self.add_prop(name, PropArgs::new().default_value(default))
    }

    /// Property with a default and a type specifier.
    pub fn typed(
        &mut self,
        name: &str,
        default: impl Into<PropValue>,
        type_spec: impl Into<TypeSpec>,
    ) -> Result<&mut Self> {
        self.add_prop(name, PropArgs::new().default_value(default).of_type(type_spec))
    }

    /// Property described entirely by an options object.
    ///
    /// The declared type is taken from `config.type_spec` and the default
    /// from `config.default_value`.
    pub fn configured(&mut self, name: &str, config: PropConfig) -> Result<&mut Self> {
        let default = config.default_value.clone().unwrap_or_default();
        self.add_prop(name, PropArgs::new().default_value(default).typed_config(config))
    }

    /// Typed property whose rejected values go to `on_bad_value`.
    pub fn guarded<F>(
        &mut self,
        name: &str,
        default: impl Into<PropValue>,
        type_spec: impl Into<TypeSpec>,
        on_bad_value: F,
    ) -> Result<&mut Self>
    where
        F: Fn(&PropValue, &mut dyn Managed, &str, &str) -> Result<()> + Send + Sync + 'static,
    {
        self.add_prop(
            name,
            PropArgs::new()
                .default_value(default)
                .of_type(type_spec)
                .on_bad_value(on_bad_value),
        )
    }

    /// Properties visible through the target, inherited ones included.
    pub fn schema(&self) -> IndexMap<String, SchemaDef> {
        SchemaRegistry::global().schema(self.target)
    }
}
