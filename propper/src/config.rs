//! Per-property options.

use std::fmt;
use std::sync::Arc;

use crate::accessor::Managed;
use crate::error::Result;
use crate::validator::{TestSpec, TypeSpec};
use crate::value::PropValue;

/// Change hook: `(new_value, old_value, instance, property_name)`.
pub type OnChange = Arc<dyn Fn(&PropValue, &PropValue, &mut dyn Managed, &str) + Send + Sync>;

/// Bad-value handler: `(value, instance, message, property_name)`.
///
/// The handler may write to the instance as a repair. Its error, if any, is
/// returned from the rejected assignment.
pub type BadValueHandler =
    Arc<dyn Fn(&PropValue, &mut dyn Managed, &str, &str) -> Result<()> + Send + Sync>;

/// Zero-argument factory for a property's initial value.
pub type StartFn = Arc<dyn Fn() -> PropValue + Send + Sync>;

/// What happens when an assignment fails validation.
#[derive(Clone, Default)]
pub enum BadValuePolicy {
    /// Return [`PropError::BadValue`](crate::PropError::BadValue)
    #[default]
    Throw,
    /// Log the rejection and keep the previous value
    Warn,
    /// Hand the value to a custom handler
    Handler(BadValueHandler),
}

impl fmt::Debug for BadValuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Throw => f.write_str("Throw"),
            Self::Warn => f.write_str("Warn"),
            Self::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

/// Options recognised by a property registration.
///
/// Every field is optional; unset fields take their built-in defaults when
/// the property is registered. The options object is recorded as-is in the
/// type's schema.
#[derive(Clone, Default)]
pub struct PropConfig {
    /// Slot key on the instance, default `_<name>`
    pub local_name: Option<String>,
    pub on_change: Option<OnChange>,
    /// Whether the property is listed by enumeration, default true
    pub enumerable: Option<bool>,
    /// Overrides the positional default when present, even if `Undefined`
    pub default_value: Option<PropValue>,
    pub on_bad_value: Option<BadValuePolicy>,
    /// Factory for the initial value; used verbatim when present
    pub start: Option<StartFn>,
    /// Validator source used when no type is declared
    pub test: Option<TestSpec>,
    /// Declared type, read when the config sits in the type position
    pub type_spec: Option<TypeSpec>,
    /// Whether the first read stores the initial value, default true
    pub set_on_get: Option<bool>,
}

impl PropConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_name(mut self, local_name: impl Into<String>) -> Self {
        self.local_name = Some(local_name.into());
        self
    }

    pub fn on_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&PropValue, &PropValue, &mut dyn Managed, &str) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(f));
        self
    }

    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = Some(enumerable);
        self
    }

    pub fn default_value(mut self, value: impl Into<PropValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn on_bad_value(mut self, policy: BadValuePolicy) -> Self {
        self.on_bad_value = Some(policy);
        self
    }

    /// Log rejected assignments instead of failing them.
    pub fn warn(self) -> Self {
        self.on_bad_value(BadValuePolicy::Warn)
    }

    /// Route rejected assignments to `f`.
    pub fn handler<F>(self, f: F) -> Self
    where
        F: Fn(&PropValue, &mut dyn Managed, &str, &str) -> Result<()> + Send + Sync + 'static,
    {
        self.on_bad_value(BadValuePolicy::Handler(Arc::new(f)))
    }

    pub fn start<F>(mut self, f: F) -> Self
    where
        F: Fn() -> PropValue + Send + Sync + 'static,
    {
        self.start = Some(Arc::new(f));
        self
    }

    pub fn test(mut self, test: impl Into<TestSpec>) -> Self {
        self.test = Some(test.into());
        self
    }

    pub fn of_type(mut self, type_spec: impl Into<TypeSpec>) -> Self {
        self.type_spec = Some(type_spec.into());
        self
    }

    pub fn set_on_get(mut self, set_on_get: bool) -> Self {
        self.set_on_get = Some(set_on_get);
        self
    }
}

impl fmt::Debug for PropConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropConfig")
            .field("local_name", &self.local_name)
            .field("on_change", &self.on_change.as_ref().map(|_| ".."))
            .field("enumerable", &self.enumerable)
            .field("default_value", &self.default_value)
            .field("on_bad_value", &self.on_bad_value)
            .field("start", &self.start.as_ref().map(|_| ".."))
            .field("test", &self.test)
            .field("type_spec", &self.type_spec)
            .field("set_on_get", &self.set_on_get)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let config = PropConfig::new()
            .local_name("__first")
            .enumerable(false)
            .default_value("Stupid Blogger")
            .of_type("string")
            .warn();
        assert_eq!(config.local_name.as_deref(), Some("__first"));
        assert_eq!(config.enumerable, Some(false));
        assert_eq!(config.default_value, Some(PropValue::from("Stupid Blogger")));
        assert_eq!(
            config.type_spec.as_ref().and_then(TypeSpec::type_name),
            Some("string")
        );
        assert!(matches!(config.on_bad_value, Some(BadValuePolicy::Warn)));
    }

    #[test]
    fn test_debug_hides_closures() {
        let config = PropConfig::new().start(|| PropValue::empty_object());
        let debug = format!("{config:?}");
        assert!(debug.contains("start: Some(\"..\")"));
    }
}
