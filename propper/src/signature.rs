//! Call-signature normalization.
//!
//! A registration takes up to three positional arguments after the name:
//! a default, a type and a trailing config. Each position accepts more than
//! one shape, so the arguments are resolved here into a single
//! [`NormalizedArgs`] before anything else looks at them.
//!
//! Precedence, first match wins:
//!
//! 1. a trailing bad-value handler resets the options to empty;
//! 2. a config in the default position with no type is the options object
//!    and the positional default is dropped;
//! 3. a config in the type position is the options object and its declared
//!    type becomes the effective type;
//! 4. otherwise the trailing config, if any, is the options object.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::accessor::Managed;
use crate::config::{BadValueHandler, PropConfig};
use crate::error::Result;
use crate::validator::TypeSpec;
use crate::value::PropValue;

/// Second positional argument.
#[derive(Clone, Debug, Default)]
pub enum DefaultArg {
    #[default]
    Absent,
    Value(PropValue),
    Config(PropConfig),
}

/// Third positional argument.
#[derive(Clone, Debug)]
pub enum TypeArg {
    Spec(TypeSpec),
    Config(PropConfig),
}

/// Fourth positional argument.
#[derive(Clone)]
pub enum TrailingArg {
    Config(PropConfig),
    OnBadValue(BadValueHandler),
}

impl fmt::Debug for TrailingArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(config) => f.debug_tuple("Config").field(config).finish(),
            Self::OnBadValue(_) => f.write_str("OnBadValue(..)"),
        }
    }
}

/// Positional arguments of a registration.
#[derive(Clone, Debug, Default)]
pub struct PropArgs {
    pub default: DefaultArg,
    pub type_arg: Option<TypeArg>,
    pub trailing: Option<TrailingArg>,
}

impl PropArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional default value.
    pub fn default_value(mut self, value: impl Into<PropValue>) -> Self {
        self.default = DefaultArg::Value(value.into());
        self
    }

    /// Config passed where the default would go.
    pub fn config_first(mut self, config: PropConfig) -> Self {
        self.default = DefaultArg::Config(config);
        self
    }

    pub fn of_type(mut self, type_spec: impl Into<TypeSpec>) -> Self {
        self.type_arg = Some(TypeArg::Spec(type_spec.into()));
        self
    }

    /// Config passed where the type would go.
    pub fn typed_config(mut self, config: PropConfig) -> Self {
        self.type_arg = Some(TypeArg::Config(config));
        self
    }

    pub fn config(mut self, config: PropConfig) -> Self {
        self.trailing = Some(TrailingArg::Config(config));
        self
    }

    pub fn on_bad_value<F>(mut self, f: F) -> Self
    where
        F: Fn(&PropValue, &mut dyn Managed, &str, &str) -> Result<()> + Send + Sync + 'static,
    {
        self.trailing = Some(TrailingArg::OnBadValue(Arc::new(f)));
        self
    }
}

/// Canonical form of a registration's arguments.
#[derive(Clone)]
pub struct NormalizedArgs {
    /// Effective default, after `default_value` in the options overrides it
    pub default: PropValue,
    pub type_spec: Option<TypeSpec>,
    /// The options object as selected by the precedence rules
    pub config: PropConfig,
    /// Handler given positionally; beats any policy in `config`
    pub on_bad_value: Option<BadValueHandler>,
}

/// Resolve positional arguments for the property `name`.
pub fn normalize(name: &str, args: PropArgs) -> NormalizedArgs {
    let PropArgs {
        default,
        type_arg,
        trailing,
    } = args;

    let (mut positional, mut default_config) = match default {
        DefaultArg::Absent => (PropValue::Undefined, None),
        DefaultArg::Value(value) => (value, None),
        DefaultArg::Config(config) => (PropValue::Undefined, Some(config)),
    };
    let type_given = type_arg.is_some();
    let (mut type_spec, type_config) = match type_arg {
        None => (None, None),
        Some(TypeArg::Spec(spec)) => (Some(spec), None),
        Some(TypeArg::Config(config)) => (None, Some(config)),
    };

    let mut on_bad_value = None;
    let config = match trailing {
        Some(TrailingArg::OnBadValue(handler)) => {
            on_bad_value = Some(handler);
            if type_config.is_some() {
                warn!(property = name, "config in type position ignored: bad-value handler given");
            }
            PropConfig::default()
        }
        trailing => match (default_config.take(), type_config) {
            (Some(config), None) if !type_given => config,
            (stray, Some(config)) => {
                default_config = stray;
                type_spec = config.type_spec.clone();
                config
            }
            (stray, None) => {
                default_config = stray;
                match trailing {
                    Some(TrailingArg::Config(config)) => config,
                    _ => PropConfig::default(),
                }
            }
        },
    };

    if default_config.is_some() {
        warn!(property = name, "config in default position ignored");
        positional = PropValue::Undefined;
    }

    let default = config.default_value.clone().unwrap_or(positional);

    NormalizedArgs {
        default,
        type_spec,
        config,
        on_bad_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_positional() {
        let args = PropArgs::new().default_value("").of_type("string");
        let n = normalize("first", args);
        assert_eq!(n.default, "");
        assert_eq!(n.type_spec.unwrap().type_name(), Some("string"));
        assert!(n.on_bad_value.is_none());
    }

    #[test]
    fn test_handler_resets_options() {
        let args = PropArgs::new()
            .default_value(0)
            .of_type("integer")
            .on_bad_value(|_, _, _, _| Ok(()));
        let n = normalize("min", args);
        assert!(n.on_bad_value.is_some());
        assert!(n.config.local_name.is_none());
        assert_eq!(n.default, 0.0);
        assert_eq!(n.type_spec.unwrap().type_name(), Some("integer"));
    }

    #[test]
    fn test_config_in_default_position() {
        let config = PropConfig::new()
            .of_type("string")
            .default_value("Stupid Blogger");
        let n = normalize("name", PropArgs::new().config_first(config));
        assert_eq!(n.default, "Stupid Blogger");
        // the type is only read from a config in the type position
        assert!(n.type_spec.is_none());
        assert!(n.config.type_spec.is_some());
    }

    #[test]
    fn test_config_in_default_position_drops_default() {
        let n = normalize("tags", PropArgs::new().config_first(PropConfig::new()));
        assert!(n.default.is_undefined());
    }

    #[test]
    fn test_config_in_type_position() {
        let config = PropConfig::new().of_type("array").local_name("__flaws");
        let args = PropArgs::new()
            .default_value(PropValue::array(["stupid"]))
            .typed_config(config)
            .config(PropConfig::new().local_name("ignored"));
        let n = normalize("flaws", args);
        assert_eq!(n.type_spec.unwrap().type_name(), Some("array"));
        assert_eq!(n.config.local_name.as_deref(), Some("__flaws"));
        assert_eq!(n.default, PropValue::array(["stupid"]));
    }

    #[test]
    fn test_trailing_config() {
        let args = PropArgs::new()
            .default_value(1)
            .of_type("number")
            .config(PropConfig::new().enumerable(false));
        let n = normalize("count", args);
        assert_eq!(n.config.enumerable, Some(false));
        assert_eq!(n.default, 1.0);
    }

    #[test]
    fn test_explicit_undefined_default_overrides() {
        let args = PropArgs::new()
            .default_value(5)
            .config(PropConfig::new().default_value(PropValue::Undefined));
        let n = normalize("count", args);
        assert!(n.default.is_undefined());
    }

    #[test]
    fn test_stray_config_with_type_is_ignored() {
        let args = PropArgs::new()
            .config_first(PropConfig::new().local_name("lost"))
            .of_type("string");
        let n = normalize("first", args);
        assert!(n.default.is_undefined());
        assert!(n.config.local_name.is_none());
        assert_eq!(n.type_spec.unwrap().type_name(), Some("string"));
    }
}
