//! Declarative property definitions.
//!
//! A declaration file is a list of entries, registered in document order:
//!
//! ```yaml
//! - name: first
//!   type: string
//!   default: ""
//! - name: code
//!   type: "/^[A-Z]{3}$/"
//!   on_bad_value: warn
//! - name: tags
//!   type: array
//!   default: []
//!   enumerable: false
//! ```
//!
//! A `type` written between slashes is a regular expression; anything else
//! names an entry in the type-test table. A `default` of `null` is treated
//! as absent.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{BadValuePolicy, PropConfig};
use crate::error::Result;
use crate::propper::Propper;
use crate::signature::PropArgs;
use crate::validator::{check_name, type_test, TypeSpec};
use crate::value::PropValue;

/// Bad-value policy expressible in a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeclPolicy {
    Throw,
    Warn,
}

/// One property definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropDecl {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<PropValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enumerable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_bad_value: Option<DeclPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_on_get: Option<bool>,
}

impl PropDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            default: None,
            local_name: None,
            enumerable: None,
            on_bad_value: None,
            set_on_get: None,
        }
    }

    /// The declared type as a specifier.
    pub fn type_spec(&self) -> Result<Option<TypeSpec>> {
        let Some(type_name) = self.type_name.as_deref() else {
            return Ok(None);
        };
        let pattern = type_name
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'));
        match pattern {
            Some(pattern) => Ok(Some(TypeSpec::pattern(pattern)?)),
            None => Ok(Some(TypeSpec::name(type_name))),
        }
    }

    /// Registration arguments for this declaration.
    pub fn to_args(&self) -> Result<PropArgs> {
        let mut config = PropConfig::new();
        if let Some(local_name) = &self.local_name {
            config = config.local_name(local_name.clone());
        }
        if let Some(enumerable) = self.enumerable {
            config = config.enumerable(enumerable);
        }
        if let Some(set_on_get) = self.set_on_get {
            config = config.set_on_get(set_on_get);
        }
        match self.on_bad_value {
            Some(DeclPolicy::Warn) => config = config.warn(),
            Some(DeclPolicy::Throw) => config = config.on_bad_value(BadValuePolicy::Throw),
            None => {}
        }

        let mut args = PropArgs::new();
        if let Some(default) = &self.default {
            args = args.default_value(default.clone());
        }
        if let Some(type_spec) = self.type_spec()? {
            args = args.of_type(type_spec);
        }
        Ok(args.config(config))
    }
}

/// Parse a YAML list of declarations.
pub fn parse_yaml(yaml: &str) -> Result<Vec<PropDecl>> {
    Ok(serde_yaml_ng::from_str(yaml)?)
}

/// Parse a JSON array of declarations.
pub fn parse_json(json: &str) -> Result<Vec<PropDecl>> {
    Ok(serde_json::from_str(json)?)
}

impl Propper {
    /// Register each declaration in order.
    ///
    /// Every entry is checked before any is registered, so a batch with an
    /// invalid entry leaves the schema untouched.
    pub fn declare(&mut self, decls: &[PropDecl]) -> Result<&mut Self> {
        let mut batch = Vec::with_capacity(decls.len());
        for decl in decls {
            check_name(&decl.name)?;
            let args = decl.to_args()?;
            if let Some(type_name) = decl.type_spec()?.as_ref().and_then(TypeSpec::type_name) {
                type_test(&decl.name, type_name, self.type_tests())?;
            }
            batch.push((decl.name.as_str(), args));
        }
        for (name, args) in batch {
            self.add_prop(name, args)?;
        }
        debug!(
            owner = self.target().name(),
            count = decls.len(),
            "declared managed properties"
        );
        Ok(self)
    }

    pub fn declare_yaml(&mut self, yaml: &str) -> Result<&mut Self> {
        let decls = parse_yaml(yaml)?;
        self.declare(&decls)
    }

    pub fn declare_json(&mut self, json: &str) -> Result<&mut Self> {
        let decls = parse_json(json)?;
        self.declare(&decls)
    }
}
