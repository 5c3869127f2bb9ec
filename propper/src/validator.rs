//! Validator resolution.
//!
//! A property's type specifier is turned into a single [`Validator`] closure
//! when the property is registered. Validators return `None` for an
//! acceptable value and the failure message otherwise.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{PropError, Result};
use crate::type_tests::TypeTests;
use crate::value::PropValue;

/// Resolved validation closure.
pub type Validator = Arc<dyn Fn(&PropValue) -> Option<String> + Send + Sync>;

/// User predicate: receives the candidate value and the property name and
/// returns a failure message, or `None` to accept.
pub type Predicate = Arc<dyn Fn(&PropValue, &str) -> Option<String> + Send + Sync>;

/// Identifier rule for property names.
pub const NAME_PATTERN: &str = "^[A-Za-z0-9_]+$";

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(NAME_PATTERN).expect("property name pattern compiles"));

/// How a property's values are checked.
#[derive(Clone)]
pub enum TypeSpec {
    /// Look the name up in the type-test table
    ByName(String),
    /// Require a string matching the pattern
    ByPattern(Regex),
    /// Delegate to a predicate
    ByPredicate(Predicate),
}

impl TypeSpec {
    pub fn name(type_name: impl Into<String>) -> Self {
        Self::ByName(type_name.into())
    }

    /// Compile `pattern` into a pattern specifier.
    pub fn pattern(pattern: &str) -> Result<Self> {
        Ok(Self::ByPattern(Regex::new(pattern)?))
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&PropValue, &str) -> Option<String> + Send + Sync + 'static,
    {
        Self::ByPredicate(Arc::new(f))
    }

    /// The type name, for name specifiers.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::ByName(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByName(name) => f.write_str(name),
            Self::ByPattern(re) => write!(f, "/{}/", re.as_str()),
            Self::ByPredicate(_) => f.write_str("<predicate>"),
        }
    }
}

impl fmt::Debug for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByName(name) => f.debug_tuple("ByName").field(name).finish(),
            Self::ByPattern(re) => f.debug_tuple("ByPattern").field(&re.as_str()).finish(),
            Self::ByPredicate(_) => f.write_str("ByPredicate(..)"),
        }
    }
}

impl From<&str> for TypeSpec {
    fn from(type_name: &str) -> Self {
        Self::ByName(type_name.to_string())
    }
}

impl From<String> for TypeSpec {
    fn from(type_name: String) -> Self {
        Self::ByName(type_name)
    }
}

impl From<Regex> for TypeSpec {
    fn from(re: Regex) -> Self {
        Self::ByPattern(re)
    }
}

/// Alternate validator source given through a property's config.
#[derive(Clone)]
pub enum TestSpec {
    ByName(String),
    ByPredicate(Predicate),
}

impl TestSpec {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&PropValue, &str) -> Option<String> + Send + Sync + 'static,
    {
        Self::ByPredicate(Arc::new(f))
    }
}

impl fmt::Debug for TestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByName(name) => f.debug_tuple("ByName").field(name).finish(),
            Self::ByPredicate(_) => f.write_str("ByPredicate(..)"),
        }
    }
}

impl From<&str> for TestSpec {
    fn from(type_name: &str) -> Self {
        Self::ByName(type_name.to_string())
    }
}

/// Validator for a type-name specifier.
///
/// Fails at registration when `type_name` is not in `tests`.
pub fn type_test(name: &str, type_name: &str, tests: &TypeTests) -> Result<Validator> {
    let test = tests
        .get(type_name)
        .cloned()
        .ok_or_else(|| PropError::UnknownTypeTest {
            type_name: type_name.to_string(),
        })?;
    let name = name.to_string();
    let type_name = type_name.to_string();
    Ok(Arc::new(move |value: &PropValue| {
        if test(value) {
            None
        } else {
            Some(format!(
                "attempt to assign bad value to {name} {value} failed type test {type_name}"
            ))
        }
    }))
}

/// Validator for a pattern specifier. Non-strings fail with the string
/// type-test message before the pattern is consulted.
pub fn pattern_test(name: &str, re: &Regex, tests: &TypeTests) -> Result<Validator> {
    let string_test = type_test(name, "string", tests)?;
    let name = name.to_string();
    let re = re.clone();
    Ok(Arc::new(move |value: &PropValue| {
        if let Some(message) = string_test(value) {
            return Some(message);
        }
        let matched = value.as_str().is_some_and(|s| re.is_match(s));
        if matched {
            None
        } else {
            Some(format!(
                "attempt to assign bad value to {name} \"{value}\" failed test /{}/",
                re.as_str()
            ))
        }
    }))
}

/// Validator for a predicate. An empty message counts as success.
pub fn predicate_test(name: &str, predicate: &Predicate) -> Validator {
    let name = name.to_string();
    let predicate = Arc::clone(predicate);
    Arc::new(move |value: &PropValue| predicate(value, &name).filter(|message| !message.is_empty()))
}

/// Resolve the validator for a property.
///
/// The declared type wins; without one the config's `test` option is used.
/// `Ok(None)` means the property accepts every value.
pub fn resolve(
    name: &str,
    type_spec: Option<&TypeSpec>,
    test: Option<&TestSpec>,
    tests: &TypeTests,
) -> Result<Option<Validator>> {
    let validator = match (type_spec, test) {
        (Some(TypeSpec::ByName(type_name)), _) => Some(type_test(name, type_name, tests)?),
        (Some(TypeSpec::ByPattern(re)), _) => Some(pattern_test(name, re, tests)?),
        (Some(TypeSpec::ByPredicate(predicate)), _) => Some(predicate_test(name, predicate)),
        (None, Some(TestSpec::ByName(type_name))) => Some(type_test(name, type_name, tests)?),
        (None, Some(TestSpec::ByPredicate(predicate))) => Some(predicate_test(name, predicate)),
        (None, None) => None,
    };
    Ok(validator)
}

/// Check a property name against [`NAME_PATTERN`].
pub fn check_name(name: &str) -> Result<()> {
    if NAME_RE.is_match(name) {
        return Ok(());
    }
    Err(PropError::InvalidName {
        message: format!(
            "attempt to assign bad value to property \"{name}\" failed test /{NAME_PATTERN}/"
        ),
    })
}
