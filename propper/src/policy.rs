//! Bad-value policies.

use std::sync::Arc;

use tracing::warn;

use crate::accessor::Managed;
use crate::config::{BadValueHandler, BadValuePolicy};
use crate::error::{PropError, Result};
use crate::validator::TypeSpec;
use crate::value::PropValue;

fn requires_clause(type_spec: Option<&TypeSpec>) -> String {
    type_spec
        .and_then(TypeSpec::type_name)
        .map(|type_name| format!("; requires {type_name}"))
        .unwrap_or_default()
}

/// Message used when there is no validator message to report.
pub fn fallback_message(
    value: &PropValue,
    name: &str,
    display_name: &str,
    type_spec: Option<&TypeSpec>,
) -> String {
    format!(
        "attempt to assign bad value {value} to {name} of {display_name}{}",
        requires_clause(type_spec)
    )
}

/// Handler that fails the assignment with [`PropError::BadValue`].
pub fn throwing(name: &str, type_spec: Option<&TypeSpec>, display_name: &str) -> BadValueHandler {
    let name = name.to_string();
    let type_spec = type_spec.cloned();
    let display_name = display_name.to_string();
    Arc::new(
        move |value: &PropValue, _target: &mut dyn Managed, message: &str, _prop: &str| -> Result<()> {
            let message = if message.is_empty() {
                fallback_message(value, &name, &display_name, type_spec.as_ref())
            } else {
                message.to_string()
            };
            Err(PropError::bad_value(message, value, display_name.as_str()))
        },
    )
}

/// Handler that logs the rejection and keeps the previous value.
pub fn warning(name: &str, type_spec: Option<&TypeSpec>, display_name: &str) -> BadValueHandler {
    let name = name.to_string();
    let type_spec = type_spec.cloned();
    let display_name = display_name.to_string();
    Arc::new(
        move |value: &PropValue, _target: &mut dyn Managed, _message: &str, _prop: &str| -> Result<()> {
            let message = fallback_message(value, &name, &display_name, type_spec.as_ref());
            warn!(property = %name, "{message}");
            Ok(())
        },
    )
}

/// Pick the handler for a property: a positional handler beats the
/// configured policy, which defaults to throwing.
pub fn resolve(
    positional: Option<BadValueHandler>,
    configured: Option<&BadValuePolicy>,
    name: &str,
    type_spec: Option<&TypeSpec>,
    display_name: &str,
) -> BadValueHandler {
    if let Some(handler) = positional {
        return handler;
    }
    match configured {
        Some(BadValuePolicy::Handler(handler)) => Arc::clone(handler),
        Some(BadValuePolicy::Warn) => warning(name, type_spec, display_name),
        Some(BadValuePolicy::Throw) | None => throwing(name, type_spec, display_name),
    }
}
