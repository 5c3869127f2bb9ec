//! Initial-value factories.
//!
//! Array defaults are copied per instance. Object defaults are not: every
//! instance receives the same object unless a factory function is used as
//! the default.

use std::sync::Arc;

use crate::config::StartFn;
use crate::validator::TypeSpec;
use crate::value::PropValue;

/// Factory plus whether the first read should store its result.
#[derive(Clone)]
pub struct StartPlan {
    pub start: StartFn,
    pub set_on_get: bool,
}

/// Build the initial-value factory for a property.
///
/// An explicit `start` is used verbatim. A function default is called as the
/// factory unless the property is declared with the `function` type. An
/// array default yields a fresh shallow copy per call. Anything else is
/// returned as-is.
pub fn build_start(
    default: PropValue,
    type_spec: Option<&TypeSpec>,
    explicit: Option<StartFn>,
    set_on_get: bool,
) -> StartPlan {
    if let Some(start) = explicit {
        return StartPlan { start, set_on_get };
    }

    let function_typed = type_spec.and_then(TypeSpec::type_name) == Some("function");
    match default {
        PropValue::Function(factory) if !function_typed => StartPlan {
            start: Arc::new(move || factory.call(&[])),
            set_on_get: true,
        },
        PropValue::Array(_) => StartPlan {
            start: Arc::new(move || default.shallow_copy()),
            set_on_get: true,
        },
        literal => StartPlan {
            start: Arc::new(move || literal.clone()),
            set_on_get,
        },
    }
}
