//! Dynamically typed property values.
//!
//! Managed properties hold loosely typed values. Arrays, objects and
//! functions are *reference* values: cloning a [`PropValue`] clones the
//! handle, so two slots can observe the same array or map. Everything else is
//! copied by value.
//!
//! Two notions of equality exist:
//!
//! - [`PropValue::strict_eq`] is identity for reference values and value
//!   equality for primitives (`NaN` never equals itself). Accessors use it to
//!   decide whether an assignment is a no-op and whether a change hook fires.
//! - `PartialEq` compares contents deeply and is meant for assertions and
//!   declarations.

use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Signature of a native function stored in a [`PropValue::Function`].
pub type NativeFn = Arc<dyn Fn(&[PropValue]) -> PropValue + Send + Sync>;

/// A reference-counted, interior-mutable container shared between values.
pub struct Shared<T>(Arc<RwLock<T>>);

impl<T> Shared<T> {
    pub fn new(inner: T) -> Self {
        Self(Arc::new(RwLock::new(inner)))
    }

    /// Read access. A poisoned lock is recovered, the data is still usable.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access. A poisoned lock is recovered, the data is still usable.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether both handles point at the same container.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

/// Containers on the current walk through nested values. A container that
/// contains itself is only entered once.
struct Visited<K>(RefCell<Vec<K>>);

impl<K: PartialEq> Visited<K> {
    fn new() -> Self {
        Self(RefCell::new(Vec::new()))
    }

    /// Push `key` onto the walk; `false` when it is already on it.
    fn enter(&self, key: K) -> bool {
        let mut path = self.0.borrow_mut();
        if path.contains(&key) {
            return false;
        }
        path.push(key);
        true
    }

    fn leave(&self) {
        self.0.borrow_mut().pop();
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

pub type SharedArray = Shared<Vec<PropValue>>;
pub type SharedObject = Shared<IndexMap<String, PropValue>>;

impl Shared<Vec<PropValue>> {
    pub fn push(&self, value: impl Into<PropValue>) {
        self.write().push(value.into());
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of the current elements. Nested reference values stay shared.
    pub fn to_vec(&self) -> Vec<PropValue> {
        self.read().clone()
    }
}

impl Shared<IndexMap<String, PropValue>> {
    pub fn insert(&self, key: impl Into<String>, value: impl Into<PropValue>) -> Option<PropValue> {
        self.write().insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<PropValue> {
        self.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

/// A callable value.
#[derive(Clone)]
pub struct Function(NativeFn);

impl Function {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[PropValue]) -> PropValue + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, args: &[PropValue]) -> PropValue {
        (self.0)(args)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A loosely typed property value.
#[derive(Clone, Default)]
pub enum PropValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(SharedArray),
    Object(SharedObject),
    Function(Function),
}

impl PropValue {
    /// A new array holding `items`.
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<PropValue>,
    {
        Self::Array(Shared::new(items.into_iter().map(Into::into).collect()))
    }

    /// A new object holding `entries` in insertion order.
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropValue>,
    {
        Self::Object(Shared::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// An empty object, the usual stand-in for a map.
    pub fn empty_object() -> Self {
        Self::Object(Shared::new(IndexMap::new()))
    }

    /// A callable value.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&[PropValue]) -> PropValue + Send + Sync + 'static,
    {
        Self::Function(Function::new(f))
    }

    /// Identity for arrays, objects and functions; value equality otherwise.
    pub fn strict_eq(&self, other: &PropValue) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Function(a), Self::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Name of the value's kind, as used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Function(_) => "function",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&SharedArray> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&SharedObject> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    /// For arrays, a new array with the same elements; other values are
    /// returned as-is.
    pub fn shallow_copy(&self) -> PropValue {
        match self {
            Self::Array(a) => Self::Array(Shared::new(a.to_vec())),
            other => other.clone(),
        }
    }

    /// Convert to JSON. Functions and `undefined` become `null`, as does a
    /// container nested inside itself.
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_within(&Visited::new())
    }

    fn to_json_within(&self, path: &Visited<usize>) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Self::Undefined | Self::Null | Self::Function(_) => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                Value::from(*n as i64)
            }
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(a) => {
                if !path.enter(a.addr()) {
                    return Value::Null;
                }
                let items = a.read().iter().map(|v| v.to_json_within(path)).collect();
                path.leave();
                Value::Array(items)
            }
            Self::Object(o) => {
                if !path.enter(o.addr()) {
                    return Value::Null;
                }
                let entries = o
                    .read()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_within(path)))
                    .collect();
                path.leave();
                Value::Object(entries)
            }
        }
    }
}

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Number to string the way loosely typed hosts print them: integral values
/// carry no fractional part, `-0` prints as `0`, and magnitudes from `1e21`
/// up or below `1e-6` use exponent form (`1e+21`, `1.5e-7`).
fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return String::from(if n > 0.0 { "Infinity" } else { "-Infinity" });
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let exponent = format!("{n:e}");
        return match exponent.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exponent,
        };
    }
    if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

/// String coercion. Holes and nulls in arrays print empty, as does an array
/// reached again through itself.
fn write_coerced(
    value: &PropValue,
    f: &mut fmt::Formatter<'_>,
    path: &Visited<usize>,
) -> fmt::Result {
    match value {
        PropValue::Undefined => f.write_str("undefined"),
        PropValue::Null => f.write_str("null"),
        PropValue::Bool(b) => write!(f, "{b}"),
        PropValue::Number(n) => f.write_str(&format_number(*n)),
        PropValue::String(s) => f.write_str(s),
        PropValue::Array(a) => {
            if !path.enter(a.addr()) {
                return Ok(());
            }
            for (i, item) in a.read().iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                match item {
                    PropValue::Undefined | PropValue::Null => {}
                    other => write_coerced(other, f, path)?,
                }
            }
            path.leave();
            Ok(())
        }
        PropValue::Object(_) => f.write_str("[object Object]"),
        PropValue::Function(_) => f.write_str("function"),
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_coerced(self, f, &Visited::new())
    }
}

struct DebugWithin<'a> {
    value: &'a PropValue,
    path: &'a Visited<usize>,
}

impl DebugWithin<'_> {
    fn nested<'b>(&'b self, value: &'b PropValue) -> DebugWithin<'b> {
        DebugWithin {
            value,
            path: self.path,
        }
    }
}

impl fmt::Debug for DebugWithin<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            PropValue::Undefined => f.write_str("Undefined"),
            PropValue::Null => f.write_str("Null"),
            PropValue::Bool(b) => write!(f, "Bool({b})"),
            PropValue::Number(n) => write!(f, "Number({n})"),
            PropValue::String(s) => write!(f, "String({s:?})"),
            PropValue::Array(a) => {
                if !self.path.enter(a.addr()) {
                    return f.write_str("[..]");
                }
                let items = a.read();
                let result = f
                    .debug_list()
                    .entries(items.iter().map(|item| self.nested(item)))
                    .finish();
                self.path.leave();
                result
            }
            PropValue::Object(o) => {
                if !self.path.enter(o.addr()) {
                    return f.write_str("{..}");
                }
                let entries = o.read();
                let result = f
                    .debug_map()
                    .entries(entries.iter().map(|(k, v)| (k, self.nested(v))))
                    .finish();
                self.path.leave();
                result
            }
            PropValue::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = Visited::new();
        fmt::Debug::fmt(&DebugWithin { value: self, path: &path }, f)
    }
}

/// Deep equality. A pair of containers already being compared further up
/// the walk counts as equal.
fn deep_eq(a: &PropValue, b: &PropValue, path: &Visited<(usize, usize)>) -> bool {
    match (a, b) {
        (PropValue::Array(x), PropValue::Array(y)) => {
            if x.ptr_eq(y) || !path.enter((x.addr(), y.addr())) {
                return true;
            }
            let equal = {
                let (xs, ys) = (x.read(), y.read());
                xs.len() == ys.len() && xs.iter().zip(ys.iter()).all(|(l, r)| deep_eq(l, r, path))
            };
            path.leave();
            equal
        }
        (PropValue::Object(x), PropValue::Object(y)) => {
            if x.ptr_eq(y) || !path.enter((x.addr(), y.addr())) {
                return true;
            }
            let equal = {
                let (xs, ys) = (x.read(), y.read());
                xs.len() == ys.len()
                    && xs
                        .iter()
                        .all(|(k, l)| ys.get(k).is_some_and(|r| deep_eq(l, r, path)))
            };
            path.leave();
            equal
        }
        _ => a.strict_eq(b),
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        deep_eq(self, other, &Visited::new())
    }
}

impl PartialEq<&str> for PropValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<f64> for PropValue {
    fn eq(&self, other: &f64) -> bool {
        self.as_f64() == Some(*other)
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for PropValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for PropValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for PropValue {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i64> for PropValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<Vec<PropValue>> for PropValue {
    fn from(items: Vec<PropValue>) -> Self {
        Self::Array(Shared::new(items))
    }
}

impl From<Function> for PropValue {
    fn from(f: Function) -> Self {
        Self::Function(f)
    }
}

impl From<serde_json::Value> for PropValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => n.as_f64().map(Self::Number).unwrap_or(Self::Null),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::array(items),
            Value::Object(map) => Self::object(map),
        }
    }
}

impl Serialize for PropValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PropValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strict_eq_is_identity_for_arrays() {
        let a = PropValue::array(["x", "y"]);
        let b = PropValue::array(["x", "y"]);
        assert!(a.strict_eq(&a.clone()));
        assert!(!a.strict_eq(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_strict_eq_nan() {
        let nan = PropValue::from(f64::NAN);
        assert!(!nan.strict_eq(&nan));
    }

    #[test]
    fn test_display_coercion() {
        assert_eq!(PropValue::from(-1).to_string(), "-1");
        assert_eq!(PropValue::from(2.1).to_string(), "2.1");
        assert_eq!(PropValue::from(-0.0).to_string(), "0");
        assert_eq!(PropValue::from(f64::NAN).to_string(), "NaN");
        assert_eq!(PropValue::array(["Bob"]).to_string(), "Bob");
        assert_eq!(
            PropValue::from(vec![
                PropValue::from(1),
                PropValue::Null,
                PropValue::array([2, 3])
            ])
            .to_string(),
            "1,,2,3"
        );
        assert_eq!(PropValue::empty_object().to_string(), "[object Object]");
        assert_eq!(PropValue::Undefined.to_string(), "undefined");
    }

    #[test]
    fn test_shallow_copy_detaches_array() {
        let original = PropValue::array(["stupid", "fat"]);
        let copy = original.shallow_copy();
        copy.as_array().unwrap().push("short");
        assert_eq!(original.as_array().unwrap().len(), 2);
        assert_eq!(copy.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({"tags": ["a", 1], "ok": true, "none": null});
        let value = PropValue::from(json.clone());
        assert_eq!(value.to_json(), json);
        assert_eq!(
            value.as_object().unwrap().get("tags").unwrap().to_string(),
            "a,1"
        );
    }

    #[test]
    fn test_function_call() {
        let f = PropValue::function(|args| PropValue::from(args.len() as i64));
        let result = f.as_function().unwrap().call(&[PropValue::Null]);
        assert_eq!(result, 1.0);
    }

    #[test]
    fn test_exponent_form_at_extreme_magnitudes() {
        assert_eq!(PropValue::from(1e21).to_string(), "1e+21");
        assert_eq!(PropValue::from(1e20).to_string(), "100000000000000000000");
        assert_eq!(PropValue::from(1.5e300).to_string(), "1.5e+300");
        assert_eq!(PropValue::from(1e-7).to_string(), "1e-7");
        assert_eq!(PropValue::from(-2.5e-8).to_string(), "-2.5e-8");
        assert_eq!(PropValue::from(0.000001).to_string(), "0.000001");
    }

    fn self_containing() -> PropValue {
        let a = PropValue::array(["x"]);
        a.as_array().unwrap().push(a.clone());
        a
    }

    #[test]
    fn test_self_containing_array_coerces() {
        let a = self_containing();
        assert_eq!(a.to_string(), "x,");

        let outer = PropValue::array([PropValue::from(1), a.clone()]);
        assert_eq!(outer.to_string(), "1,x,");
    }

    #[test]
    fn test_self_containing_array_debug_and_json() {
        let a = self_containing();
        assert_eq!(format!("{a:?}"), r#"[String("x"), [..]]"#);
        assert_eq!(a.to_json(), serde_json::json!(["x", null]));

        let o = PropValue::empty_object();
        o.as_object().unwrap().insert("me", o.clone());
        assert_eq!(format!("{o:?}"), r#"{"me": {..}}"#);
        assert_eq!(o.to_json(), serde_json::json!({"me": null}));
    }

    #[test]
    fn test_self_containing_arrays_compare() {
        let a = self_containing();
        let b = self_containing();
        assert_eq!(a, a.clone());
        assert_eq!(a, b);
        assert_ne!(a, PropValue::array(["x"]));
    }

    proptest! {
        #[test]
        fn integers_print_without_fraction(n in -1_000_000i64..1_000_000) {
            prop_assert_eq!(PropValue::from(n).to_string(), n.to_string());
        }
    }
}
