use std::{any::Any, cmp::Ordering, collections::HashMap, fmt, sync::Arc};

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;

/// A dynamically typed value flowing through evaluation and SQL parameters.
///
/// The set of variants is closed: every operator in the
/// [`OperatorRegistry`](crate::registry::OperatorRegistry) is registered
/// against the [`ValueType`] tags below. User-defined value types take part in
/// comparisons through [`Value::Custom`] and the [`Equatable`] / [`Ordered`]
/// capabilities.
///
/// # Examples
///
/// ```
/// use predicate_spec::Value;
///
/// let age = Value::Integer(30);
/// let name = Value::from("Alice");
/// assert_eq!(age.type_name(), "integer");
/// assert_eq!(name, Value::String("Alice".to_string()));
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    /// SQL NULL / JSON null
    Null,

    /// Boolean (true/false)
    Boolean(bool),

    /// Signed integer
    Integer(i64),

    /// Floating-point number
    Float(f64),

    /// Exact decimal number
    Decimal(Decimal),

    /// UTF-8 text
    String(String),

    /// Point in time (UTC)
    Instant(DateTime<Utc>),

    /// Signed span of time
    Duration(TimeDelta),

    /// Ordered list of values; answers `*` when used as a context
    Array(Vec<Value>),

    /// Nested scope with string keys
    Object(HashMap<String, Value>),

    /// User-defined value object
    Custom(Arc<dyn ValueObject>),
}

/// Type tag of a [`Value`], the key used by the operator registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Boolean,
    Integer,
    Float,
    Decimal,
    Text,
    Instant,
    Duration,
    Array,
    Object,
    Custom,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Decimal => "decimal",
            ValueType::Text => "string",
            ValueType::Instant => "instant",
            ValueType::Duration => "duration",
            ValueType::Array => "array",
            ValueType::Object => "object",
            ValueType::Custom => "custom",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A user-defined value type that can be stored in a [`Value::Custom`].
///
/// Implementors opt into comparisons by returning themselves from
/// [`as_equatable`](ValueObject::as_equatable) and/or
/// [`as_ordered`](ValueObject::as_ordered). A value object that exposes
/// neither can still be stored and tested for `IS NULL`, but every comparison
/// fails with an unsupported-operator error.
pub trait ValueObject: fmt::Debug + Send + Sync {
    /// Short name used in error messages.
    fn type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_equatable(&self) -> Option<&dyn Equatable> {
        None
    }

    fn as_ordered(&self) -> Option<&dyn Ordered> {
        None
    }
}

/// Equality capability for value objects.
pub trait Equatable {
    /// Returns `None` when `other` is not comparable with `self`.
    fn equal(&self, other: &dyn ValueObject) -> Option<bool>;
}

/// Ordering capability for value objects.
///
/// Only [`compare`](Ordered::compare) is required; the relational checks are
/// derived from it.
pub trait Ordered {
    /// Returns `None` when `other` is not comparable with `self`.
    fn compare(&self, other: &dyn ValueObject) -> Option<Ordering>;

    fn greater_than(&self, other: &dyn ValueObject) -> Option<bool> {
        self.compare(other).map(Ordering::is_gt)
    }

    fn greater_than_or_equal(&self, other: &dyn ValueObject) -> Option<bool> {
        self.compare(other).map(Ordering::is_ge)
    }

    fn less_than(&self, other: &dyn ValueObject) -> Option<bool> {
        self.compare(other).map(Ordering::is_lt)
    }

    fn less_than_or_equal(&self, other: &dyn ValueObject) -> Option<bool> {
        self.compare(other).map(Ordering::is_le)
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::Decimal(_) => ValueType::Decimal,
            Value::String(_) => ValueType::Text,
            Value::Instant(_) => ValueType::Instant,
            Value::Duration(_) => ValueType::Duration,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
            Value::Custom(_) => ValueType::Custom,
        }
    }

    /// Human-readable type name; value objects report their own name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Custom(object) => object.type_name(),
            other => other.value_type().name(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as boolean, without truthiness coercion
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer; integral floats and decimals are narrowed
    pub fn as_int(&self) -> Option<i64> {
        use rust_decimal::prelude::ToPrimitive;

        match self {
            Value::Integer(n) => Some(*n),
            // `i64::MAX as f64` rounds up to 2^63, which is out of range
            Value::Float(n)
                if n.fract() == 0.0 && *n >= i64::MIN as f64 && *n < i64::MAX as f64 =>
            {
                Some(*n as i64)
            }
            Value::Decimal(d) if d.is_integer() => d.to_i64(),
            _ => None,
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        use rust_decimal::prelude::ToPrimitive;

        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value object as a concrete type, if it is one.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Value::Custom(object) => object.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Decimal(a), Decimal(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Instant(a), Instant(b)) => a == b,
            (Duration(a), Duration(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Object(a), Object(b)) => a == b,
            (Custom(a), Custom(b)) => {
                Arc::ptr_eq(a, b)
                    || a.as_equatable()
                        .and_then(|eq| eq.equal(b.as_ref()))
                        .unwrap_or(false)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Instant(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Duration(d) => write!(f, "{}", d),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Object(map) => {
                // Sorted for deterministic output
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                f.write_str("{")?;
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: {}", key, map[key])?;
                }
                f.write_str("}")
            }
            Value::Custom(object) => write!(f, "{:?}", object),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Instant(t)
    }
}

impl From<TimeDelta> for Value {
    fn from(d: TimeDelta) -> Self {
        Value::Duration(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
