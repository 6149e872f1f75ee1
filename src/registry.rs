//! Type-dispatched operator table.
//!
//! Binary operators are looked up by `(left type, operator, right type)` and
//! unary operators by `(operator, operand type)`. The table is filled once in
//! [`OperatorRegistry::new`] and only read afterwards, so a single registry
//! (see [`OperatorRegistry::global`]) is shared by every evaluation.
//!
//! # NULL handling
//!
//! SQL three-valued logic applies:
//!
//! - every operator except `AND`, `OR`, `IS NULL` and `IS NOT NULL` yields
//!   NULL when either operand is NULL
//! - `NULL AND false = false`, `NULL AND true = NULL`
//! - `NULL OR true = true`, `NULL OR false = NULL`
//! - `IS NULL` / `IS NOT NULL` always yield a boolean
//!
//! # Numbers
//!
//! Integer arithmetic is checked and stays integral, except that an inexact
//! integer division yields a float. Mixed integer/float arithmetic is done
//! in decimal and narrowed back to an integer when the result is whole, so
//! `1 + 0.5 = 1.5` and `2 * 1.5 = 3`.

use std::{cmp::Ordering, collections::HashMap, sync::LazyLock};

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};

use crate::{
    ast::Operator,
    error::OperatorError,
    value::{Value, ValueType},
};

pub type BinaryFn = fn(&Value, &Value) -> Result<Value, OperatorError>;
pub type UnaryFn = fn(&Value) -> Result<Value, OperatorError>;

static GLOBAL: LazyLock<OperatorRegistry> = LazyLock::new(OperatorRegistry::new);

const NUMERIC: [ValueType; 3] = [ValueType::Integer, ValueType::Float, ValueType::Decimal];

const COMPARISONS: [Operator; 6] = [
    Operator::Equal,
    Operator::NotEqual,
    Operator::LessThan,
    Operator::LessThanEqual,
    Operator::GreaterThan,
    Operator::GreaterThanEqual,
];

#[derive(Debug, Clone)]
pub struct OperatorRegistry {
    binary: HashMap<(ValueType, Operator, ValueType), BinaryFn>,
    unary: HashMap<(Operator, ValueType), UnaryFn>,
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorRegistry {
    /// Creates a registry with every built-in operator registered.
    pub fn new() -> Self {
        let mut registry = OperatorRegistry {
            binary: HashMap::new(),
            unary: HashMap::new(),
        };
        registry.register_numeric();
        registry.register_text();
        registry.register_boolean();
        registry.register_temporal();
        registry
    }

    /// The process-wide registry with the built-in operators.
    pub fn global() -> &'static OperatorRegistry {
        &GLOBAL
    }

    pub fn register_binary(&mut self, left: ValueType, op: Operator, right: ValueType, f: BinaryFn) {
        self.binary.insert((left, op, right), f);
    }

    pub fn register_unary(&mut self, op: Operator, operand: ValueType, f: UnaryFn) {
        self.unary.insert((op, operand), f);
    }

    /// Whether an exact entry exists for the given operand types.
    pub fn supports(&self, left: ValueType, op: Operator, right: ValueType) -> bool {
        self.binary.contains_key(&(left, op, right))
    }

    /// Applies a binary operator.
    ///
    /// Exact type lookup first; on a miss, comparisons between two value
    /// objects fall back to their [`Equatable`](crate::value::Equatable) /
    /// [`Ordered`](crate::value::Ordered) capabilities.
    pub fn exec_binary(&self, left: &Value, op: Operator, right: &Value) -> Result<Value, OperatorError> {
        if matches!(op, Operator::And | Operator::Or) {
            return logical(left, op, right);
        }

        if left.is_null() || right.is_null() {
            return Ok(Value::Null);
        }

        match self.binary.get(&(left.value_type(), op, right.value_type())) {
            Some(f) => f(left, right),
            None => capability_fallback(left, op, right),
        }
    }

    /// Applies a unary (prefix or postfix) operator.
    pub fn exec_unary(&self, op: Operator, operand: &Value) -> Result<Value, OperatorError> {
        match op {
            Operator::IsNull => return Ok(Value::Boolean(operand.is_null())),
            Operator::IsNotNull => return Ok(Value::Boolean(!operand.is_null())),
            _ => {}
        }

        if operand.is_null() {
            return Ok(Value::Null);
        }

        match self.unary.get(&(op, operand.value_type())) {
            Some(f) => f(operand),
            None => Err(OperatorError::UnsupportedUnary {
                operator: op,
                operand: operand.type_name(),
            }),
        }
    }

    fn register_numeric(&mut self) {
        for left in NUMERIC {
            for right in NUMERIC {
                self.register_binary(left, Operator::Add, right, add);
                self.register_binary(left, Operator::Subtract, right, subtract);
                self.register_binary(left, Operator::Multiply, right, multiply);
                self.register_binary(left, Operator::Divide, right, divide);
                self.register_binary(left, Operator::Modulo, right, modulo);
                self.register_comparisons(left, right);
            }
            self.register_unary(Operator::Negative, left, negate);
            self.register_unary(Operator::Positive, left, identity);
        }

        self.register_binary(ValueType::Integer, Operator::LeftShift, ValueType::Integer, left_shift);
        self.register_binary(ValueType::Integer, Operator::RightShift, ValueType::Integer, right_shift);
    }

    fn register_text(&mut self) {
        self.register_binary(ValueType::Text, Operator::Add, ValueType::Text, concat);
        self.register_comparisons(ValueType::Text, ValueType::Text);
    }

    fn register_boolean(&mut self) {
        self.register_binary(ValueType::Boolean, Operator::Equal, ValueType::Boolean, equal);
        self.register_binary(ValueType::Boolean, Operator::NotEqual, ValueType::Boolean, not_equal);
        self.register_unary(Operator::Not, ValueType::Boolean, not);
    }

    fn register_temporal(&mut self) {
        use ValueType::{Duration, Instant, Integer};

        self.register_comparisons(Instant, Instant);
        self.register_comparisons(Duration, Duration);

        self.register_binary(Instant, Operator::Subtract, Instant, instant_difference);
        self.register_binary(Instant, Operator::Add, Duration, instant_plus_duration);
        self.register_binary(Duration, Operator::Add, Instant, instant_plus_duration);
        self.register_binary(Instant, Operator::Subtract, Duration, instant_minus_duration);

        self.register_binary(Duration, Operator::Add, Duration, duration_add);
        self.register_binary(Duration, Operator::Subtract, Duration, duration_subtract);
        self.register_binary(Duration, Operator::Multiply, Integer, duration_multiply);
        self.register_binary(Integer, Operator::Multiply, Duration, duration_multiply);
        self.register_binary(Duration, Operator::Divide, Integer, duration_divide);

        self.register_unary(Operator::Negative, Duration, negate);
        self.register_unary(Operator::Positive, Duration, identity);
    }

    fn register_comparisons(&mut self, left: ValueType, right: ValueType) {
        let fns: [BinaryFn; 6] = [
            equal,
            not_equal,
            less_than,
            less_than_equal,
            greater_than,
            greater_than_equal,
        ];
        for (op, f) in COMPARISONS.into_iter().zip(fns) {
            self.register_binary(left, op, right, f);
        }
    }
}

fn unsupported(left: &Value, op: Operator, right: &Value) -> OperatorError {
    OperatorError::Unsupported {
        operator: op,
        left: left.type_name(),
        right: right.type_name(),
    }
}

// ========================================
// Logical (three-valued)
// ========================================

fn logical(left: &Value, op: Operator, right: &Value) -> Result<Value, OperatorError> {
    let truth = |v: &Value| match v {
        Value::Boolean(b) => Ok(Some(*b)),
        Value::Null => Ok(None),
        _ => Err(unsupported(left, op, right)),
    };
    let (l, r) = (truth(left)?, truth(right)?);

    let result = match op {
        Operator::And => match (l, r) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        _ => match (l, r) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
    };
    Ok(result.map_or(Value::Null, Value::Boolean))
}

fn not(operand: &Value) -> Result<Value, OperatorError> {
    match operand {
        Value::Boolean(b) => Ok(Value::Boolean(!b)),
        other => Err(OperatorError::UnsupportedUnary {
            operator: Operator::Not,
            operand: other.type_name(),
        }),
    }
}

// ========================================
// Capability fallback
// ========================================

fn capability_fallback(left: &Value, op: Operator, right: &Value) -> Result<Value, OperatorError> {
    if let (Value::Custom(l), Value::Custom(r)) = (left, right) {
        let other = r.as_ref();
        let equatable = || l.as_equatable().filter(|_| r.as_equatable().is_some());
        let ordered = || l.as_ordered().filter(|_| r.as_ordered().is_some());

        let outcome = match op {
            Operator::Equal => equatable().and_then(|eq| eq.equal(other)),
            Operator::NotEqual => equatable().and_then(|eq| eq.equal(other)).map(|b| !b),
            Operator::GreaterThan => ordered().and_then(|ord| ord.greater_than(other)),
            Operator::GreaterThanEqual => ordered().and_then(|ord| ord.greater_than_or_equal(other)),
            Operator::LessThan => ordered().and_then(|ord| ord.less_than(other)),
            Operator::LessThanEqual => ordered().and_then(|ord| ord.less_than_or_equal(other)),
            _ => None,
        };

        if let Some(b) = outcome {
            return Ok(Value::Boolean(b));
        }
    }
    Err(unsupported(left, op, right))
}

// ========================================
// Comparison
// ========================================

fn to_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::Integer(n) => Some(Decimal::from(*n)),
        Value::Float(n) => Decimal::from_f64(*n),
        Value::Decimal(d) => Some(*d),
        _ => None,
    }
}

/// Ordering between two values of registered comparable types.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
        (Value::Float(a), Value::Decimal(d)) => compare_float_decimal(*a, d),
        (Value::Decimal(d), Value::Float(b)) => compare_float_decimal(*b, d).map(Ordering::reverse),
        (Value::Decimal(_), _) | (_, Value::Decimal(_)) => {
            Some(to_decimal(left)?.cmp(&to_decimal(right)?))
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        (Value::Instant(a), Value::Instant(b)) => Some(a.cmp(b)),
        (Value::Duration(a), Value::Duration(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Exact in decimal when the float fits, otherwise in float.
fn compare_float_decimal(a: f64, d: &Decimal) -> Option<Ordering> {
    match Decimal::from_f64(a) {
        Some(a) => Some(a.cmp(d)),
        None => a.partial_cmp(&d.to_f64()?),
    }
}

// NaN compares as neither equal nor ordered, so every check but `!=` is false
fn equal(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    Ok(Value::Boolean(compare(l, r) == Some(Ordering::Equal)))
}

fn not_equal(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    Ok(Value::Boolean(compare(l, r) != Some(Ordering::Equal)))
}

fn less_than(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    Ok(Value::Boolean(compare(l, r).is_some_and(Ordering::is_lt)))
}

fn less_than_equal(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    Ok(Value::Boolean(compare(l, r).is_some_and(Ordering::is_le)))
}

fn greater_than(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    Ok(Value::Boolean(compare(l, r).is_some_and(Ordering::is_gt)))
}

fn greater_than_equal(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    Ok(Value::Boolean(compare(l, r).is_some_and(Ordering::is_ge)))
}

// ========================================
// Arithmetic
// ========================================

fn add(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    arithmetic(Operator::Add, l, r)
}

fn subtract(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    arithmetic(Operator::Subtract, l, r)
}

fn multiply(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    arithmetic(Operator::Multiply, l, r)
}

fn divide(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    arithmetic(Operator::Divide, l, r)
}

fn modulo(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    arithmetic(Operator::Modulo, l, r)
}

fn arithmetic(op: Operator, left: &Value, right: &Value) -> Result<Value, OperatorError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => integer_op(op, *a, *b),
        (Value::Float(a), Value::Float(b)) => float_op(op, *a, *b).map(Value::Float),
        (Value::Integer(_), Value::Float(_)) | (Value::Float(_), Value::Integer(_)) => {
            mixed_op(op, left, right)
        }
        _ => match (to_decimal(left), to_decimal(right)) {
            (Some(a), Some(b)) => decimal_op(op, a, b).map(Value::Decimal),
            // A float beyond the decimal range
            _ => match (left, right) {
                (Value::Float(_), Value::Decimal(_)) | (Value::Decimal(_), Value::Float(_)) => {
                    match (left.as_float(), right.as_float()) {
                        (Some(a), Some(b)) => float_op(op, a, b).map(Value::Float),
                        _ => Err(OperatorError::Overflow(op)),
                    }
                }
                _ => Err(unsupported(left, op, right)),
            },
        },
    }
}

fn integer_op(op: Operator, a: i64, b: i64) -> Result<Value, OperatorError> {
    let result = match op {
        Operator::Add => a.checked_add(b),
        Operator::Subtract => a.checked_sub(b),
        Operator::Multiply => a.checked_mul(b),
        Operator::Divide => {
            if b == 0 {
                return Err(OperatorError::DivisionByZero);
            }
            match a.checked_rem(b) {
                // Inexact division falls back to float
                Some(rem) if rem != 0 => return Ok(Value::Float(a as f64 / b as f64)),
                Some(_) => a.checked_div(b),
                None => None,
            }
        }
        Operator::Modulo => {
            if b == 0 {
                return Err(OperatorError::DivisionByZero);
            }
            a.checked_rem(b)
        }
        _ => return Err(unsupported(&Value::Integer(a), op, &Value::Integer(b))),
    };
    result.map(Value::Integer).ok_or(OperatorError::Overflow(op))
}

fn float_op(op: Operator, a: f64, b: f64) -> Result<f64, OperatorError> {
    match op {
        Operator::Add => Ok(a + b),
        Operator::Subtract => Ok(a - b),
        Operator::Multiply => Ok(a * b),
        Operator::Divide | Operator::Modulo if b == 0.0 => Err(OperatorError::DivisionByZero),
        Operator::Divide => Ok(a / b),
        Operator::Modulo => Ok(a % b),
        _ => Err(unsupported(&Value::Float(a), op, &Value::Float(b))),
    }
}

fn decimal_op(op: Operator, a: Decimal, b: Decimal) -> Result<Decimal, OperatorError> {
    let result = match op {
        Operator::Add => a.checked_add(b),
        Operator::Subtract => a.checked_sub(b),
        Operator::Multiply => a.checked_mul(b),
        Operator::Divide | Operator::Modulo if b.is_zero() => {
            return Err(OperatorError::DivisionByZero);
        }
        Operator::Divide => a.checked_div(b),
        Operator::Modulo => a.checked_rem(b),
        _ => return Err(unsupported(&Value::Decimal(a), op, &Value::Decimal(b))),
    };
    result.ok_or(OperatorError::Overflow(op))
}

/// Integer/float mix, computed in decimal to avoid binary rounding.
fn mixed_op(op: Operator, left: &Value, right: &Value) -> Result<Value, OperatorError> {
    if let Some(ad) = to_decimal(left)
        && let Some(bd) = to_decimal(right)
    {
        let rd = decimal_op(op, ad, bd)?;
        if rd.is_integer()
            && let Some(r) = rd.to_i64()
        {
            return Ok(Value::Integer(r));
        } else if let Some(r) = rd.to_f64() {
            return Ok(Value::Float(r));
        }
    }

    match (left.as_float(), right.as_float()) {
        (Some(a), Some(b)) => float_op(op, a, b).map(Value::Float),
        _ => Err(unsupported(left, op, right)),
    }
}

fn concat(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    match (l, r) {
        (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
        _ => Err(unsupported(l, Operator::Add, r)),
    }
}

fn left_shift(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    shift(Operator::LeftShift, l, r)
}

fn right_shift(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    shift(Operator::RightShift, l, r)
}

fn shift(op: Operator, l: &Value, r: &Value) -> Result<Value, OperatorError> {
    match (l, r) {
        (Value::Integer(a), Value::Integer(b)) => {
            if !(0..64).contains(b) {
                return Err(OperatorError::ShiftOutOfRange(*b));
            }
            let result = match op {
                Operator::LeftShift => *a << *b,
                _ => *a >> *b,
            };
            Ok(Value::Integer(result))
        }
        _ => Err(unsupported(l, op, r)),
    }
}

fn negate(operand: &Value) -> Result<Value, OperatorError> {
    match operand {
        Value::Integer(n) => n
            .checked_neg()
            .map(Value::Integer)
            .ok_or(OperatorError::Overflow(Operator::Negative)),
        Value::Float(n) => Ok(Value::Float(-n)),
        Value::Decimal(d) => Ok(Value::Decimal(-*d)),
        Value::Duration(d) => Ok(Value::Duration(-*d)),
        other => Err(OperatorError::UnsupportedUnary {
            operator: Operator::Negative,
            operand: other.type_name(),
        }),
    }
}

fn identity(operand: &Value) -> Result<Value, OperatorError> {
    Ok(operand.clone())
}

// ========================================
// Temporal
// ========================================

fn instant_difference(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    match (l, r) {
        (Value::Instant(a), Value::Instant(b)) => Ok(Value::Duration(a.signed_duration_since(*b))),
        _ => Err(unsupported(l, Operator::Subtract, r)),
    }
}

fn instant_plus_duration(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    match (l, r) {
        (Value::Instant(t), Value::Duration(d)) | (Value::Duration(d), Value::Instant(t)) => t
            .checked_add_signed(*d)
            .map(Value::Instant)
            .ok_or(OperatorError::Overflow(Operator::Add)),
        _ => Err(unsupported(l, Operator::Add, r)),
    }
}

fn instant_minus_duration(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    match (l, r) {
        (Value::Instant(t), Value::Duration(d)) => t
            .checked_sub_signed(*d)
            .map(Value::Instant)
            .ok_or(OperatorError::Overflow(Operator::Subtract)),
        _ => Err(unsupported(l, Operator::Subtract, r)),
    }
}

fn duration_add(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    match (l, r) {
        (Value::Duration(a), Value::Duration(b)) => a
            .checked_add(b)
            .map(Value::Duration)
            .ok_or(OperatorError::Overflow(Operator::Add)),
        _ => Err(unsupported(l, Operator::Add, r)),
    }
}

fn duration_subtract(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    match (l, r) {
        (Value::Duration(a), Value::Duration(b)) => a
            .checked_sub(b)
            .map(Value::Duration)
            .ok_or(OperatorError::Overflow(Operator::Subtract)),
        _ => Err(unsupported(l, Operator::Subtract, r)),
    }
}

fn duration_factor(n: i64, op: Operator) -> Result<i32, OperatorError> {
    i32::try_from(n).map_err(|_| OperatorError::Overflow(op))
}

fn duration_multiply(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    let (d, n) = match (l, r) {
        (Value::Duration(d), Value::Integer(n)) | (Value::Integer(n), Value::Duration(d)) => (d, *n),
        _ => return Err(unsupported(l, Operator::Multiply, r)),
    };
    let factor = duration_factor(n, Operator::Multiply)?;
    d.checked_mul(factor)
        .map(Value::Duration)
        .ok_or(OperatorError::Overflow(Operator::Multiply))
}

fn duration_divide(l: &Value, r: &Value) -> Result<Value, OperatorError> {
    match (l, r) {
        (Value::Duration(_), Value::Integer(0)) => Err(OperatorError::DivisionByZero),
        (Value::Duration(d), Value::Integer(n)) => {
            let divisor = duration_factor(*n, Operator::Divide)?;
            d.checked_div(divisor)
                .map(Value::Duration)
                .ok_or(OperatorError::Overflow(Operator::Divide))
        }
        _ => Err(unsupported(l, Operator::Divide, r)),
    }
}
