//! The typed-value sum type and its capability traits.
//!
//! [`Value`] is a closed set of concrete variants; the [`Ordered`] and
//! [`Algebra`] traits define the ordering contract and the numeric algebra
//! over it. Derived operations (`neq`, `gte`, `lt`, `lte`, `sub`) are defined
//! once as trait default methods in terms of the primitives, which keeps a
//! single consistent total order and one subtraction rule per type.

use std::fmt;
use std::sync::Arc;

use serde_json::json;

use crate::error::ValueError;
use crate::signature::{self, Signature, ValueClass};
use crate::temporal::Time;
use crate::types::Kind;
use crate::unit::Quantity;

/// Absolute tolerance for float equality, absorbing rounding introduced by
/// division and power.
pub const EPSILON: f64 = 1e-10;

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// The fixed set of labels observed in a categorical column, in first-seen
/// order. Shared across every value of the column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet {
    labels: Vec<String>,
}

impl CategorySet {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// A caller-supplied ranking sequence; a ranked value's comparison key is its
/// label's position in this sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rankings {
    labels: Vec<String>,
}

impl Rankings {
    pub fn new(labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// One immutable typed scalar.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent datum; equal only to other nulls, skipped by aggregation.
    Null,
    /// Plain-equality label.
    Nominal(Arc<str>),
    /// Label tagged with the column's observed category set.
    Categorical {
        label: Arc<str>,
        categories: Arc<CategorySet>,
    },
    /// Label compared by its position in a ranking sequence.
    Ranked {
        label: Arc<str>,
        rank: usize,
        rankings: Arc<Rankings>,
    },
    Int(i64),
    Float(f64),
    /// Amount tagged with a measurement unit and shared conversion table.
    Quantity(Quantity),
    /// UTC instant at a fixed resolution.
    Time(Time),
    /// Quantity over the built-in time unit table.
    Duration(Quantity),
}

impl Value {
    pub fn nominal(label: impl Into<Arc<str>>) -> Value {
        Value::Nominal(label.into())
    }

    pub fn categorical(label: impl Into<Arc<str>>, categories: Arc<CategorySet>) -> Value {
        Value::Categorical {
            label: label.into(),
            categories,
        }
    }

    /// Fails when the label does not appear in the rankings.
    pub fn ranked(label: impl Into<Arc<str>>, rankings: Arc<Rankings>) -> Result<Value, ValueError> {
        let label = label.into();
        let rank = rankings
            .position(&label)
            .ok_or_else(|| ValueError::invalid(format!("{label:?} is not in the rankings")))?;
        Ok(Value::Ranked {
            label,
            rank,
            rankings,
        })
    }

    pub fn int(data: i64) -> Value {
        Value::Int(data)
    }

    /// Fails when the payload is not a finite number.
    pub fn float(data: f64) -> Result<Value, ValueError> {
        if !data.is_finite() {
            return Err(ValueError::invalid(format!("{data} is not a finite number")));
        }
        Ok(Value::Float(data))
    }

    pub fn class(&self) -> ValueClass {
        match self {
            Value::Null => ValueClass::Null,
            Value::Nominal(_) => ValueClass::Nominal,
            Value::Categorical { .. } => ValueClass::Categorical,
            Value::Ranked { .. } => ValueClass::Ranked,
            Value::Int(_) => ValueClass::Int,
            Value::Float(_) => ValueClass::Float,
            Value::Quantity(_) => ValueClass::Quantity,
            Value::Time(_) => ValueClass::Time,
            Value::Duration(_) => ValueClass::Duration,
        }
    }

    /// Presentation tag consumed by headers and chart encodings.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null | Value::Nominal(_) | Value::Categorical { .. } => Kind::Nominal,
            Value::Ranked { .. } => Kind::Ordinal,
            Value::Int(_) | Value::Float(_) | Value::Quantity(_) | Value::Duration(_) => {
                Kind::Quantitative
            }
            Value::Time(_) => Kind::Temporal,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(data) => Some(*data),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(data) => Some(*data),
            _ => None,
        }
    }

    /// Payload in a serialization-friendly shape. Display strings for times
    /// come from the format accessors, not from here.
    pub fn json(&self) -> serde_json::Value {
        match self {
            Value::Null => json!(null),
            Value::Nominal(label)
            | Value::Categorical { label, .. }
            | Value::Ranked { label, .. } => json!(label.as_ref()),
            Value::Int(data) => json!(data),
            Value::Float(data) => json!(data),
            Value::Quantity(q) | Value::Duration(q) => json!({
                "amount": q.amount(),
                "unit": q.unit(),
            }),
            Value::Time(t) => json!({
                "epoch_ms": t.raw_millis(),
                "resolution": t.resolution().as_str(),
            }),
        }
    }

    pub fn sqr(&self) -> Result<Value, ValueError> {
        self.pow(&Value::Int(2))
    }

    pub fn sqrt(&self) -> Result<Value, ValueError> {
        self.pow(&Value::Float(0.5))
    }

    fn not_implemented(&self, operation: &'static str) -> ValueError {
        ValueError::NotImplemented {
            operation,
            class: self.class().as_str(),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::nominal(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Nominal(label)
            | Value::Categorical { label, .. }
            | Value::Ranked { label, .. } => f.write_str(label),
            Value::Int(data) => write!(f, "{data}"),
            Value::Float(data) => write!(f, "{data}"),
            Value::Quantity(q) | Value::Duration(q) => write!(f, "{} {}", q.amount(), q.unit()),
            Value::Time(t) => write!(f, "{t}"),
        }
    }
}

/// Ordering contract: `eq_value` and `gt` are the primitives; the rest are
/// derived once and must not be overridden per type.
pub trait Ordered {
    fn eq_value(&self, other: &Self) -> Result<bool, ValueError>;
    fn gt(&self, other: &Self) -> Result<bool, ValueError>;

    fn neq(&self, other: &Self) -> Result<bool, ValueError> {
        Ok(!self.eq_value(other)?)
    }

    fn gte(&self, other: &Self) -> Result<bool, ValueError> {
        Ok(self.gt(other)? || self.eq_value(other)?)
    }

    fn lt(&self, other: &Self) -> Result<bool, ValueError> {
        Ok(!self.gte(other)?)
    }

    fn lte(&self, other: &Self) -> Result<bool, ValueError> {
        Ok(!self.gt(other)?)
    }
}

/// Numeric algebra. `sub` derives from `add` and `negate`; the only carve-out
/// is time − time, which yields a duration.
pub trait Algebra: Sized {
    fn add(&self, other: &Self) -> Result<Self, ValueError>;
    fn mul(&self, other: &Self) -> Result<Self, ValueError>;
    fn div(&self, other: &Self) -> Result<Self, ValueError>;
    fn pow(&self, other: &Self) -> Result<Self, ValueError>;
    fn negate(&self) -> Result<Self, ValueError>;

    fn sub(&self, other: &Self) -> Result<Self, ValueError> {
        self.add(&other.negate()?)
    }
}

/// Coerces a float-or-int operand into the floating domain.
fn float_operand(value: &Value) -> Result<f64, ValueError> {
    match value {
        Value::Float(data) => Ok(*data),
        Value::Int(data) => Ok(*data as f64),
        other => Err(ValueError::SignatureMismatch {
            expected: signature::FLOAT_OR_INT.name(),
            found: other.class().as_str(),
        }),
    }
}

fn int_operand(value: &Value) -> Result<i64, ValueError> {
    match value {
        Value::Int(data) => Ok(*data),
        other => Err(ValueError::SignatureMismatch {
            expected: signature::INT.name(),
            found: other.class().as_str(),
        }),
    }
}

fn quantity_operand<'a>(value: &'a Value, expected: &Signature) -> Result<&'a Quantity, ValueError> {
    match value {
        Value::Quantity(q) | Value::Duration(q) if expected.matches(value) => Ok(q),
        other => Err(ValueError::SignatureMismatch {
            expected: expected.name(),
            found: other.class().as_str(),
        }),
    }
}

fn time_operand(value: &Value) -> Result<&Time, ValueError> {
    match value {
        Value::Time(t) => Ok(t),
        other => Err(ValueError::SignatureMismatch {
            expected: signature::TIME.name(),
            found: other.class().as_str(),
        }),
    }
}

fn truncate_to_int(data: f64) -> Result<i64, ValueError> {
    if !data.is_finite() {
        return Err(ValueError::invalid(format!("{data} is not a finite number")));
    }
    let truncated = data.trunc();
    if truncated < i64::MIN as f64 || truncated > i64::MAX as f64 {
        return Err(ValueError::invalid(format!("{data} is out of integer range")));
    }
    Ok(truncated as i64)
}

impl Ordered for Value {
    fn eq_value(&self, other: &Value) -> Result<bool, ValueError> {
        match self {
            Value::Null => Ok(other.is_null()),
            Value::Nominal(label) | Value::Categorical { label, .. } => {
                signature::NOMINAL_LIKE.ensure(other)?;
                Ok(matches!(
                    other,
                    Value::Nominal(b) | Value::Categorical { label: b, .. } if label == b
                ))
            }
            Value::Ranked { rank, .. } => {
                signature::RANKED.ensure(other)?;
                Ok(matches!(other, Value::Ranked { rank: b, .. } if rank == b))
            }
            Value::Int(data) => {
                signature::INT.ensure(other)?;
                Ok(matches!(other, Value::Int(b) if data == b))
            }
            Value::Float(data) => Ok(approx_eq(*data, float_operand(other)?)),
            Value::Quantity(q) => {
                let b = quantity_operand(other, &signature::QUANTITY)?;
                Ok(approx_eq(q.get(b.unit())?, b.amount()))
            }
            Value::Time(t) => Ok(t.raw_millis() == time_operand(other)?.raw_millis()),
            Value::Duration(q) => {
                let b = quantity_operand(other, &signature::DURATION)?;
                Ok(approx_eq(q.get(b.unit())?, b.amount()))
            }
        }
    }

    fn gt(&self, other: &Value) -> Result<bool, ValueError> {
        match self {
            Value::Null | Value::Nominal(_) | Value::Categorical { .. } => {
                Err(self.not_implemented("gt"))
            }
            Value::Ranked { rank, .. } => {
                signature::RANKED.ensure(other)?;
                Ok(matches!(other, Value::Ranked { rank: b, .. } if rank > b))
            }
            Value::Int(data) => {
                signature::INT.ensure(other)?;
                Ok(matches!(other, Value::Int(b) if data > b))
            }
            Value::Float(data) => Ok(*data > float_operand(other)?),
            Value::Quantity(q) => {
                let b = quantity_operand(other, &signature::QUANTITY)?;
                Ok(q.get(b.unit())? > b.amount())
            }
            Value::Time(t) => Ok(t.raw_millis() > time_operand(other)?.raw_millis()),
            Value::Duration(q) => {
                let b = quantity_operand(other, &signature::DURATION)?;
                Ok(q.get(b.unit())? > b.amount())
            }
        }
    }
}

impl Algebra for Value {
    fn add(&self, other: &Value) -> Result<Value, ValueError> {
        match self {
            Value::Int(a) => {
                let b = int_operand(other)?;
                a.checked_add(b)
                    .map(Value::Int)
                    .ok_or_else(|| ValueError::invalid("integer overflow in add"))
            }
            Value::Float(a) => Value::float(a + float_operand(other)?),
            Value::Quantity(q) => {
                let b = quantity_operand(other, &signature::QUANTITY)?;
                Ok(Value::Quantity(q.with_amount(q.amount() + b.get(q.unit())?)))
            }
            Value::Duration(q) => {
                let b = quantity_operand(other, &signature::DURATION)?;
                Ok(Value::Duration(q.with_amount(q.amount() + b.get(q.unit())?)))
            }
            Value::Time(t) => {
                let d = quantity_operand(other, &signature::DURATION)?;
                Ok(Value::Time(t.add_duration(d)?))
            }
            _ => Err(self.not_implemented("add")),
        }
    }

    fn mul(&self, other: &Value) -> Result<Value, ValueError> {
        match self {
            Value::Int(a) => {
                let b = int_operand(other)?;
                a.checked_mul(b)
                    .map(Value::Int)
                    .ok_or_else(|| ValueError::invalid("integer overflow in mul"))
            }
            Value::Float(a) => Value::float(a * float_operand(other)?),
            // A quantity scales by a unitless numeric; quantity × quantity has
            // no defined unit here and is rejected by the operand check.
            Value::Quantity(q) => Ok(Value::Quantity(q.with_amount(q.amount() * float_operand(other)?))),
            Value::Duration(q) => Ok(Value::Duration(q.with_amount(q.amount() * float_operand(other)?))),
            _ => Err(self.not_implemented("mul")),
        }
    }

    fn div(&self, other: &Value) -> Result<Value, ValueError> {
        match self {
            Value::Int(a) => {
                let b = int_operand(other)?;
                if b == 0 {
                    return Err(ValueError::invalid("integer division by zero"));
                }
                // i64 division truncates toward zero.
                a.checked_div(b)
                    .map(Value::Int)
                    .ok_or_else(|| ValueError::invalid("integer overflow in div"))
            }
            Value::Float(a) => Value::float(a / float_operand(other)?),
            Value::Quantity(q) => Ok(Value::Quantity(q.with_amount(q.amount() / float_operand(other)?))),
            Value::Duration(q) => Ok(Value::Duration(q.with_amount(q.amount() / float_operand(other)?))),
            _ => Err(self.not_implemented("div")),
        }
    }

    fn pow(&self, other: &Value) -> Result<Value, ValueError> {
        match self {
            Value::Int(a) => {
                let b = int_operand(other)?;
                // Computed in the floating domain, truncated toward zero.
                Ok(Value::Int(truncate_to_int((*a as f64).powf(b as f64))?))
            }
            Value::Float(a) => Value::float(a.powf(float_operand(other)?)),
            Value::Quantity(q) => Ok(Value::Quantity(q.with_amount(q.amount().powf(float_operand(other)?)))),
            Value::Duration(q) => Ok(Value::Duration(q.with_amount(q.amount().powf(float_operand(other)?)))),
            _ => Err(self.not_implemented("pow")),
        }
    }

    fn negate(&self) -> Result<Value, ValueError> {
        match self {
            Value::Int(a) => a
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| ValueError::invalid("integer overflow in negate")),
            Value::Float(a) => Value::float(-a),
            Value::Quantity(q) => Ok(Value::Quantity(q.with_amount(-q.amount()))),
            Value::Duration(q) => Ok(Value::Duration(q.with_amount(-q.amount()))),
            _ => Err(self.not_implemented("negate")),
        }
    }

    fn sub(&self, other: &Value) -> Result<Value, ValueError> {
        match (self, other) {
            (Value::Time(a), Value::Time(b)) => Ok(Value::Duration(a.sub_time(b)?)),
            _ => self.add(&other.negate()?),
        }
    }
}
