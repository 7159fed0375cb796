//! Runtime capability matching.
//!
//! Binary operations on typed values accept operands from a data-dependent
//! union of concrete classes (e.g. a float adds a float *or* an int), so every
//! operation checks its operand against a [`Signature`] before touching the
//! payload and fails fast with [`ValueError::SignatureMismatch`] instead of
//! producing a nonsensical result. Compound acceptance is expressed as a
//! class-set literal, not a dynamically built type.

use std::fmt;

use crate::error::ValueError;
use crate::value::Value;

/// Tag identifying the concrete variant of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueClass {
    Null,
    Nominal,
    Categorical,
    Ranked,
    Int,
    Float,
    Quantity,
    Time,
    Duration,
}

impl ValueClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueClass::Null => "null",
            ValueClass::Nominal => "nominal",
            ValueClass::Categorical => "categorical",
            ValueClass::Ranked => "ranked",
            ValueClass::Int => "int",
            ValueClass::Float => "float",
            ValueClass::Quantity => "quantity",
            ValueClass::Time => "time",
            ValueClass::Duration => "duration",
        }
    }
}

impl fmt::Display for ValueClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named set of accepted value classes checked at an operation boundary.
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    name: &'static str,
    classes: &'static [ValueClass],
}

impl Signature {
    pub const fn new(name: &'static str, classes: &'static [ValueClass]) -> Self {
        Self { name, classes }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn matches(&self, value: &Value) -> bool {
        self.classes.contains(&value.class())
    }

    pub fn ensure(&self, value: &Value) -> Result<(), ValueError> {
        if self.matches(value) {
            Ok(())
        } else {
            Err(ValueError::SignatureMismatch {
                expected: self.name,
                found: value.class().as_str(),
            })
        }
    }
}

pub const NULL: Signature = Signature::new("null", &[ValueClass::Null]);
/// Plain-equality labels: a nominal compares against nominal or categorical.
pub const NOMINAL_LIKE: Signature = Signature::new(
    "nominal or categorical",
    &[ValueClass::Nominal, ValueClass::Categorical],
);
pub const RANKED: Signature = Signature::new("ranked", &[ValueClass::Ranked]);
pub const INT: Signature = Signature::new("int", &[ValueClass::Int]);
/// The unitless numeric union: float operations accept either numeric kind.
pub const FLOAT_OR_INT: Signature =
    Signature::new("float or int", &[ValueClass::Float, ValueClass::Int]);
pub const QUANTITY: Signature = Signature::new("quantity", &[ValueClass::Quantity]);
pub const TIME: Signature = Signature::new("time", &[ValueClass::Time]);
pub const DURATION: Signature = Signature::new("duration", &[ValueClass::Duration]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_signature_accepts_every_member() {
        assert!(FLOAT_OR_INT.matches(&Value::Float(1.5)));
        assert!(FLOAT_OR_INT.matches(&Value::Int(2)));
        assert!(!FLOAT_OR_INT.matches(&Value::nominal("dog")));
    }

    #[test]
    fn ensure_reports_expected_and_found() {
        let err = INT.ensure(&Value::Float(1.0)).unwrap_err();
        assert_eq!(
            err,
            ValueError::SignatureMismatch {
                expected: "int",
                found: "float",
            }
        );
        assert!(INT.ensure(&Value::Int(1)).is_ok());
    }
}
