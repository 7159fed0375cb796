//! Generic statistics over a homogeneous sequence of typed values.
//!
//! No aggregate inspects the concrete value type: everything is driven by the
//! `Ordered`/`Algebra` contracts plus the type handle's `zero()`. A type that
//! lacks the required algebra surfaces `NotImplemented` from those calls.

use std::fmt::Write as _;

use thiserror::Error;

use tabula_model::{Algebra, Kind, Ordered, Value, ValueError, ValueType};

use crate::infer::UntypedSeries;

#[derive(Debug, Error)]
pub enum SeriesError {
    /// The aggregate needs at least one (non-null) element.
    #[error("series has no elements to aggregate")]
    Empty,
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// An ordered, fixed-length sequence of values of one concrete type, plus the
/// type handle and an optional back-reference to the untyped source column.
#[derive(Debug, Clone)]
pub struct Series {
    values: Vec<Value>,
    value_type: ValueType,
    source: Option<UntypedSeries>,
}

impl Series {
    pub fn new(values: Vec<Value>, value_type: ValueType) -> Result<Self, SeriesError> {
        Self::build(values, value_type, None)
    }

    pub fn with_source(
        values: Vec<Value>,
        value_type: ValueType,
        source: UntypedSeries,
    ) -> Result<Self, SeriesError> {
        Self::build(values, value_type, Some(source))
    }

    fn build(
        values: Vec<Value>,
        value_type: ValueType,
        source: Option<UntypedSeries>,
    ) -> Result<Self, SeriesError> {
        let expected = value_type.value_class();
        for value in &values {
            if value.is_null() {
                continue;
            }
            let class = value.class();
            if class != expected {
                return Err(SeriesError::Value(ValueError::SignatureMismatch {
                    expected: expected.as_str(),
                    found: class.as_str(),
                }));
            }
        }
        Ok(Self {
            values,
            value_type,
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn kind(&self) -> Kind {
        self.value_type.kind()
    }

    pub fn source(&self) -> Option<&UntypedSeries> {
        self.source.as_ref()
    }

    pub fn non_null_len(&self) -> usize {
        self.values.iter().filter(|value| !value.is_null()).count()
    }

    /// Left-fold from the type's `zero()`, skipping nulls.
    pub fn sum(&self) -> Result<Value, SeriesError> {
        if self.values.is_empty() {
            return Err(SeriesError::Empty);
        }
        let mut total = self.value_type.zero()?;
        for value in &self.values {
            if value.is_null() {
                continue;
            }
            total = total.add(value)?;
        }
        Ok(total)
    }

    /// `sum / non-null count`. Integer series average with truncating
    /// division, as the algebra dictates.
    pub fn average(&self) -> Result<Value, SeriesError> {
        let count = self.non_null_len();
        if count == 0 {
            return Err(SeriesError::Empty);
        }
        Ok(self.sum()?.div(&Value::int(count as i64))?)
    }

    /// Smallest non-null element; `None` when every element is null.
    pub fn min(&self) -> Result<Option<Value>, SeriesError> {
        if self.values.is_empty() {
            return Err(SeriesError::Empty);
        }
        let mut best: Option<&Value> = None;
        for value in &self.values {
            if value.is_null() {
                continue;
            }
            match best {
                None => best = Some(value),
                Some(current) => {
                    if value.lt(current)? {
                        best = Some(value);
                    }
                }
            }
        }
        Ok(best.cloned())
    }

    /// Largest non-null element; `None` when every element is null.
    pub fn max(&self) -> Result<Option<Value>, SeriesError> {
        if self.values.is_empty() {
            return Err(SeriesError::Empty);
        }
        let mut best: Option<&Value> = None;
        for value in &self.values {
            if value.is_null() {
                continue;
            }
            match best {
                None => best = Some(value),
                Some(current) => {
                    if value.gt(current)? {
                        best = Some(value);
                    }
                }
            }
        }
        Ok(best.cloned())
    }

    /// Mean squared deviation from the mean. Integer elements are coerced to
    /// floats before subtracting so the deviation arithmetic stays in the
    /// floating domain.
    pub fn variance(&self) -> Result<Value, SeriesError> {
        let mean = self.average()?;
        let mut total = Value::Float(0.0);
        for value in &self.values {
            if value.is_null() {
                continue;
            }
            let deviation = coerce_float(value).sub(&mean)?;
            total = total.add(&deviation.sqr()?)?;
        }
        Ok(total.div(&Value::int(self.non_null_len() as i64))?)
    }

    pub fn stddev(&self) -> Result<Value, SeriesError> {
        Ok(self.variance()?.sqrt()?)
    }

    /// Distinct (value, count) pairs grouped with the type's own equality
    /// (O(n·k); equality is type-defined, so no hashing is assumed), sorted
    /// descending by count with ties in encounter order. Nulls are skipped.
    pub fn hist(&self) -> Result<Vec<(Value, usize)>, SeriesError> {
        if self.values.is_empty() {
            return Err(SeriesError::Empty);
        }
        let mut counts: Vec<(Value, usize)> = Vec::new();
        for value in &self.values {
            if value.is_null() {
                continue;
            }
            let mut found = false;
            for entry in &mut counts {
                if value.eq_value(&entry.0)? {
                    entry.1 += 1;
                    found = true;
                    break;
                }
            }
            if !found {
                counts.push((value.clone(), 1));
            }
        }
        // Stable sort keeps encounter order among equal counts.
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(counts)
    }

    /// The most common value.
    pub fn mode(&self) -> Result<Value, SeriesError> {
        self.hist()?
            .into_iter()
            .next()
            .map(|(value, _)| value)
            .ok_or(SeriesError::Empty)
    }

    /// Multi-line text summary: lengths, unique count, the quantitative
    /// aggregates where the type has them, and the top five most common
    /// values.
    pub fn stats(&self) -> Result<String, SeriesError> {
        let hist = self.hist()?;
        let mut out = String::new();
        let _ = writeln!(out, "         Length: {}", self.len());
        let _ = writeln!(out, "Non-null length: {}", self.non_null_len());
        let _ = writeln!(out, "  Unique values: {}", hist.len());
        if self.kind() == Kind::Quantitative {
            if let (Some(min), Some(max)) = (self.min()?, self.max()?) {
                let _ = writeln!(out, "            Min: {min}");
                let _ = writeln!(out, "            Max: {max}");
                let _ = writeln!(out, "            Sum: {}", self.sum()?);
                let _ = writeln!(out, "           Mean: {}", self.average()?);
                let _ = writeln!(out, "         StdDev: {}", self.stddev()?);
            }
        }
        let common: Vec<String> = hist
            .iter()
            .take(5)
            .map(|(value, count)| format!("{value} ({count}x)"))
            .collect();
        let _ = writeln!(out, "    Most common: {}", common.join("\n                 "));
        Ok(out)
    }
}

fn coerce_float(value: &Value) -> Value {
    match value {
        Value::Int(data) => Value::Float(*data as f64),
        other => other.clone(),
    }
}
