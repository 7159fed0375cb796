//! Column type handles.
//!
//! A [`ValueType`] stands in for the concrete class of a column's values: it
//! knows the presentation [`Kind`], the algebra identities where the type has
//! an algebra, the expected [`ValueClass`] of its values, and how to parse a
//! raw token into one.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValueError;
use crate::signature::ValueClass;
use crate::temporal::{Resolution, Time};
use crate::unit::UnitTable;
use crate::value::{CategorySet, Rankings, Value};

/// Presentation tag used by headers and chart encodings to choose display.
/// Metadata, not behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Nominal,
    Ordinal,
    Quantitative,
    Temporal,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Nominal => "nominal",
            Kind::Ordinal => "ordinal",
            Kind::Quantitative => "quantitative",
            Kind::Temporal => "temporal",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The concrete value class a column holds.
#[derive(Debug, Clone)]
pub enum ValueType {
    Nominal,
    Categorical(Arc<CategorySet>),
    Ranked(Arc<Rankings>),
    Int,
    Float,
    /// Float restricted to [-90, 90].
    Latitude,
    /// Float restricted to [-180, 180].
    Longitude,
    /// Float presentation specialization for tally columns.
    Count,
    /// Quantities of `unit`, converting through `table`.
    Unit {
        table: Arc<UnitTable>,
        unit: Arc<str>,
    },
    /// Calendar date at day resolution, parsed from ISO `YYYY-MM-DD`.
    Day,
    /// Calendar year at year resolution, anchored to January 1.
    Year,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Nominal => "nominal",
            ValueType::Categorical(_) => "categorical",
            ValueType::Ranked(_) => "ranked",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Latitude => "latitude",
            ValueType::Longitude => "longitude",
            ValueType::Count => "count",
            ValueType::Unit { .. } => "unit",
            ValueType::Day => "day",
            ValueType::Year => "year",
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            ValueType::Nominal | ValueType::Categorical(_) => Kind::Nominal,
            ValueType::Ranked(_) => Kind::Ordinal,
            ValueType::Int
            | ValueType::Float
            | ValueType::Latitude
            | ValueType::Longitude
            | ValueType::Count
            | ValueType::Unit { .. } => Kind::Quantitative,
            ValueType::Day | ValueType::Year => Kind::Temporal,
        }
    }

    /// The class every non-null value of this column must carry.
    pub fn value_class(&self) -> ValueClass {
        match self {
            ValueType::Nominal => ValueClass::Nominal,
            ValueType::Categorical(_) => ValueClass::Categorical,
            ValueType::Ranked(_) => ValueClass::Ranked,
            ValueType::Int => ValueClass::Int,
            ValueType::Float | ValueType::Latitude | ValueType::Longitude | ValueType::Count => {
                ValueClass::Float
            }
            ValueType::Unit { .. } => ValueClass::Quantity,
            ValueType::Day | ValueType::Year => ValueClass::Time,
        }
    }

    /// Additive identity, where the type has an algebra.
    pub fn zero(&self) -> Result<Value, ValueError> {
        match self {
            ValueType::Int => Ok(Value::Int(0)),
            ValueType::Float | ValueType::Latitude | ValueType::Longitude | ValueType::Count => {
                Ok(Value::Float(0.0))
            }
            ValueType::Unit { table, unit } => Ok(Value::Quantity(table.value(0.0, unit)?)),
            _ => Err(ValueError::NotImplemented {
                operation: "zero",
                class: self.name(),
            }),
        }
    }

    /// Multiplicative identity, where the type has an algebra.
    pub fn identity(&self) -> Result<Value, ValueError> {
        match self {
            ValueType::Int => Ok(Value::Int(1)),
            ValueType::Float | ValueType::Latitude | ValueType::Longitude | ValueType::Count => {
                Ok(Value::Float(1.0))
            }
            ValueType::Unit { table, unit } => Ok(Value::Quantity(table.value(1.0, unit)?)),
            _ => Err(ValueError::NotImplemented {
                operation: "identity",
                class: self.name(),
            }),
        }
    }

    /// Parses one raw token into a value of this type. Label-like types take
    /// the token through unchanged; numeric and temporal types parse strictly
    /// and fail with an invalid-value error.
    pub fn parse_token(&self, token: &str) -> Result<Value, ValueError> {
        match self {
            ValueType::Nominal => Ok(Value::nominal(token)),
            ValueType::Categorical(categories) => {
                Ok(Value::categorical(token, categories.clone()))
            }
            ValueType::Ranked(rankings) => Value::ranked(token, rankings.clone()),
            ValueType::Int => {
                let data: i64 = token.trim().parse().map_err(|_| {
                    ValueError::invalid(format!("{token:?} is not an integer"))
                })?;
                Ok(Value::Int(data))
            }
            ValueType::Float | ValueType::Count => Value::float(parse_f64(token)?),
            ValueType::Latitude => {
                let data = parse_f64(token)?;
                if !(-90.0..=90.0).contains(&data) {
                    return Err(ValueError::invalid(format!(
                        "{data} is out of latitude range"
                    )));
                }
                Value::float(data)
            }
            ValueType::Longitude => {
                let data = parse_f64(token)?;
                if !(-180.0..=180.0).contains(&data) {
                    return Err(ValueError::invalid(format!(
                        "{data} is out of longitude range"
                    )));
                }
                Value::float(data)
            }
            ValueType::Unit { table, unit } => {
                Ok(Value::Quantity(table.value(parse_f64(token)?, unit)?))
            }
            ValueType::Day => {
                let date = NaiveDate::parse_from_str(token.trim(), "%Y-%m-%d").map_err(|_| {
                    ValueError::invalid(format!("{token:?} is not an ISO calendar date"))
                })?;
                Ok(Value::Time(Time::new(
                    midnight_ms(date)?,
                    Resolution::Day,
                )))
            }
            ValueType::Year => {
                let year: i32 = token.trim().parse().map_err(|_| {
                    ValueError::invalid(format!("{token:?} is not a year"))
                })?;
                let date = NaiveDate::from_ymd_opt(year, 1, 1)
                    .ok_or_else(|| ValueError::invalid(format!("{year} is out of calendar range")))?;
                Ok(Value::Time(Time::new(
                    midnight_ms(date)?,
                    Resolution::Year,
                )))
            }
        }
    }
}

fn parse_f64(token: &str) -> Result<f64, ValueError> {
    token
        .trim()
        .parse()
        .map_err(|_| ValueError::invalid(format!("{token:?} is not a number")))
}

fn midnight_ms(date: NaiveDate) -> Result<i64, ValueError> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ValueError::invalid(format!("{date} has no midnight instant")))?;
    Ok(midnight.and_utc().timestamp_millis())
}
