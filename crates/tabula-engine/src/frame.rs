//! A named collection of equal-length columns.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use tabula_model::Kind;

use crate::series::Series;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("column {name} has {len} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        len: usize,
        expected: usize,
    },
    #[error("unknown column {name}")]
    UnknownColumn { name: String },
}

/// Column name plus the kind of its values, for schema listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub name: String,
    pub kind: Kind,
}

#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    series: Series,
}

impl Column {
    pub fn new(name: impl Into<String>, series: Series) -> Self {
        Self {
            name: name.into(),
            series,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn series(&self) -> &Series {
        &self.series
    }
}

#[derive(Debug, Clone)]
pub struct Frame {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl Frame {
    /// Every column must have the same number of rows; the first column sets
    /// the expectation.
    pub fn new(columns: Vec<Column>) -> Result<Self, FrameError> {
        let expected = columns.first().map_or(0, |column| column.series.len());
        let mut index = HashMap::with_capacity(columns.len());
        for (position, column) in columns.iter().enumerate() {
            let len = column.series.len();
            if len != expected {
                return Err(FrameError::LengthMismatch {
                    name: column.name.clone(),
                    len,
                    expected,
                });
            }
            index.insert(column.name.clone(), position);
        }
        Ok(Self { columns, index })
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |column| column.series.len())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Result<&Column, FrameError> {
        self.index
            .get(name)
            .map(|&position| &self.columns[position])
            .ok_or_else(|| FrameError::UnknownColumn {
                name: name.to_string(),
            })
    }

    pub fn headers(&self) -> Vec<Header> {
        self.columns
            .iter()
            .map(|column| Header {
                name: column.name.clone(),
                kind: column.series.kind(),
            })
            .collect()
    }

    /// Row-major JSON export of the named columns: one object per row, keyed
    /// by column name, values in their JSON-safe payload form.
    pub fn rows_json(&self, names: &[&str]) -> Result<serde_json::Value, FrameError> {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            selected.push(self.column(name)?);
        }
        let mut rows = Vec::with_capacity(self.num_rows());
        for row in 0..self.num_rows() {
            let mut object = serde_json::Map::with_capacity(selected.len());
            for column in &selected {
                object.insert(column.name.clone(), column.series.values()[row].json());
            }
            rows.push(serde_json::Value::Object(object));
        }
        Ok(serde_json::Value::Array(rows))
    }
}
