//! Typed cell values and parsed rows.

use chrono::NaiveDate;

use super::{FieldType, TableSchema};
use crate::domain::{DayTime, parse_gtfs_date};
use crate::error::LoadError;

/// A decoded, non-empty cell.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(u32),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Time(DayTime),
}

impl FieldValue {
    /// Decode a trimmed, non-empty cell as the given type.
    ///
    /// The error is a human-readable reason, to be wrapped with table, row and
    /// field by the caller.
    ///
    /// # Examples
    ///
    /// ```
    /// use gtfs_schedule::table::{FieldType, FieldValue};
    ///
    /// assert_eq!(FieldValue::parse(FieldType::Integer, "7"), Ok(FieldValue::Integer(7)));
    /// assert_eq!(FieldValue::parse(FieldType::Bool, "1"), Ok(FieldValue::Bool(true)));
    /// assert!(FieldValue::parse(FieldType::Bool, "yes").is_err());
    /// assert!(FieldValue::parse(FieldType::Integer, "-3").is_err());
    /// ```
    pub fn parse(ty: FieldType, raw: &str) -> Result<Self, String> {
        match ty {
            FieldType::Text => Ok(FieldValue::Text(raw.to_string())),
            FieldType::Integer => raw
                .parse()
                .map(FieldValue::Integer)
                .map_err(|_| format!("expected a non-negative integer, found {raw:?}")),
            FieldType::Float => match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(FieldValue::Float(v)),
                _ => Err(format!("expected a number, found {raw:?}")),
            },
            FieldType::Bool => match raw {
                "0" => Ok(FieldValue::Bool(false)),
                "1" => Ok(FieldValue::Bool(true)),
                _ => Err(format!("expected 0 or 1, found {raw:?}")),
            },
            FieldType::Date => parse_gtfs_date(raw)
                .map(FieldValue::Date)
                .map_err(|e| e.reason().to_string()),
            FieldType::Time => DayTime::parse(raw)
                .map(FieldValue::Time)
                .map_err(|e| e.to_string()),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Integer(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Bool(_) => "bool",
            FieldValue::Date(_) => "date",
            FieldValue::Time(_) => "time",
        }
    }
}

/// One data row of a table, keyed by the schema's declared fields.
///
/// Columns the schema does not declare are never present. Empty cells are
/// `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    schema: &'static TableSchema,
    index: usize,
    values: Vec<Option<FieldValue>>,
}

impl Row {
    pub(crate) fn new(
        schema: &'static TableSchema,
        index: usize,
        values: Vec<Option<FieldValue>>,
    ) -> Self {
        Self {
            schema,
            index,
            values,
        }
    }

    /// 1-based position of the row in its file, not counting the header.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn table(&self) -> &'static str {
        self.schema.file
    }

    /// The value of a field, `None` if empty or undeclared.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.schema
            .position(name)
            .and_then(|i| self.values.get(i))
            .and_then(Option::as_ref)
    }

    /// Declared fields in schema order, with their values.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<&FieldValue>)> + '_ {
        self.schema
            .fields
            .iter()
            .zip(&self.values)
            .map(|(spec, value)| (spec.name, value.as_ref()))
    }

    fn error(&self, field: &str, reason: impl ToString) -> LoadError {
        LoadError::malformed(self.schema.file, self.index, field, reason)
    }

    fn require(&self, name: &str) -> Result<&FieldValue, LoadError> {
        self.get(name)
            .ok_or_else(|| self.error(name, "required value is empty"))
    }

    fn mismatch(&self, name: &str, expected: &str, found: &FieldValue) -> LoadError {
        self.error(
            name,
            format!("expected {expected} value, found {}", found.type_name()),
        )
    }

    pub fn text(&self, name: &str) -> Result<&str, LoadError> {
        match self.require(name)? {
            FieldValue::Text(s) => Ok(s),
            other => Err(self.mismatch(name, "text", other)),
        }
    }

    pub fn opt_text(&self, name: &str) -> Result<Option<String>, LoadError> {
        match self.get(name) {
            None => Ok(None),
            Some(FieldValue::Text(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.mismatch(name, "text", other)),
        }
    }

    pub fn integer(&self, name: &str) -> Result<u32, LoadError> {
        self.opt_integer(name)?
            .ok_or_else(|| self.error(name, "required value is empty"))
    }

    pub fn opt_integer(&self, name: &str) -> Result<Option<u32>, LoadError> {
        match self.get(name) {
            None => Ok(None),
            Some(FieldValue::Integer(v)) => Ok(Some(*v)),
            Some(other) => Err(self.mismatch(name, "integer", other)),
        }
    }

    pub fn float(&self, name: &str) -> Result<f64, LoadError> {
        self.opt_float(name)?
            .ok_or_else(|| self.error(name, "required value is empty"))
    }

    pub fn opt_float(&self, name: &str) -> Result<Option<f64>, LoadError> {
        match self.get(name) {
            None => Ok(None),
            Some(FieldValue::Float(v)) => Ok(Some(*v)),
            Some(other) => Err(self.mismatch(name, "float", other)),
        }
    }

    pub fn flag(&self, name: &str) -> Result<bool, LoadError> {
        self.opt_flag(name)?
            .ok_or_else(|| self.error(name, "required value is empty"))
    }

    pub fn opt_flag(&self, name: &str) -> Result<Option<bool>, LoadError> {
        match self.get(name) {
            None => Ok(None),
            Some(FieldValue::Bool(v)) => Ok(Some(*v)),
            Some(other) => Err(self.mismatch(name, "bool", other)),
        }
    }

    pub fn date(&self, name: &str) -> Result<NaiveDate, LoadError> {
        self.opt_date(name)?
            .ok_or_else(|| self.error(name, "required value is empty"))
    }

    pub fn opt_date(&self, name: &str) -> Result<Option<NaiveDate>, LoadError> {
        match self.get(name) {
            None => Ok(None),
            Some(FieldValue::Date(v)) => Ok(Some(*v)),
            Some(other) => Err(self.mismatch(name, "date", other)),
        }
    }

    pub fn time(&self, name: &str) -> Result<DayTime, LoadError> {
        match self.require(name)? {
            FieldValue::Time(t) => Ok(*t),
            other => Err(self.mismatch(name, "time", other)),
        }
    }

    /// Wrap a record-level validation failure with this row's position.
    pub fn invalid(&self, field: &str, reason: impl ToString) -> LoadError {
        self.error(field, reason)
    }
}
