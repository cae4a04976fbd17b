//! Conversion between typed row objects and flat cell rows.
//!
//! Encoding walks the live header: each field takes the object's value for
//! that key, dates are rendered with the configured pattern, booleans pass
//! through and missing or null values become empty cells. Decoding zips the
//! header with the cells positionally and applies no coercion, so readers
//! must treat every value as weakly typed.

use std::collections::BTreeMap;

use serde::{ser::SerializeMap, Serialize, Serializer};
use sheetbase_core::CellValue;
use time::{format_description, Date, PrimitiveDateTime};

use crate::error::TableError;

pub const DEFAULT_DATE_FORMAT: &str = "[year]-[month]-[day]";
pub const DEFAULT_DATETIME_FORMAT: &str = "[year]-[month]-[day] [hour]:[minute]:[second]";

/// A typed value on its way into the grid.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(Date),
    DateTime(PrimitiveDateTime),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<Date> for Value {
    fn from(value: Date) -> Self {
        Value::Date(value)
    }
}

impl From<PrimitiveDateTime> for Value {
    fn from(value: PrimitiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<CellValue> for Value {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Empty => Value::Null,
            CellValue::Bool(b) => Value::Bool(b),
            CellValue::Number(n) => Value::Number(n),
            CellValue::Text(s) => Value::Text(s),
        }
    }
}

/// A field-name keyed set of values. Keys not present in the header are
/// ignored when encoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowObject {
    values: BTreeMap<String, Value>,
}

impl RowObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.values.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }
}

/// One data row as read from the grid, in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, CellValue)>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(name, _)| name == field).map(|(_, v)| v)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(CellValue::as_text)
    }

    /// The cell rendered as a string whatever its stored type.
    pub fn display(&self, field: &str) -> String {
        self.get(field).map(ToString::to_string).unwrap_or_default()
    }

    /// `true` only for a stored boolean `true`.
    pub fn is_true(&self, field: &str) -> bool {
        self.get(field).and_then(CellValue::as_bool) == Some(true)
    }

    pub fn bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(CellValue::as_bool)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(CellValue::as_number)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone)]
pub struct RowCodec {
    date_format: String,
    datetime_format: String,
}

impl Default for RowCodec {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
        }
    }
}

fn invalid_pattern(pattern: &str, e: time::error::InvalidFormatDescription) -> TableError {
    TableError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    }
}

fn check_pattern(pattern: &str) -> Result<(), TableError> {
    format_description::parse(pattern)
        .map(|_| ())
        .map_err(|e| invalid_pattern(pattern, e))
}

impl RowCodec {
    /// Builds a codec, rejecting malformed `time` format descriptions up front.
    pub fn new(date_format: &str, datetime_format: &str) -> Result<Self, TableError> {
        check_pattern(date_format)?;
        check_pattern(datetime_format)?;
        Ok(Self {
            date_format: date_format.to_string(),
            datetime_format: datetime_format.to_string(),
        })
    }

    pub fn encode_value(&self, field: &str, value: &Value) -> Result<CellValue, TableError> {
        let format_err = |source: time::error::Format| TableError::Format { field: field.to_string(), source };
        let cell = match value {
            Value::Null => CellValue::Empty,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => CellValue::Number(*n),
            Value::Text(s) => CellValue::from(s.as_str()),
            Value::Date(d) => {
                let items = format_description::parse(&self.date_format)
                    .map_err(|e| invalid_pattern(&self.date_format, e))?;
                CellValue::Text(d.format(&items).map_err(format_err)?)
            }
            Value::DateTime(dt) => {
                let items = format_description::parse(&self.datetime_format)
                    .map_err(|e| invalid_pattern(&self.datetime_format, e))?;
                CellValue::Text(dt.format(&items).map_err(format_err)?)
            }
        };
        Ok(cell)
    }

    /// Flattens `object` into one cell per header field.
    pub fn encode(&self, headers: &[String], object: &RowObject) -> Result<Vec<CellValue>, TableError> {
        headers
            .iter()
            .map(|header| match object.get(header) {
                Some(value) => self.encode_value(header, value),
                None => Ok(CellValue::Empty),
            })
            .collect()
    }

    /// Overlays `updates` on `current`: header fields present in `updates`
    /// are re-encoded, every other position keeps its current cell.
    pub fn merge(&self, headers: &[String], current: &[CellValue], updates: &RowObject) -> Result<Vec<CellValue>, TableError> {
        headers
            .iter()
            .enumerate()
            .map(|(i, header)| match updates.get(header) {
                Some(value) => self.encode_value(header, value),
                None => Ok(current.get(i).cloned().unwrap_or_default()),
            })
            .collect()
    }

    /// Zips header names with cells. Blank header cells are skipped.
    pub fn decode(&self, headers: &[String], row: Vec<CellValue>) -> Record {
        let mut cells = row.into_iter();
        let fields = headers
            .iter()
            .map(|header| (header, cells.next().unwrap_or_default()))
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), cell))
            .collect();
        Record { fields }
    }
}
