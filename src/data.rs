//! Row model: dynamically typed cells, rows and row sets
//!
//! Rows arrive from an external source (CSV parser, JSON payload) as
//! mappings from column name to a scalar. Cells are a tagged union with
//! explicit coercions instead of implicit type juggling.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Null,
}

static NULL: Value = Value::Null;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Finite numeric reading of the cell.
    ///
    /// Text is parsed after trimming; blank text, unparsable text, NaN and
    /// infinities all read as `None`.
    pub fn as_finite(&self) -> Option<f64> {
        match self {
            Value::Number(v) if v.is_finite() => Some(*v),
            Value::Number(_) => None,
            Value::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite()),
            Value::Null => None,
        }
    }

    /// Stable string form, `None` for nulls.
    ///
    /// Integral numbers print without a fractional part (`5`, not `5.0`).
    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Number(v) => Some(format_number(*v)),
            Value::Text(s) => Some(s.clone()),
            Value::Null => None,
        }
    }

    /// Key used for label maps. Nulls become the literal `"null"` so that
    /// every row keeps a label.
    pub fn label_key(&self) -> String {
        self.as_string().unwrap_or_else(|| "null".to_string())
    }

    /// Text view for tokenization; numbers are stringified, nulls are empty.
    pub fn as_text(&self) -> std::borrow::Cow<'_, str> {
        match self {
            Value::Text(s) => std::borrow::Cow::Borrowed(s.as_str()),
            Value::Number(v) => std::borrow::Cow::Owned(format_number(*v)),
            Value::Null => std::borrow::Cow::Borrowed(""),
        }
    }
}

fn format_number(v: f64) -> String {
    if v == 0.0 {
        // -0 and 0 are the same value
        "0".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else {
        // f64 Display already omits a trailing ".0"
        v.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            other => write!(f, "{}", other.as_text()),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One record: column name to cell. Missing keys read as null.
pub type Row = HashMap<String, Value>;

/// Read a cell, treating an absent key as null
pub fn cell<'a>(row: &'a Row, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&NULL)
}

/// A materialized dataset with a fixed column order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Build from ordered records. The column order is the key order of the
    /// first record; keys that only appear later are kept in the rows but
    /// are not part of the column list.
    pub fn from_records<K, I, R>(records: R) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
        R: IntoIterator<Item = I>,
    {
        let mut columns: Vec<String> = Vec::new();
        let mut rows = Vec::new();

        for (i, record) in records.into_iter().enumerate() {
            let mut row = Row::new();
            for (key, value) in record {
                let key = key.into();
                if i == 0 && !columns.contains(&key) {
                    columns.push(key.clone());
                }
                row.insert(key, value);
            }
            rows.push(row);
        }

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
