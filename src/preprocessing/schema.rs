//! Column kind inference from a bounded sample of rows

use crate::data::{cell, RowSet, Value};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::ColumnKind;

/// Rows inspected per column
pub const SCHEMA_SAMPLE_SIZE: usize = 500;
/// Strings longer than this count towards the text share
pub const LONG_TEXT_CHARS: usize = 20;
/// Share of long strings above which a column is text
pub const TEXT_SHARE_THRESHOLD: f64 = 0.3;
/// Share of finite numbers above which a column is numeric
pub const NUMERIC_SHARE_THRESHOLD: f64 = 0.7;

const TARGET_NAME_PATTERN: &str = "pair|score|rating|quality";

/// Inferred description of a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub kind: ColumnKind,
    /// Distinct non-null values in the sample
    pub unique_count: usize,
}

/// Per-column schema in dataset column order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, ColumnSchema)>", into = "Vec<(String, ColumnSchema)>")]
pub struct Schema {
    columns: Vec<(String, ColumnSchema)>,
    positions: HashMap<String, usize>,
}

impl From<Vec<(String, ColumnSchema)>> for Schema {
    fn from(columns: Vec<(String, ColumnSchema)>) -> Self {
        Self::from_columns(columns)
    }
}

impl From<Schema> for Vec<(String, ColumnSchema)> {
    fn from(schema: Schema) -> Self {
        schema.columns
    }
}

impl Schema {
    pub fn from_columns(columns: Vec<(String, ColumnSchema)>) -> Self {
        let positions = columns
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), i))
            .collect();
        Self { columns, positions }
    }

    pub fn get(&self, column: &str) -> Option<&ColumnSchema> {
        self.positions.get(column).map(|&i| &self.columns[i].1)
    }

    pub fn kind(&self, column: &str) -> Option<ColumnKind> {
        self.get(column).map(|s| s.kind)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnSchema)> {
        self.columns.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Count of numeric, categorical and text columns
    pub fn kind_counts(&self) -> KindCounts {
        let mut counts = KindCounts::default();
        for (_, s) in self.iter() {
            match s.kind {
                ColumnKind::Numeric => counts.numeric += 1,
                ColumnKind::Categorical => counts.categorical += 1,
                ColumnKind::Text => counts.text += 1,
            }
        }
        counts
    }

    /// Best guess for the target column: the first column whose name looks
    /// like a pairing, score, rating or quality, else the first column.
    pub fn guess_target(&self) -> Option<&str> {
        let pattern = RegexBuilder::new(TARGET_NAME_PATTERN)
            .case_insensitive(true)
            .build()
            .ok()?;
        self.column_names()
            .find(|name| pattern.is_match(name))
            .or_else(|| self.column_names().next())
    }
}

/// Number of columns per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    pub numeric: usize,
    pub categorical: usize,
    pub text: usize,
}

/// Infer the kind and cardinality of every column.
///
/// Only the first [`SCHEMA_SAMPLE_SIZE`] rows are inspected. Never fails;
/// an empty row set yields an empty schema.
pub fn infer_schema(rows: &RowSet) -> Schema {
    let sample = &rows.rows()[..rows.len().min(SCHEMA_SAMPLE_SIZE)];

    let columns = rows
        .columns()
        .iter()
        .map(|name| {
            let values: Vec<&Value> = sample.iter().map(|r| cell(r, name)).collect();
            (name.clone(), infer_column(&values))
        })
        .collect();

    Schema::from_columns(columns)
}

fn infer_column(values: &[&Value]) -> ColumnSchema {
    let total = values.len();

    let long_text = values
        .iter()
        .filter(|v| matches!(v, Value::Text(s) if s.chars().count() > LONG_TEXT_CHARS))
        .count();
    let finite = values
        .iter()
        .filter(|v| matches!(v, Value::Number(x) if x.is_finite()))
        .count();
    let unique: HashSet<String> = values.iter().filter_map(|v| v.as_string()).collect();

    let text_share = long_text as f64 / total.max(1) as f64;

    let kind = if text_share > TEXT_SHARE_THRESHOLD {
        ColumnKind::Text
    } else if total > 0 && finite as f64 / total as f64 > NUMERIC_SHARE_THRESHOLD {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    };

    ColumnSchema {
        kind,
        unique_count: unique.len(),
    }
}
