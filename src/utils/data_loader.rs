//! Data loading: delimited text and JSON into row sets

use crate::data::{Row, RowSet, Value};
use crate::error::{Result, TabTextError};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Loads datasets from disk as [`RowSet`]s.
///
/// CSV cells are typed one by one: anything that parses as a finite number
/// becomes a number, blank cells become null, everything else stays text.
#[derive(Debug, Clone, Copy)]
pub struct DataLoader {
    delimiter: u8,
    has_header: bool,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
        }
    }

    /// Field separator; `load_auto` still uses a tab for `.tsv` files
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Without a header row, columns are named `column_1`, `column_2`, ...
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Load a delimited text file
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<RowSet> {
        let start = Instant::now();
        let path = path.as_ref();
        let file = File::open(path)?;

        let parse_opts = CsvParseOptions::default().with_separator(self.delimiter);

        // every column as string; typing happens per cell
        let df = CsvReadOptions::default()
            .with_has_header(self.has_header)
            .with_infer_schema_length(Some(0))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()?;

        let rows = dataframe_to_rows(&df)?;
        info!(
            path = %path.display(),
            rows = rows.len(),
            columns = rows.columns().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded CSV"
        );
        Ok(rows)
    }

    /// Load a JSON array of flat objects.
    ///
    /// Column order is the key order of the first object as serde_json
    /// yields it (sorted by key).
    pub fn load_json(&self, path: impl AsRef<Path>) -> Result<RowSet> {
        let text = std::fs::read_to_string(path)?;
        let records: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(&text)?;

        let rows = records.into_iter().map(|record| {
            record
                .into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect::<Vec<_>>()
        });
        Ok(RowSet::from_records(rows))
    }

    /// Pick a loader from the file extension; CSV is the default
    pub fn load_auto(&self, path: impl AsRef<Path>) -> Result<RowSet> {
        let path = path.as_ref();
        let lower = path.to_string_lossy().to_lowercase();

        if lower.ends_with(".json") {
            self.load_json(path)
        } else if lower.ends_with(".tsv") {
            DataLoader { delimiter: b'\t', ..*self }.load_csv(path)
        } else {
            self.load_csv(path)
        }
    }
}

/// Type a raw text cell the way a dynamically typed CSV reader would
pub fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Value::Number(v),
        _ => Value::Text(raw.to_string()),
    }
}

fn json_to_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
        serde_json::Value::String(s) => Value::Text(s),
        other => Value::Text(other.to_string()),
    }
}

/// Convert a DataFrame into rows. Numeric columns keep their numbers, other
/// columns are cast to strings and typed per cell.
pub fn dataframe_to_rows(df: &DataFrame) -> Result<RowSet> {
    let columns: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    if columns.iter().any(|c| c.is_empty()) {
        return Err(TabTextError::DataError("header contains an empty column name".to_string()));
    }

    let mut rows: Vec<Row> = (0..df.height())
        .map(|_| Row::with_capacity(columns.len()))
        .collect();

    for column in df.get_columns() {
        let name = column.name().to_string();
        let series = column.as_materialized_series();

        match series.dtype() {
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 |
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 |
            DataType::Float32 | DataType::Float64 => {
                let casted = series.cast(&DataType::Float64)?;
                for (row, v) in rows.iter_mut().zip(casted.f64()?.into_iter()) {
                    row.insert(name.clone(), v.map(Value::Number).unwrap_or(Value::Null));
                }
            }
            _ => {
                let casted = series.cast(&DataType::String)?;
                for (row, v) in rows.iter_mut().zip(casted.str()?.into_iter()) {
                    row.insert(name.clone(), v.map(parse_cell).unwrap_or(Value::Null));
                }
            }
        }
    }

    Ok(RowSet::new(columns, rows))
}
