//! Tabular encoding: min-max scaling for numeric columns, one-hot blocks for
//! categorical columns

use crate::data::{cell, Row};
use crate::error::{Result, TabTextError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::{ColumnKind, Schema};

/// Categories kept per column; later distinct values are dropped
pub const MAX_CATEGORIES: usize = 200;

/// Added to the numeric range so constant columns do not divide by zero
pub const RANGE_EPSILON: f64 = 1e-9;

/// Fitted min/max of a numeric column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

impl MinMax {
    /// Used when a column had no finite values at fit time
    pub const FALLBACK: MinMax = MinMax { min: 0.0, max: 1.0 };

    pub fn scale(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min + RANGE_EPSILON)
    }
}

/// Fitted encoding for one feature column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnEncoding {
    /// `None` when no finite value was seen
    Numeric(Option<MinMax>),
    Categorical(Vec<String>),
}

impl ColumnEncoding {
    pub fn width(&self) -> usize {
        match self {
            ColumnEncoding::Numeric(_) => 1,
            ColumnEncoding::Categorical(categories) => categories.len(),
        }
    }
}

/// A feature column and its encoding, in output order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedColumn {
    pub name: String,
    pub encoding: ColumnEncoding,
    /// First output position of this column
    pub offset: usize,
}

/// Fitted encoder turning a row into a fixed-width numeric vector.
///
/// The output layout is the feature column order given to [`fit`](Self::fit);
/// it is stored explicitly and reused verbatim by every transform. Text-kind
/// columns contribute no positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabularEncoder {
    columns: Vec<EncodedColumn>,
    dim: usize,
}

impl TabularEncoder {
    /// Fit min/max statistics and category lists from `rows`.
    ///
    /// Categorical columns keep at most [`MAX_CATEGORIES`] values in
    /// first-seen order. Nulls and the literal strings `"null"` and
    /// `"undefined"` are never categories.
    pub fn fit<'a, I>(rows: I, feature_cols: &[String], schema: &Schema) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Row>,
        I::IntoIter: Clone,
    {
        let rows = rows.into_iter();
        let mut columns = Vec::with_capacity(feature_cols.len());
        let mut offset = 0;

        for name in feature_cols {
            let kind = schema
                .kind(name)
                .ok_or_else(|| TabTextError::InvalidColumn(name.clone()))?;

            let encoding = match kind {
                ColumnKind::Numeric => ColumnEncoding::Numeric(fit_min_max(rows.clone(), name)),
                ColumnKind::Categorical => {
                    ColumnEncoding::Categorical(fit_categories(rows.clone(), name))
                }
                ColumnKind::Text => continue,
            };

            let width = encoding.width();
            columns.push(EncodedColumn {
                name: name.clone(),
                encoding,
                offset,
            });
            offset += width;
        }

        Ok(Self {
            columns,
            dim: offset,
        })
    }

    /// Output width
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn columns(&self) -> &[EncodedColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&EncodedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Category list of a fitted categorical column
    pub fn categories(&self, name: &str) -> Option<&[String]> {
        match &self.column(name)?.encoding {
            ColumnEncoding::Categorical(c) => Some(c),
            ColumnEncoding::Numeric(_) => None,
        }
    }

    /// Encode one row
    pub fn transform(&self, row: &Row) -> Vec<f64> {
        let mut out = vec![0.0; self.dim];
        self.transform_into(row, &mut out);
        out
    }

    /// Encode one row into `out`, which must be `dim()` wide.
    ///
    /// Unknown categories give an all-zero block; non-numeric values in a
    /// numeric column give 0.
    pub fn transform_into(&self, row: &Row, out: &mut [f64]) {
        for column in &self.columns {
            let value = cell(row, &column.name);
            match &column.encoding {
                ColumnEncoding::Categorical(categories) => {
                    let block = &mut out[column.offset..column.offset + categories.len()];
                    block.fill(0.0);
                    if let Some(s) = value.as_string() {
                        if let Some(i) = categories.iter().position(|c| *c == s) {
                            block[i] = 1.0;
                        }
                    }
                }
                ColumnEncoding::Numeric(stats) => {
                    let stats = stats.unwrap_or(MinMax::FALLBACK);
                    out[column.offset] = value.as_finite().map(|v| stats.scale(v)).unwrap_or(0.0);
                }
            }
        }
    }
}

fn fit_min_max<'a>(rows: impl Iterator<Item = &'a Row>, column: &str) -> Option<MinMax> {
    rows.filter_map(|r| cell(r, column).as_finite())
        .fold(None, |acc: Option<MinMax>, v| match acc {
            None => Some(MinMax { min: v, max: v }),
            Some(m) => Some(MinMax {
                min: m.min.min(v),
                max: m.max.max(v),
            }),
        })
}

fn fit_categories<'a>(rows: impl Iterator<Item = &'a Row>, column: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut categories = Vec::new();

    for value in rows.filter_map(|r| cell(r, column).as_string()) {
        if value == "null" || value == "undefined" {
            continue;
        }
        if seen.insert(value.clone()) {
            categories.push(value);
        }
    }

    if categories.len() > MAX_CATEGORIES {
        debug!(
            column,
            distinct = categories.len(),
            limit = MAX_CATEGORIES,
            "Categories truncated"
        );
        categories.truncate(MAX_CATEGORIES);
    }

    categories
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RowSet, Value};
    use crate::preprocessing::infer_schema;

    fn color_score() -> RowSet {
        RowSet::from_records(vec![
            vec![("color", Value::from("red")), ("score", Value::from(5.0))],
            vec![("color", Value::from("blue")), ("score", Value::from(3.0))],
            vec![("color", Value::from("red")), ("score", Value::from(9.0))],
        ])
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_one_hot_first_seen_order() {
        let rows = color_score();
        let schema = infer_schema(&rows);
        let encoder = TabularEncoder::fit(rows.rows(), &cols(&["color"]), &schema).unwrap();

        assert_eq!(encoder.dim(), 2);
        assert_eq!(encoder.categories("color").unwrap(), &["red".to_string(), "blue".to_string()]);
        assert_eq!(encoder.transform(&rows.rows()[0]), vec![1.0, 0.0]);
        assert_eq!(encoder.transform(&rows.rows()[1]), vec![0.0, 1.0]);
    }

    #[test]
    fn test_min_max_scaling() {
        let rows = color_score();
        let schema = infer_schema(&rows);
        let encoder = TabularEncoder::fit(rows.rows(), &cols(&["score"]), &schema).unwrap();

        assert_eq!(encoder.dim(), 1);
        let low = encoder.transform(&rows.rows()[1])[0];
        let high = encoder.transform(&rows.rows()[2])[0];
        assert!(low.abs() < 1e-9);
        assert!((high - 1.0).abs() < 1e-6);
        for row in rows.rows() {
            let v = encoder.transform(row)[0];
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_layout_follows_feature_order() {
        let rows = color_score();
        let schema = infer_schema(&rows);
        let encoder =
            TabularEncoder::fit(rows.rows(), &cols(&["score", "color"]), &schema).unwrap();

        assert_eq!(encoder.dim(), 3);
        assert_eq!(encoder.columns()[0].name, "score");
        assert_eq!(encoder.columns()[1].offset, 1);
        let v = encoder.transform(&rows.rows()[1]);
        assert_eq!(&v[1..], &[0.0, 1.0]);
    }

    #[test]
    fn test_unseen_category_and_missing_numeric() {
        let rows = color_score();
        let schema = infer_schema(&rows);
        let encoder =
            TabularEncoder::fit(rows.rows(), &cols(&["color", "score"]), &schema).unwrap();

        let unseen = RowSet::from_records(vec![vec![
            ("color", Value::from("green")),
            ("score", Value::Null),
        ]]);
        assert_eq!(encoder.transform(&unseen.rows()[0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_constant_column_does_not_divide_by_zero() {
        let rows = RowSet::from_records(vec![
            vec![("x", Value::from(4.0))],
            vec![("x", Value::from(4.0))],
            vec![("x", Value::from(4.0))],
        ]);
        let schema = infer_schema(&rows);
        let encoder = TabularEncoder::fit(rows.rows(), &cols(&["x"]), &schema).unwrap();
        let v = encoder.transform(&rows.rows()[0])[0];
        assert!(v.is_finite());
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_numeric_without_finite_values_uses_fallback() {
        let schema = Schema::from_columns(vec![(
            "x".to_string(),
            crate::preprocessing::ColumnSchema { kind: ColumnKind::Numeric, unique_count: 0 },
        )]);
        let fit_rows = RowSet::from_records(vec![vec![("x", Value::Null)]]);
        let encoder = TabularEncoder::fit(fit_rows.rows(), &cols(&["x"]), &schema).unwrap();
        assert_eq!(encoder.columns()[0].encoding, ColumnEncoding::Numeric(None));

        let probe = RowSet::from_records(vec![vec![("x", Value::from(0.5))]]);
        let v = encoder.transform(&probe.rows()[0])[0];
        assert!((v - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_category_cap_and_null_literals() {
        let mut records = vec![
            vec![("c", Value::from("null"))],
            vec![("c", Value::from("undefined"))],
            vec![("c", Value::Null)],
        ];
        for i in 0..250 {
            records.push(vec![("c", Value::from(format!("cat{}", i)))]);
        }
        let rows = RowSet::from_records(records);
        let schema = infer_schema(&rows);
        assert_eq!(schema.kind("c"), Some(ColumnKind::Categorical));

        let encoder = TabularEncoder::fit(rows.rows(), &cols(&["c"]), &schema).unwrap();
        let categories = encoder.categories("c").unwrap();
        assert_eq!(categories.len(), MAX_CATEGORIES);
        assert_eq!(categories[0], "cat0");
        assert_eq!(categories[MAX_CATEGORIES - 1], "cat199");

        // a dropped category encodes as all zeros
        let v = encoder.transform(&rows.rows()[rows.len() - 1]);
        assert_eq!(v.iter().sum::<f64>(), 0.0);
    }

    #[test]
    fn test_text_columns_are_skipped() {
        let rows = RowSet::from_records(vec![
            vec![("note", Value::from("a rather long note about nothing at all")), ("x", Value::from(1.0))],
            vec![("note", Value::from("another rather long note about nothing")), ("x", Value::from(2.0))],
        ]);
        let schema = infer_schema(&rows);
        let encoder = TabularEncoder::fit(rows.rows(), &cols(&["note", "x"]), &schema).unwrap();
        assert_eq!(encoder.dim(), 1);
        assert_eq!(encoder.columns().len(), 1);
    }

    #[test]
    fn test_unknown_feature_column() {
        let rows = color_score();
        let schema = infer_schema(&rows);
        let err = TabularEncoder::fit(rows.rows(), &cols(&["missing"]), &schema).unwrap_err();
        assert!(matches!(err, TabTextError::InvalidColumn(_)));
    }

    #[test]
    fn test_transform_is_deterministic() {
        let rows = color_score();
        let schema = infer_schema(&rows);
        let encoder =
            TabularEncoder::fit(rows.rows(), &cols(&["color", "score"]), &schema).unwrap();
        for row in rows.rows() {
            assert_eq!(encoder.transform(row), encoder.transform(row));
        }
    }

    #[test]
    fn test_negative_zero_shares_a_category() {
        let rows = RowSet::from_records(vec![
            vec![("c", Value::from(0.0))],
            vec![("c", Value::from(-0.0))],
            vec![("c", Value::from("x"))],
            vec![("c", Value::from("y"))],
        ]);
        let schema = infer_schema(&rows);
        assert_eq!(schema.get("c").unwrap().unique_count, 3);

        let encoder = TabularEncoder::fit(rows.rows(), &cols(&["c"]), &schema).unwrap();
        assert_eq!(encoder.categories("c").unwrap(), &["0", "x", "y"].map(String::from));
        assert_eq!(encoder.transform(&rows.rows()[1]), vec![1.0, 0.0, 0.0]);
    }
}
