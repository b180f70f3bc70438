//! End-to-end dataset preparation: task selection, label mapping, shuffle,
//! encoder fitting, row encoding, train/test split and class weights

use crate::data::{cell, Row, RowSet, Value};
use crate::error::{Result, TabTextError};
use ndarray::{s, Array2, ArrayView1, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::config::{ClassWeightMode, FitScope, PrepareConfig, TaskMode};
use super::tabular::TabularEncoder;
use super::text::{TextEncoder, Vocabulary};
use super::{ColumnKind, Schema};

/// Largest distinct-value count for which `TaskMode::Auto` picks classification
pub const AUTO_CLASSIFICATION_MAX_UNIQUE: usize = 20;

/// Mapping from target value to class index, in first-seen order.
///
/// Serialized as the plain label list; the lookup index is rebuilt on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct LabelMap {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl From<Vec<String>> for LabelMap {
    fn from(labels: Vec<String>) -> Self {
        let index = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self { labels, index }
    }
}

impl From<LabelMap> for Vec<String> {
    fn from(map: LabelMap) -> Self {
        map.labels
    }
}

impl LabelMap {
    /// Build from the target column of every row
    pub fn fit<'a>(rows: impl IntoIterator<Item = &'a Row>, target: &str) -> Self {
        let mut map = Self::default();
        for row in rows {
            let key = cell(row, target).label_key();
            if !map.index.contains_key(&key) {
                map.index.insert(key.clone(), map.labels.len());
                map.labels.push(key);
            }
        }
        map
    }

    pub fn n_classes(&self) -> usize {
        self.labels.len()
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Label for a class index
    pub fn decode(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels.iter().enumerate().map(|(i, l)| (l.as_str(), i))
    }
}

/// Prepared train/test matrices plus the artifacts that produced them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedDataset {
    pub x_train: Array2<f64>,
    pub y_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_test: Array2<f64>,
    pub is_classification: bool,
    /// 0 for regression
    pub n_classes: usize,
    pub label_map: Option<LabelMap>,
    pub input_dim: usize,
    pub class_weights: Option<Vec<f64>>,
    pub encoder: TabularEncoder,
    pub text_col: Option<String>,
    pub vocabulary: Option<Arc<Vocabulary>>,
}

/// Decoded prediction for one test row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedPrediction {
    pub truth: String,
    pub predicted: String,
    /// Score of the predicted class; `None` for regression
    pub confidence: Option<f64>,
}

impl PreparedDataset {
    pub fn train_rows(&self) -> usize {
        self.x_train.nrows()
    }

    pub fn test_rows(&self) -> usize {
        self.x_test.nrows()
    }

    /// Width of the label matrices
    pub fn output_dim(&self) -> usize {
        if self.is_classification {
            self.n_classes
        } else {
            1
        }
    }

    /// Encode a new row with the fitted artifacts
    pub fn encode_row(&self, row: &Row) -> Vec<f64> {
        let mut x = vec![0.0; self.input_dim];
        let tabular_dim = self.encoder.dim();
        self.encoder.transform_into(row, &mut x[..tabular_dim]);
        if let (Some(column), Some(vocab)) = (&self.text_col, &self.vocabulary) {
            TextEncoder::new(vocab.clone()).transform_into(row, column, &mut x[tabular_dim..]);
        }
        x
    }

    /// Pair test labels with predictions, one row of `scores` per test row.
    ///
    /// Classification takes the argmax of each row (one column per class) and
    /// reports its score as the confidence. Regression expects a single column
    /// and pairs the raw values. Rows beyond `limit` are skipped.
    pub fn decode_predictions(&self, scores: &Array2<f64>, limit: usize) -> Result<Vec<DecodedPrediction>> {
        let width = self.output_dim();
        if scores.ncols() != width || scores.nrows() != self.test_rows() {
            return Err(TabTextError::ShapeError {
                expected: format!("({}, {})", self.test_rows(), width),
                actual: format!("({}, {})", scores.nrows(), scores.ncols()),
            });
        }

        let rows = scores
            .axis_iter(Axis(0))
            .zip(self.y_test.axis_iter(Axis(0)))
            .take(limit);

        let decoded: Vec<DecodedPrediction> = match &self.label_map {
            Some(label_map) => rows
                .map(|(p, y)| {
                    let (pred, confidence) = argmax(p);
                    let (truth, _) = argmax(y);
                    DecodedPrediction {
                        truth: label_map.decode(truth).unwrap_or_default().to_string(),
                        predicted: label_map.decode(pred).unwrap_or_default().to_string(),
                        confidence: Some(confidence),
                    }
                })
                .collect(),
            None => rows
                .map(|(p, y)| DecodedPrediction {
                    truth: Value::Number(y[0]).label_key(),
                    predicted: Value::Number(p[0]).label_key(),
                    confidence: None,
                })
                .collect(),
        };

        Ok(decoded)
    }
}

fn argmax(row: ArrayView1<f64>) -> (usize, f64) {
    row.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
}

/// Decide whether a target is treated as classification
pub fn is_classification(task: TaskMode, schema: &Schema, target: &str) -> Result<bool> {
    let column = schema
        .get(target)
        .ok_or_else(|| TabTextError::InvalidColumn(target.to_string()))?;

    Ok(match task {
        TaskMode::Classification => true,
        TaskMode::Regression => false,
        TaskMode::Auto => {
            column.kind != ColumnKind::Numeric
                && column.unique_count <= AUTO_CLASSIFICATION_MAX_UNIQUE
        }
    })
}

/// Per-class weights `max(count) / count[i]`, 1 for classes with no rows
pub fn compute_class_weights(labels: &Array2<f64>) -> Vec<f64> {
    let counts: Vec<usize> = labels
        .axis_iter(Axis(1))
        .map(|col| col.iter().filter(|&&v| v == 1.0).count())
        .collect();
    let max = counts.iter().copied().max().unwrap_or(0);

    counts
        .iter()
        .map(|&c| if c > 0 { max as f64 / c as f64 } else { 1.0 })
        .collect()
}

/// Orchestrates one preparation run
#[derive(Debug, Clone)]
pub struct DatasetPreparer {
    config: PrepareConfig,
}

impl DatasetPreparer {
    pub fn new(config: PrepareConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PrepareConfig {
        &self.config
    }

    /// Run the full pipeline over `rows`.
    ///
    /// Fails before doing any work when the row set is empty or a referenced
    /// column is missing from the schema. Truncated categories or vocabulary
    /// and unseen values are not errors.
    pub fn prepare(&self, rows: &RowSet, schema: &Schema) -> Result<PreparedDataset> {
        let start = Instant::now();
        let config = &self.config;

        if rows.is_empty() || schema.is_empty() {
            return Err(TabTextError::InvalidSchema("row set is empty".to_string()));
        }
        let is_classification = is_classification(config.task, schema, &config.target_col)?;

        let feature_cols = config.resolve_feature_cols(schema);
        if let Some(missing) = feature_cols.iter().find(|c| !schema.contains(c)) {
            return Err(TabTextError::InvalidColumn(missing.clone()));
        }
        if let Some(text_col) = &config.text_col {
            if !schema.contains(text_col) {
                return Err(TabTextError::InvalidColumn(text_col.clone()));
            }
        }

        let label_map = is_classification.then(|| LabelMap::fit(rows, &config.target_col));
        let n_classes = label_map.as_ref().map_or(0, LabelMap::n_classes);

        let text_col = config
            .text_col
            .as_ref()
            .filter(|c| {
                let is_text = schema.kind(c) == Some(ColumnKind::Text);
                if !is_text {
                    warn!(column = %c, "Text column is not free text; ignoring it");
                }
                is_text
            })
            .cloned();
        let vocabulary = text_col
            .as_ref()
            .map(|c| Arc::new(Vocabulary::build(rows, c, config.vocab_size())));

        let mut shuffled: Vec<&Row> = rows.iter().collect();
        let mut rng = match config.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        shuffled.shuffle(&mut rng);

        let n = shuffled.len();
        let split = (n as f64 * config.split_pct()).floor() as usize;

        let tabular_cols: Vec<String> = feature_cols
            .into_iter()
            .filter(|c| config.text_col.as_deref() != Some(c.as_str()))
            .collect();
        // all-rows fitting walks the input order so category order is first-seen
        let encoder = match config.fit_scope {
            FitScope::AllRows => TabularEncoder::fit(rows.iter(), &tabular_cols, schema)?,
            FitScope::TrainOnly => {
                TabularEncoder::fit(shuffled[..split].iter().copied(), &tabular_cols, schema)?
            }
        };
        let text_encoder = vocabulary.clone().map(TextEncoder::new);

        let tabular_dim = encoder.dim();
        let input_dim = tabular_dim + text_encoder.as_ref().map_or(0, TextEncoder::dim);
        let output_dim = if is_classification { n_classes } else { 1 };

        let mut x = Array2::<f64>::zeros((n, input_dim));
        let mut y = Array2::<f64>::zeros((n, output_dim));

        for (i, row) in shuffled.iter().enumerate() {
            let mut x_row = x.row_mut(i);
            let x_slice = x_row
                .as_slice_mut()
                .ok_or_else(|| TabTextError::DataError("feature matrix is not contiguous".to_string()))?;
            encoder.transform_into(row, &mut x_slice[..tabular_dim]);
            if let (Some(te), Some(column)) = (&text_encoder, &text_col) {
                te.transform_into(row, column, &mut x_slice[tabular_dim..]);
            }

            let target = cell(row, &config.target_col);
            match &label_map {
                Some(map) => {
                    if let Some(class) = map.index_of(&target.label_key()) {
                        y[[i, class]] = 1.0;
                    }
                }
                None => y[[i, 0]] = target.as_finite().unwrap_or(0.0),
            }
        }

        let x_train = x.slice(s![..split, ..]).to_owned();
        let x_test = x.slice(s![split.., ..]).to_owned();
        let y_train = y.slice(s![..split, ..]).to_owned();
        let y_test = y.slice(s![split.., ..]).to_owned();

        let class_weights = (is_classification && config.class_weight_mode == ClassWeightMode::Auto)
            .then(|| compute_class_weights(&y_train));

        info!(
            rows = n,
            train = x_train.nrows(),
            test = x_test.nrows(),
            input_dim,
            n_classes,
            is_classification,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Dataset prepared"
        );

        Ok(PreparedDataset {
            x_train,
            y_train,
            x_test,
            y_test,
            is_classification,
            n_classes,
            label_map,
            input_dim,
            class_weights,
            encoder,
            text_col,
            vocabulary,
        })
    }
}
