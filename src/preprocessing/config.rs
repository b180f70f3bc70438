//! Dataset preparation configuration

use serde::{Deserialize, Serialize};

use super::text::{clamp_vocab_size, DEFAULT_VOCAB_SIZE};
use super::Schema;

/// Smallest allowed train share
pub const MIN_SPLIT_PCT: f64 = 0.5;
/// Largest allowed train share
pub const MAX_SPLIT_PCT: f64 = 0.95;

/// How to pick between classification and regression
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskMode {
    /// Classification for non-numeric targets with at most 20 distinct values
    #[default]
    Auto,
    Classification,
    Regression,
}

/// Class weight computation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassWeightMode {
    #[default]
    Off,
    /// `max(count) / count[i]` over the training partition
    Auto,
}

/// Which rows the tabular encoder is fitted on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitScope {
    /// Every row, test partition included
    #[default]
    AllRows,
    /// Only the training partition
    TrainOnly,
}

/// Configuration for [`DatasetPreparer`](super::DatasetPreparer)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    /// Column to predict
    pub target_col: String,

    /// Feature columns. When empty, every schema column except the target
    /// and `excluded_cols` is used.
    pub feature_cols: Vec<String>,

    /// Columns removed from the derived feature set
    pub excluded_cols: Vec<String>,

    pub task: TaskMode,

    /// Share of rows in the training partition, clamped to [0.5, 0.95]
    pub split_pct: f64,

    pub class_weight_mode: ClassWeightMode,

    /// Free-text column encoded as bag-of-words
    pub text_col: Option<String>,

    /// Requested vocabulary size, clamped to [100, 5000]
    pub vocab_size: usize,

    pub fit_scope: FitScope,

    /// Seed for the row shuffle; entropy when unset
    pub random_state: Option<u64>,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            target_col: String::new(),
            feature_cols: Vec::new(),
            excluded_cols: Vec::new(),
            task: TaskMode::Auto,
            split_pct: 0.8,
            class_weight_mode: ClassWeightMode::Off,
            text_col: None,
            vocab_size: DEFAULT_VOCAB_SIZE,
            fit_scope: FitScope::AllRows,
            random_state: None,
        }
    }
}

impl PrepareConfig {
    /// Create a configuration for the given target column
    pub fn new(target_col: impl Into<String>) -> Self {
        Self {
            target_col: target_col.into(),
            ..Self::default()
        }
    }

    pub fn with_feature_cols<S: Into<String>>(mut self, cols: impl IntoIterator<Item = S>) -> Self {
        self.feature_cols = cols.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_excluded_cols<S: Into<String>>(mut self, cols: impl IntoIterator<Item = S>) -> Self {
        self.excluded_cols = cols.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_task(mut self, task: TaskMode) -> Self {
        self.task = task;
        self
    }

    pub fn with_split_pct(mut self, split_pct: f64) -> Self {
        self.split_pct = split_pct;
        self
    }

    pub fn with_class_weights(mut self, mode: ClassWeightMode) -> Self {
        self.class_weight_mode = mode;
        self
    }

    pub fn with_text_col(mut self, column: impl Into<String>) -> Self {
        self.text_col = Some(column.into());
        self
    }

    pub fn with_vocab_size(mut self, size: usize) -> Self {
        self.vocab_size = size;
        self
    }

    pub fn with_fit_scope(mut self, scope: FitScope) -> Self {
        self.fit_scope = scope;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Train share after clamping. NaN falls back to the default 0.8.
    pub fn split_pct(&self) -> f64 {
        if self.split_pct.is_nan() {
            0.8
        } else {
            self.split_pct.clamp(MIN_SPLIT_PCT, MAX_SPLIT_PCT)
        }
    }

    /// Vocabulary size after clamping
    pub fn vocab_size(&self) -> usize {
        clamp_vocab_size(self.vocab_size)
    }

    /// Feature columns to encode, with the target and excluded columns
    /// removed. The text column stays in the list; the preparer routes it
    /// to the text encoder.
    pub fn resolve_feature_cols(&self, schema: &Schema) -> Vec<String> {
        let keep = |c: &str| c != self.target_col && !self.excluded_cols.iter().any(|e| e == c);

        if self.feature_cols.is_empty() {
            schema
                .column_names()
                .filter(|c| keep(c))
                .map(str::to_string)
                .collect()
        } else {
            self.feature_cols
                .iter()
                .filter(|c| keep(c))
                .cloned()
                .collect()
        }
    }
}
