//! Feature encoding and dataset preparation
//!
//! Provides the pipeline that turns raw rows into model-ready matrices:
//! - Schema inference (numeric / categorical / text)
//! - Tokenization and bag-of-words vocabularies
//! - Min-max scaling and one-hot encoding
//! - Label mapping, shuffling, train/test split and class weights

mod config;
mod dataset;
mod schema;
mod tabular;
pub mod text;

pub use config::{ClassWeightMode, FitScope, PrepareConfig, TaskMode, MAX_SPLIT_PCT, MIN_SPLIT_PCT};
pub use dataset::{
    compute_class_weights, is_classification, DatasetPreparer, DecodedPrediction, LabelMap,
    PreparedDataset, AUTO_CLASSIFICATION_MAX_UNIQUE,
};
pub use schema::{infer_schema, ColumnSchema, KindCounts, Schema, SCHEMA_SAMPLE_SIZE};
pub use tabular::{ColumnEncoding, EncodedColumn, MinMax, TabularEncoder, MAX_CATEGORIES, RANGE_EPSILON};
pub use text::{tokenize, TextEncoder, Tokens, Vocabulary};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Inferred kind of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Text,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
            ColumnKind::Text => write!(f, "text"),
        }
    }
}
