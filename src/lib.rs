//! tabtext - Feature encoding and dataset preparation for small neural networks
//!
//! Turns a loaded table (numbers, categories and free text) into fixed-width
//! numeric train/test matrices:
//! - [`data`] - Cell values, rows and row sets
//! - [`preprocessing`] - Schema inference, tokenization, vocabularies,
//!   min-max / one-hot / bag-of-words encoding and dataset preparation
//! - [`session`] - Pipeline state with a single-flight guard
//! - [`utils`] - CSV and JSON loading
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```
//! use tabtext::data::{RowSet, Value};
//! use tabtext::preprocessing::{infer_schema, DatasetPreparer, PrepareConfig};
//!
//! let rows = RowSet::from_records(vec![
//!     vec![("color", Value::from("red")), ("score", Value::from(5.0))],
//!     vec![("color", Value::from("blue")), ("score", Value::from(3.0))],
//!     vec![("color", Value::from("red")), ("score", Value::from(9.0))],
//! ]);
//! let schema = infer_schema(&rows);
//! let prepared = DatasetPreparer::new(PrepareConfig::new("score").with_random_state(1))
//!     .prepare(&rows, &schema)
//!     .unwrap();
//! assert_eq!(prepared.input_dim, 2);
//! assert!(!prepared.is_classification);
//! ```

pub mod error;

pub mod data;
pub mod preprocessing;
pub mod session;
pub mod utils;

pub mod cli;

pub use error::{Result, TabTextError};

/// Prelude for common imports
pub mod prelude {
    pub use crate::data::{Row, RowSet, Value};
    pub use crate::error::{Result, TabTextError};
    pub use crate::preprocessing::{
        infer_schema, ClassWeightMode, ColumnKind, DatasetPreparer, FitScope, LabelMap,
        PrepareConfig, PreparedDataset, Schema, TabularEncoder, TaskMode, TextEncoder, Vocabulary,
    };
    pub use crate::session::PipelineSession;
}
