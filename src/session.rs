//! Pipeline session: explicit run state with a single-flight guard
//!
//! A session owns the loaded rows, their schema and the last prepared
//! dataset. Every stage takes its inputs from the session explicitly. Only one
//! load or prepare may run at a time; a second caller gets
//! [`TabTextError::SessionBusy`] instead of interleaving with the first.

use crate::data::RowSet;
use crate::error::{Result, TabTextError};
use crate::preprocessing::{infer_schema, DatasetPreparer, PrepareConfig, PreparedDataset, Schema};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Coarse session progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Empty,
    Loaded,
    Prepared,
}

#[derive(Debug, Default)]
struct SessionState {
    rows: Option<Arc<RowSet>>,
    schema: Option<Arc<Schema>>,
    prepared: Option<Arc<PreparedDataset>>,
}

/// Holds the state of one interactive pipeline run
#[derive(Debug, Default)]
pub struct PipelineSession {
    state: Mutex<SessionState>,
}

impl PipelineSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the dataset and infer its schema. Drops any prepared dataset.
    pub fn load(&self, rows: RowSet) -> Result<Arc<Schema>> {
        let mut state = self.state.try_lock().ok_or(TabTextError::SessionBusy)?;

        let schema = Arc::new(infer_schema(&rows));
        let counts = schema.kind_counts();
        info!(
            rows = rows.len(),
            columns = schema.len(),
            numeric = counts.numeric,
            categorical = counts.categorical,
            text = counts.text,
            "Dataset loaded"
        );

        state.rows = Some(Arc::new(rows));
        state.schema = Some(schema.clone());
        state.prepared = None;
        Ok(schema)
    }

    /// Prepare the loaded dataset. The previous prepared dataset is replaced
    /// only when this call succeeds.
    pub fn prepare(&self, config: PrepareConfig) -> Result<Arc<PreparedDataset>> {
        let mut state = self.state.try_lock().ok_or(TabTextError::SessionBusy)?;

        let (rows, schema) = match (&state.rows, &state.schema) {
            (Some(rows), Some(schema)) => (rows.clone(), schema.clone()),
            _ => return Err(TabTextError::NotLoaded),
        };

        let prepared = Arc::new(DatasetPreparer::new(config).prepare(&rows, &schema)?);
        state.prepared = Some(prepared.clone());
        Ok(prepared)
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.state.lock();
        match (&state.rows, &state.prepared) {
            (None, _) => SessionStatus::Empty,
            (Some(_), None) => SessionStatus::Loaded,
            (Some(_), Some(_)) => SessionStatus::Prepared,
        }
    }

    pub fn rows(&self) -> Option<Arc<RowSet>> {
        self.state.lock().rows.clone()
    }

    pub fn schema(&self) -> Option<Arc<Schema>> {
        self.state.lock().schema.clone()
    }

    pub fn prepared(&self) -> Option<Arc<PreparedDataset>> {
        self.state.lock().prepared.clone()
    }
}
