//! Pipeline orchestrator.
//!
//! One run: assign a batch id, load, validate and transform, predict, then
//! persist raw, transformed and prediction rows in one transaction. There are
//! no retries; any failure is logged with the state it happened in and
//! returned to the caller.

use crate::config::AppConfig;
use crate::error::{PipelineError, Result};
use crate::loader::{load_csv, load_csv_reader};
use crate::model::{self, load_model, PriceModel};
use crate::transform::Transformer;
use crate::validate::Validator;
use appraisal_db::{initialize_database, BatchRecords, BatchWriter, Store, StoreConfig};
use appraisal_protocol::{BatchId, BatchIdGenerator, RecordSet};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};

/// Summary of one batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub batch_id: BatchId,
    pub raw_rows: usize,
    pub transformed_rows: usize,
    pub predictions: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Result of the single-record path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinglePrediction {
    pub prediction: f64,
    pub batch_id: BatchId,
    pub timestamp: DateTime<Utc>,
}

/// Drives load, transform, predict and persist for one batch at a time.
pub struct Pipeline {
    config: AppConfig,
    transformer: Transformer,
    writer: BatchWriter,
    model: Arc<dyn PriceModel>,
    batch_ids: BatchIdGenerator,
}

impl Pipeline {
    pub fn new(config: AppConfig, store: Store, model: Arc<dyn PriceModel>) -> Self {
        let transformer = Transformer::new(Validator::new(config.required_columns.clone()))
            .with_vocabulary(&config.categories);
        Self {
            config,
            transformer,
            writer: BatchWriter::new(store),
            model,
            batch_ids: BatchIdGenerator::new(),
        }
    }

    /// Open the configured store and load the configured model.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let store = Store::new(
            StoreConfig::new(&config.db_path).with_busy_timeout(config.busy_timeout()),
        )?;
        let model = load_model(&config.model_file)?;
        Ok(Self::new(config, store, Arc::new(model)))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn writer(&self) -> &BatchWriter {
        &self.writer
    }

    /// Create the fixed-schema tables ahead of the first batch.
    pub async fn initialize(&self) -> Result<()> {
        initialize_database(self.writer.store(), None).await?;
        Ok(())
    }

    /// Run the configured input file.
    pub async fn run(&self) -> Result<BatchOutcome> {
        self.run_file(&self.config.input_file).await
    }

    pub async fn run_file(&self, path: &Path) -> Result<BatchOutcome> {
        let batch_id = self.batch_ids.next();
        let started_at = Utc::now();
        async {
            let raw = load_csv(path).inspect_err(|e| log_failure("load", e))?;
            self.execute(batch_id, started_at, raw).await
        }
        .instrument(info_span!("batch", batch_id = %batch_id))
        .await
    }

    /// Run a batch from CSV text.
    pub async fn run_csv(&self, bytes: &[u8]) -> Result<BatchOutcome> {
        let batch_id = self.batch_ids.next();
        let started_at = Utc::now();
        async {
            let raw = load_csv_reader(bytes).inspect_err(|e| log_failure("load", e))?;
            self.execute(batch_id, started_at, raw).await
        }
        .instrument(info_span!("batch", batch_id = %batch_id))
        .await
    }

    /// Run a batch from an already loaded record set.
    pub async fn run_records(&self, raw: RecordSet) -> Result<BatchOutcome> {
        let batch_id = self.batch_ids.next();
        let started_at = Utc::now();
        self.execute(batch_id, started_at, raw)
            .instrument(info_span!("batch", batch_id = %batch_id))
            .await
    }

    /// Price one JSON object. The record still lands in all three tables
    /// under its own batch id.
    pub async fn predict_single(&self, body: &serde_json::Value) -> Result<SinglePrediction> {
        let batch_id = self.batch_ids.next();
        async {
            let raw = single_record(body).inspect_err(|e| log_failure("load", e))?;

            let (transformed, predictions) = self.transform_and_predict(&raw)?;
            let prediction = match predictions.first() {
                Some(p) => *p,
                None => {
                    let err = PipelineError::EmptyInput;
                    log_failure("transform", &err);
                    return Err(err);
                }
            };

            self.persist(batch_id, &raw, &transformed, &predictions).await?;
            info!(prediction, "Single prediction served");
            Ok(SinglePrediction {
                prediction,
                batch_id,
                timestamp: Utc::now(),
            })
        }
        .instrument(info_span!("batch", batch_id = %batch_id))
        .await
    }

    async fn execute(
        &self,
        batch_id: BatchId,
        started_at: DateTime<Utc>,
        raw: RecordSet,
    ) -> Result<BatchOutcome> {
        info!(rows = raw.len(), "Batch started");
        let (transformed, predictions) = self.transform_and_predict(&raw)?;
        self.persist(batch_id, &raw, &transformed, &predictions).await?;

        let outcome = BatchOutcome {
            batch_id,
            raw_rows: raw.len(),
            transformed_rows: transformed.len(),
            predictions: predictions.len(),
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            raw = outcome.raw_rows,
            transformed = outcome.transformed_rows,
            predictions = outcome.predictions,
            "Pipeline executed successfully"
        );
        Ok(outcome)
    }

    fn transform_and_predict(&self, raw: &RecordSet) -> Result<(RecordSet, Vec<f64>)> {
        let transformed = self
            .transformer
            .transform(raw)
            .inspect_err(|e| log_failure("transform", e))?;

        let features = transformed.without_column(&self.config.target_column);
        let predictions = model::predict(self.model.as_ref(), &features)
            .map_err(PipelineError::from)
            .inspect_err(|e| log_failure("predict", e))?;
        Ok((transformed, predictions))
    }

    async fn persist(
        &self,
        batch_id: BatchId,
        raw: &RecordSet,
        transformed: &RecordSet,
        predictions: &[f64],
    ) -> Result<()> {
        self.writer
            .persist_batch(
                BatchRecords {
                    raw,
                    transformed,
                    predictions,
                },
                batch_id,
            )
            .await
            .map_err(PipelineError::from)
            .inspect_err(|e| log_failure("persist", e))?;
        Ok(())
    }
}

/// One-row record set from a JSON object, values kept as received.
fn single_record(body: &serde_json::Value) -> Result<RecordSet> {
    let mut record = RecordSet::from_json_object(body)?;
    record.lowercase_columns()?;
    Ok(record)
}

fn log_failure(state: &'static str, err: &PipelineError) {
    error!(state, "Pipeline failed: {}", err);
}
