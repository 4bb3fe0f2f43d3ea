//! Price model boundary.
//!
//! The pipeline only needs `predict(features) -> one price per row`. The
//! bundled implementation is a linear model read from a JSON document:
//!
//! ```json
//! { "intercept": 12000.0, "coefficients": { "median_income": 41000.0, "ocean_proximity_INLAND": -60000.0 } }
//! ```

use appraisal_protocol::RecordSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read model file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Feature '{feature}' is not numeric in row {row}")]
    NonNumeric { feature: String, row: usize },

    #[error("Model returned {found} predictions for {expected} rows")]
    Shape { expected: usize, found: usize },
}

/// Anything that can price a feature record set.
pub trait PriceModel: Send + Sync {
    /// One prediction per row, in row order.
    fn predict(&self, features: &RecordSet) -> Result<Vec<f64>, ModelError>;
}

/// `intercept + sum(weight * feature)` over named features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    #[serde(default)]
    pub coefficients: BTreeMap<String, f64>,
}

impl LinearModel {
    pub fn new(intercept: f64, coefficients: BTreeMap<String, f64>) -> Self {
        Self {
            intercept,
            coefficients,
        }
    }
}

impl PriceModel for LinearModel {
    fn predict(&self, features: &RecordSet) -> Result<Vec<f64>, ModelError> {
        // Features the batch lacks are unobserved indicators and contribute 0.
        let terms: Vec<(usize, &str, f64)> = self
            .coefficients
            .iter()
            .filter_map(|(name, weight)| {
                features
                    .column_index(name)
                    .map(|col| (col, name.as_str(), *weight))
            })
            .collect();

        features
            .rows()
            .iter()
            .enumerate()
            .map(|(row_idx, row)| {
                terms.iter().try_fold(self.intercept, |acc, (col, name, weight)| {
                    let x = row[*col].as_f64().ok_or_else(|| ModelError::NonNumeric {
                        feature: name.to_string(),
                        row: row_idx,
                    })?;
                    Ok::<f64, ModelError>(acc + weight * x)
                })
            })
            .collect()
    }
}

/// Read a linear model document.
pub fn load_model(path: &Path) -> Result<LinearModel, ModelError> {
    let content = std::fs::read_to_string(path).map_err(|source| ModelError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let model: LinearModel = serde_json::from_str(&content)?;
    info!(
        path = %path.display(),
        features = model.coefficients.len(),
        "Model loaded"
    );
    Ok(model)
}

/// Run `model` and check it honored the one-prediction-per-row contract.
pub fn predict(model: &dyn PriceModel, features: &RecordSet) -> Result<Vec<f64>, ModelError> {
    let predictions = model.predict(features)?;
    if predictions.len() != features.len() {
        return Err(ModelError::Shape {
            expected: features.len(),
            found: predictions.len(),
        });
    }
    Ok(predictions)
}
