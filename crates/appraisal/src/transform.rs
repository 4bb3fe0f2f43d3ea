//! Cleaning and categorical encoding of validated records.
//!
//! Output columns: every non-text input column in its original position,
//! followed by one boolean indicator column per category of every text
//! column, named `<column>_<category>`.

use crate::error::{PipelineError, Result};
use crate::validate::Validator;
use appraisal_protocol::{DataType, Field, RecordSet, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error};

/// Produces model-ready record sets from raw input.
#[derive(Debug, Clone, Default)]
pub struct Transformer {
    validator: Validator,
    /// Fixed categories per column, keyed by lower-cased column name
    vocabulary: BTreeMap<String, Vec<String>>,
}

impl Transformer {
    pub fn new(validator: Validator) -> Self {
        Self {
            validator,
            vocabulary: BTreeMap::new(),
        }
    }

    /// Use a fixed category list for the given columns.
    ///
    /// Such columns always expand into the same indicator columns, and a value
    /// outside the list is rejected instead of adding a column.
    pub fn with_vocabulary(mut self, vocabulary: &BTreeMap<String, Vec<String>>) -> Self {
        self.vocabulary = vocabulary
            .iter()
            .map(|(column, categories)| {
                let mut categories = categories.clone();
                categories.sort();
                categories.dedup();
                (column.to_lowercase(), categories)
            })
            .collect();
        self
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Validate, drop null and sentinel rows, then one-hot encode text columns.
    pub fn transform(&self, records: &RecordSet) -> Result<RecordSet> {
        self.validator.validate(records)?;

        let mut out = records.clone();
        let before = out.len();
        out.retain_rows(|row| !row.iter().any(Value::is_null));
        let after_nulls = out.len();
        out.retain_rows(|row| !row.iter().any(Value::is_sentinel_null));
        debug!(
            null_rows = before - after_nulls,
            sentinel_rows = after_nulls - out.len(),
            remaining = out.len(),
            "Dropped incomplete rows"
        );

        // Columns that were text only because of dropped values get their real type back.
        out.reinfer_types();

        let categorical: Vec<Field> = out
            .fields()
            .iter()
            .filter(|f| f.data_type == DataType::String)
            .cloned()
            .collect();

        let mut indicators = Vec::new();
        for field in &categorical {
            let values: Vec<String> = out
                .column(&field.name)
                .unwrap_or_default()
                .into_iter()
                .map(|v| v.to_string())
                .collect();
            let categories = self.categories_for(&field.name, &values)?;
            for category in categories {
                let column: Vec<Value> = values
                    .iter()
                    .map(|v| Value::Boolean(*v == category))
                    .collect();
                indicators.push((
                    Field::new(format!("{}_{}", field.name, category), DataType::Boolean),
                    column,
                ));
            }
            out.drop_column(&field.name);
        }

        for (field, values) in indicators {
            out.push_column(field, values)?;
        }
        Ok(out)
    }

    fn categories_for(&self, column: &str, values: &[String]) -> Result<Vec<String>> {
        match self.vocabulary.get(&column.to_lowercase()) {
            Some(vocabulary) => {
                if let Some(unknown) = values.iter().find(|v| !vocabulary.contains(v)) {
                    error!(column, category = %unknown, "Category outside vocabulary");
                    return Err(PipelineError::UnknownCategory {
                        column: column.to_string(),
                        category: unknown.clone(),
                    });
                }
                Ok(vocabulary.clone())
            }
            None => Ok(values
                .iter()
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()),
        }
    }
}
