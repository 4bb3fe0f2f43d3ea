//! Required-field and null checks on ingested records.

use crate::error::{PipelineError, Result};
use appraisal_protocol::RecordSet;
use tracing::{error, warn};

/// Checks that every required field is present.
#[derive(Debug, Clone)]
pub struct Validator {
    required: Vec<String>,
}

impl Validator {
    pub fn new(required: Vec<String>) -> Self {
        Self { required }
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Required fields absent from `columns`, in configured order and spelling.
    pub fn missing_fields<'a>(&self, columns: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let present: Vec<String> = columns.into_iter().map(str::to_lowercase).collect();
        self.required
            .iter()
            .filter(|field| !present.contains(&field.to_lowercase()))
            .cloned()
            .collect()
    }

    /// Fail on missing required fields; warn once per column holding nulls.
    ///
    /// Nulls are not an error here: the transformer drops those rows.
    pub fn validate(&self, records: &RecordSet) -> Result<()> {
        let missing = self.missing_fields(records.column_names());
        if !missing.is_empty() {
            error!(missing = ?missing, "Validation failed");
            return Err(PipelineError::SchemaViolation(missing));
        }

        for (col, field) in records.fields().iter().enumerate() {
            let nulls = records.rows().iter().filter(|row| row[col].is_null()).count();
            if nulls > 0 {
                warn!(column = %field.name, nulls, "Found null values in column");
            }
        }
        Ok(())
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(crate::config::default_required_columns())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appraisal_protocol::Value;

    fn records(names: &[&str], row: Vec<Value>) -> RecordSet {
        RecordSet::from_rows(names.iter().map(|s| s.to_string()).collect(), vec![row]).unwrap()
    }

    #[test]
    fn test_missing_fields_named_exactly() {
        let validator = Validator::new(vec!["ROOMS".into(), "MEDIAN_INCOME".into(), "AGENCY".into()]);
        let rs = records(&["rooms", "agency"], vec![Value::Int(3), Value::Boolean(true)]);

        match validator.validate(&rs) {
            Err(PipelineError::SchemaViolation(missing)) => {
                assert_eq!(missing, vec!["MEDIAN_INCOME".to_string()])
            }
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let validator = Validator::new(vec!["Rooms".into()]);
        let rs = records(&["ROOMS"], vec![Value::Int(3)]);
        assert!(validator.validate(&rs).is_ok());
    }

    #[test]
    fn test_nulls_pass_validation() {
        let validator = Validator::new(vec!["rooms".into()]);
        let rs = records(&["rooms"], vec![Value::Null]);
        assert!(validator.validate(&rs).is_ok());
    }

    #[test]
    fn test_default_requires_full_field_set() {
        let validator = Validator::default();
        let missing = validator.missing_fields(["longitude", "latitude"]);
        assert_eq!(missing.len(), 9);
        assert_eq!(missing[0], "MEDIAN_AGE");
    }
}
