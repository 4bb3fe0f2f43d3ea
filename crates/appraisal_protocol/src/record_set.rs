//! Record sets: the tabular unit passed between loader, transformer, model and writer.

use crate::types::{DataType, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised while building or reshaping a record set.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecordSetError {
    #[error("Row {row} has {found} values, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Column '{column}' has {found} values, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Expected a JSON object")]
    NotAnObject,
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered rows sharing one column set.
///
/// Every non-null value conforms to its field's type: `Float64` columns hold
/// only floats, `String` columns only text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordSet {
    fields: Vec<Field>,
    rows: Vec<Vec<Value>>,
}

impl RecordSet {
    /// Build a record set from column names and rows, inferring each column's type.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, RecordSetError> {
        check_unique(&names)?;
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != names.len() {
                return Err(RecordSetError::Ragged {
                    row: idx,
                    expected: names.len(),
                    found: row.len(),
                });
            }
        }

        let fields = names
            .into_iter()
            .enumerate()
            .map(|(col, name)| {
                let data_type = DataType::infer(rows.iter().map(|row| &row[col]));
                Field::new(name, data_type)
            })
            .collect::<Vec<_>>();

        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(fields.iter())
                    .map(|(value, field)| value.coerce(field.data_type))
                    .collect()
            })
            .collect();

        Ok(Self { fields, rows })
    }

    /// Build a one-row record set from a JSON object, keys in document order.
    pub fn from_json_object(value: &serde_json::Value) -> Result<Self, RecordSetError> {
        let object = value.as_object().ok_or(RecordSetError::NotAnObject)?;
        let names = object.keys().cloned().collect();
        let row = object.values().map(Value::from_json).collect();
        Self::from_rows(names, vec![row])
    }

    /// An empty record set with the given columns.
    pub fn with_fields(fields: Vec<Field>) -> Self {
        Self {
            fields,
            rows: Vec::new(),
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Position of a column, matched case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.column_index(name).map(|idx| &self.fields[idx])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.fields.len()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<&[Value]> {
        self.rows.get(idx).map(|r| r.as_slice())
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// All values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let col = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[col]).collect())
    }

    /// Keep only rows for which `keep` returns true.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Value]) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    /// Remove a column, returning its field if it existed.
    pub fn drop_column(&mut self, name: &str) -> Option<Field> {
        let col = self.column_index(name)?;
        for row in &mut self.rows {
            row.remove(col);
        }
        Some(self.fields.remove(col))
    }

    /// A copy without the named column (unchanged if it is absent).
    pub fn without_column(&self, name: &str) -> RecordSet {
        let mut copy = self.clone();
        copy.drop_column(name);
        copy
    }

    /// Append a column. Values are coerced to the field type.
    pub fn push_column(&mut self, field: Field, values: Vec<Value>) -> Result<(), RecordSetError> {
        if self.column_index(&field.name).is_some() {
            return Err(RecordSetError::DuplicateColumn(field.name));
        }
        if values.len() != self.rows.len() {
            return Err(RecordSetError::ColumnLength {
                column: field.name,
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value.coerce(field.data_type));
        }
        self.fields.push(field);
        Ok(())
    }

    /// Lower-case every column name.
    pub fn lowercase_columns(&mut self) -> Result<(), RecordSetError> {
        let lowered: Vec<String> = self.fields.iter().map(|f| f.name.to_lowercase()).collect();
        check_unique(&lowered)?;
        for (field, name) in self.fields.iter_mut().zip(lowered) {
            field.name = name;
        }
        Ok(())
    }

    /// Re-derive the type of every text column from the values it still holds.
    ///
    /// A column that was text only because of values since filtered out (such
    /// as a sentinel) narrows to its real type.
    pub fn reinfer_types(&mut self) {
        for col in 0..self.fields.len() {
            if self.fields[col].data_type != DataType::String {
                continue;
            }
            let parsed: Vec<Value> = self
                .rows
                .iter()
                .map(|row| match &row[col] {
                    Value::Text(s) => Value::parse_typed(s),
                    other => other.clone(),
                })
                .collect();
            let narrowed = DataType::infer(&parsed);
            if narrowed == DataType::String {
                continue;
            }
            for (row, value) in self.rows.iter_mut().zip(parsed) {
                row[col] = value.coerce(narrowed);
            }
            self.fields[col].data_type = narrowed;
        }
    }

    pub fn into_parts(self) -> (Vec<Field>, Vec<Vec<Value>>) {
        (self.fields, self.rows)
    }
}

fn check_unique(names: &[String]) -> Result<(), RecordSetError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.to_lowercase()) {
            return Err(RecordSetError::DuplicateColumn(name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_rows_infers_and_coerces() {
        let rs = RecordSet::from_rows(
            names(&["rooms", "income", "label"]),
            vec![
                vec![Value::Int(1), Value::Int(3), Value::from("a")],
                vec![Value::Int(2), Value::Float(4.5), Value::Null],
            ],
        )
        .unwrap();

        assert_eq!(rs.fields()[0].data_type, DataType::Int64);
        assert_eq!(rs.fields()[1].data_type, DataType::Float64);
        assert_eq!(rs.fields()[2].data_type, DataType::String);
        assert_eq!(rs.value(0, "income"), Some(&Value::Float(3.0)));
        assert_eq!(rs.value(1, "LABEL"), Some(&Value::Null));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = RecordSet::from_rows(names(&["a", "b"]), vec![vec![Value::Int(1)]]).unwrap_err();
        assert_eq!(
            err,
            RecordSetError::Ragged {
                row: 0,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_duplicate_columns_rejected_case_insensitively() {
        let err = RecordSet::from_rows(names(&["Pop", "POP"]), vec![]).unwrap_err();
        assert!(matches!(err, RecordSetError::DuplicateColumn(_)));
    }

    #[test]
    fn test_from_json_object() {
        let json = serde_json::json!({"LONGITUDE": -122.1, "ROOMS": 1000, "AGENCY": true});
        let rs = RecordSet::from_json_object(&json).unwrap();
        assert_eq!(rs.len(), 1);
        assert_eq!(rs.width(), 3);
        assert_eq!(rs.field("agency").unwrap().data_type, DataType::Boolean);

        assert_eq!(
            RecordSet::from_json_object(&serde_json::json!([1, 2])).unwrap_err(),
            RecordSetError::NotAnObject
        );
    }

    #[test]
    fn test_reinfer_narrows_text_column() {
        let mut rs = RecordSet::from_rows(
            names(&["agency"]),
            vec![vec![Value::Boolean(true)], vec![Value::from("Null")]],
        )
        .unwrap();
        assert_eq!(rs.fields()[0].data_type, DataType::String);

        rs.retain_rows(|row| !row[0].is_sentinel_null());
        rs.reinfer_types();

        assert_eq!(rs.fields()[0].data_type, DataType::Boolean);
        assert_eq!(rs.rows()[0][0], Value::Boolean(true));
    }

    #[test]
    fn test_drop_and_push_column() {
        let mut rs = RecordSet::from_rows(
            names(&["a", "b"]),
            vec![vec![Value::Int(1), Value::from("x")]],
        )
        .unwrap();
        assert!(rs.drop_column("B").is_some());
        assert_eq!(rs.column_names(), vec!["a"]);

        rs.push_column(Field::new("flag", DataType::Boolean), vec![Value::Boolean(false)])
            .unwrap();
        assert_eq!(rs.value(0, "flag"), Some(&Value::Boolean(false)));

        let err = rs
            .push_column(Field::new("c", DataType::Int64), vec![])
            .unwrap_err();
        assert!(matches!(err, RecordSetError::ColumnLength { .. }));
    }
}
