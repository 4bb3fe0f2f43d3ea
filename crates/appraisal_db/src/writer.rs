//! Batch writer: bulk-appends record sets to the three lineage tables.
//!
//! Every row carries the batch id of the run that produced it. Prediction rows
//! point at the transformed row they were computed from through
//! `input_data_id`.

use crate::connection::Store;
use crate::error::{DbError, Result};
use crate::schema::{
    ensure_table, is_managed_column, quote_ident, table_columns, ColumnDef, ColumnType,
    PREDICTIONS_TABLE, RAW_TABLE, TRANSFORMED_TABLE,
};
use appraisal_protocol::{BatchId, DataType, Field, RecordSet, Value};
use sqlx::query_builder::Separated;
use sqlx::sqlite::{Sqlite, SqliteConnection, SqliteRow};
use sqlx::{Connection, QueryBuilder, Row};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Upper bound on bound parameters per statement (SQLITE_MAX_VARIABLE_NUMBER).
const MAX_BIND_PARAMS: usize = 32_766;

/// The table a record set is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteTarget {
    Raw,
    Transformed,
    Predictions,
}

impl WriteTarget {
    pub fn table_name(&self) -> &'static str {
        match self {
            WriteTarget::Raw => RAW_TABLE,
            WriteTarget::Transformed => TRANSFORMED_TABLE,
            WriteTarget::Predictions => PREDICTIONS_TABLE,
        }
    }
}

impl std::fmt::Display for WriteTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table_name())
    }
}

impl FromStr for WriteTarget {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "raw" | "raw_data" => Ok(WriteTarget::Raw),
            "transformed" | "transformed_data" => Ok(WriteTarget::Transformed),
            "predictions" => Ok(WriteTarget::Predictions),
            _ => Err(DbError::unsupported_target(s)),
        }
    }
}

/// Column references needed to project a record set into prediction rows.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub predicted_price_column: Option<String>,
    pub input_data_id_column: Option<String>,
}

impl WriteOptions {
    pub fn predictions(
        predicted_price_column: impl Into<String>,
        input_data_id_column: impl Into<String>,
    ) -> Self {
        Self {
            predicted_price_column: Some(predicted_price_column.into()),
            input_data_id_column: Some(input_data_id_column.into()),
        }
    }
}

/// Result of a single-table write.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteSummary {
    pub table: &'static str,
    pub batch_id: BatchId,
    pub rows: usize,
    /// Ids assigned to the new rows, in insertion order
    pub row_ids: Vec<i64>,
}

/// The three record sets of one batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchRecords<'a> {
    pub raw: &'a RecordSet,
    pub transformed: &'a RecordSet,
    /// One value per transformed row, same order
    pub predictions: &'a [f64],
}

/// Result of an all-or-nothing batch write.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedBatch {
    pub batch_id: BatchId,
    pub raw_rows: usize,
    pub transformed_ids: Vec<i64>,
    pub prediction_rows: usize,
}

/// Writes record sets under a batch id, one connection per unit of work.
///
/// The column list of every table this writer has established is cached, so
/// only the first write of a table per process inspects the store.
#[derive(Debug)]
pub struct BatchWriter {
    store: Store,
    established: Mutex<HashMap<&'static str, Vec<ColumnDef>>>,
}

impl BatchWriter {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            established: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Append `records` to the table for `target` under `batch_id`.
    ///
    /// `Predictions` needs both column references in `options`; the written
    /// rows are the projection `(batch_id, input_data_id, predicted_price)`.
    pub async fn write(
        &self,
        records: &RecordSet,
        target: WriteTarget,
        batch_id: BatchId,
        options: &WriteOptions,
    ) -> Result<WriteSummary> {
        let projected;
        let records = match target {
            WriteTarget::Predictions => {
                projected = project_predictions(records, options)?;
                &projected
            }
            _ => records,
        };
        reject_managed(target.table_name(), records)?;

        // Zero rows carry no types, so they must not be the ones to define the table.
        if target == WriteTarget::Transformed && records.is_empty() {
            debug!(batch_id = %batch_id, "Empty transformed batch, nothing to write");
            return Ok(WriteSummary {
                table: target.table_name(),
                batch_id,
                rows: 0,
                row_ids: Vec::new(),
            });
        }

        let mut conn = self.store.acquire().await?;
        let outcome = self.write_in_transaction(&mut conn, records, target, batch_id).await;
        let summary = conn.release(outcome).await?;

        info!(
            table = summary.table,
            batch_id = %batch_id,
            rows = summary.rows,
            "Batch written"
        );
        Ok(summary)
    }

    /// Write raw, transformed and prediction rows of one batch in a single
    /// transaction. Any failure rolls back all three tables.
    pub async fn persist_batch(
        &self,
        batch: BatchRecords<'_>,
        batch_id: BatchId,
    ) -> Result<PersistedBatch> {
        if batch.predictions.len() != batch.transformed.len() {
            return Err(DbError::invalid_arguments(format!(
                "{} predictions for {} transformed rows",
                batch.predictions.len(),
                batch.transformed.len()
            )));
        }
        reject_managed(RAW_TABLE, batch.raw)?;
        reject_managed(TRANSFORMED_TABLE, batch.transformed)?;

        let mut conn = self.store.acquire().await?;
        let outcome = self.persist_in_transaction(&mut conn, batch, batch_id).await;
        let persisted = conn.release(outcome).await?;

        info!(
            batch_id = %batch_id,
            raw = persisted.raw_rows,
            transformed = persisted.transformed_ids.len(),
            predictions = persisted.prediction_rows,
            "Batch persisted"
        );
        Ok(persisted)
    }

    /// Read back every row of `table` written under `batch_id`, ordered by id.
    pub async fn fetch_batch(&self, table: &str, batch_id: BatchId) -> Result<RecordSet> {
        let mut conn = self.store.acquire().await?;
        let outcome = fetch_batch_rows(&mut conn, table, batch_id).await;
        conn.release(outcome).await
    }

    /// Number of rows of `table` written under `batch_id`.
    pub async fn count_batch_rows(&self, table: &str, batch_id: BatchId) -> Result<i64> {
        let mut conn = self.store.acquire().await?;
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE batch_id = ?",
            quote_ident(table)
        );
        let outcome = sqlx::query(&sql)
            .bind(batch_id.as_i64())
            .fetch_one(&mut *conn)
            .await
            .and_then(|row| row.try_get::<i64, _>(0))
            .map_err(DbError::from);
        conn.release(outcome).await
    }

    async fn write_in_transaction(
        &self,
        conn: &mut SqliteConnection,
        records: &RecordSet,
        target: WriteTarget,
        batch_id: BatchId,
    ) -> Result<WriteSummary> {
        let mut tx = conn.begin().await?;
        let mut pending = Vec::new();

        let written = async {
            let columns = self.establish(&mut tx, target, records, &mut pending).await?;
            check_compatible(target.table_name(), &columns, records)?;
            let records = match target {
                WriteTarget::Transformed => with_absent_indicators(&columns, records)?,
                _ => Cow::Borrowed(records),
            };
            let row_ids = insert_rows(&mut tx, target.table_name(), &records, batch_id).await?;
            Ok::<_, DbError>(row_ids)
        }
        .await;

        match written {
            Ok(row_ids) => {
                tx.commit().await?;
                self.remember(pending);
                Ok(WriteSummary {
                    table: target.table_name(),
                    batch_id,
                    rows: records.len(),
                    row_ids,
                })
            }
            Err(err) => {
                rollback(tx, batch_id, &err).await;
                Err(err)
            }
        }
    }

    async fn persist_in_transaction(
        &self,
        conn: &mut SqliteConnection,
        batch: BatchRecords<'_>,
        batch_id: BatchId,
    ) -> Result<PersistedBatch> {
        let mut tx = conn.begin().await?;
        let mut pending = Vec::new();

        let written = async {
            let columns = self
                .establish(&mut tx, WriteTarget::Raw, batch.raw, &mut pending)
                .await?;
            check_compatible(RAW_TABLE, &columns, batch.raw)?;
            insert_rows(&mut tx, RAW_TABLE, batch.raw, batch_id).await?;

            // An empty transformed set has no indicator columns to derive a
            // table from, so it must not be the one that creates it.
            if batch.transformed.is_empty() {
                return Ok::<_, DbError>(PersistedBatch {
                    batch_id,
                    raw_rows: batch.raw.len(),
                    transformed_ids: Vec::new(),
                    prediction_rows: 0,
                });
            }

            let columns = self
                .establish(&mut tx, WriteTarget::Transformed, batch.transformed, &mut pending)
                .await?;
            check_compatible(TRANSFORMED_TABLE, &columns, batch.transformed)?;
            let transformed = with_absent_indicators(&columns, batch.transformed)?;
            let transformed_ids =
                insert_rows(&mut tx, TRANSFORMED_TABLE, &transformed, batch_id).await?;

            let predictions = prediction_rows(&transformed_ids, batch.predictions)?;
            let columns = self
                .establish(&mut tx, WriteTarget::Predictions, &predictions, &mut pending)
                .await?;
            check_compatible(PREDICTIONS_TABLE, &columns, &predictions)?;
            insert_rows(&mut tx, PREDICTIONS_TABLE, &predictions, batch_id).await?;

            Ok::<_, DbError>(PersistedBatch {
                batch_id,
                raw_rows: batch.raw.len(),
                transformed_ids,
                prediction_rows: predictions.len(),
            })
        }
        .await;

        match written {
            Ok(persisted) => {
                tx.commit().await?;
                self.remember(pending);
                Ok(persisted)
            }
            Err(err) => {
                rollback(tx, batch_id, &err).await;
                Err(err)
            }
        }
    }

    /// Make sure the target table exists and return its columns.
    ///
    /// Newly inspected tables are queued in `pending` and only cached once the
    /// surrounding transaction commits, since a rollback also undoes the CREATE.
    async fn establish(
        &self,
        conn: &mut SqliteConnection,
        target: WriteTarget,
        records: &RecordSet,
        pending: &mut Vec<(&'static str, Vec<ColumnDef>)>,
    ) -> Result<Vec<ColumnDef>> {
        let table = target.table_name();
        if let Some(columns) = self.cached(table) {
            return Ok(columns);
        }

        let example = match target {
            WriteTarget::Transformed => Some(records),
            WriteTarget::Raw | WriteTarget::Predictions => None,
        };
        ensure_table(conn, table, example).await?;

        let columns = table_columns(conn, table)
            .await?
            .ok_or_else(|| DbError::invalid_arguments(format!("table '{}' was not created", table)))?;
        debug!(table, columns = columns.len(), "Table schema established");

        pending.push((table, columns.clone()));
        Ok(columns)
    }

    fn cached(&self, table: &str) -> Option<Vec<ColumnDef>> {
        match self.established.lock() {
            Ok(guard) => guard.get(table).cloned(),
            Err(poisoned) => poisoned.into_inner().get(table).cloned(),
        }
    }

    fn remember(&self, pending: Vec<(&'static str, Vec<ColumnDef>)>) {
        let mut guard = match self.established.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.extend(pending);
    }
}

async fn rollback(tx: sqlx::Transaction<'_, Sqlite>, batch_id: BatchId, cause: &DbError) {
    warn!(batch_id = %batch_id, "Rolling back batch write: {}", cause);
    if let Err(e) = tx.rollback().await {
        warn!(batch_id = %batch_id, "Rollback failed: {}", e);
    }
}

/// Fail if the batch carries values for the identity or timestamp columns.
fn reject_managed(table: &str, records: &RecordSet) -> Result<()> {
    let reserved: Vec<String> = records
        .column_names()
        .into_iter()
        .filter(|name| is_managed_column(name))
        .map(str::to_string)
        .collect();

    if reserved.is_empty() {
        Ok(())
    } else {
        Err(DbError::ReservedColumns {
            table: table.to_string(),
            columns: reserved,
        })
    }
}

/// Fail if the batch has columns the established table does not.
///
/// Table columns missing from the batch are fine: they are stored as NULL,
/// except boolean indicator columns of the transformed table, see
/// [`with_absent_indicators`].
fn check_compatible(table: &str, table_columns: &[ColumnDef], records: &RecordSet) -> Result<()> {
    let unknown: Vec<String> = records
        .column_names()
        .into_iter()
        .filter(|name| !name.eq_ignore_ascii_case("batch_id"))
        .filter(|name| !table_columns.iter().any(|c| c.name.eq_ignore_ascii_case(name)))
        .map(str::to_string)
        .collect();

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(DbError::SchemaMismatch {
            table: table.to_string(),
            columns: unknown,
        })
    }
}

/// Add every boolean column of the table that the batch lacks, set to `false`.
///
/// A category that no row of the batch has is false for each of its rows.
fn with_absent_indicators<'r>(
    table_columns: &[ColumnDef],
    records: &'r RecordSet,
) -> Result<Cow<'r, RecordSet>> {
    let absent: Vec<&ColumnDef> = table_columns
        .iter()
        .filter(|c| c.column_type == ColumnType::Boolean)
        .filter(|c| records.column_index(&c.name).is_none())
        .collect();
    if absent.is_empty() {
        return Ok(Cow::Borrowed(records));
    }

    let mut filled = records.clone();
    for column in absent {
        filled.push_column(
            Field::new(column.name.clone(), DataType::Boolean),
            vec![Value::Boolean(false); records.len()],
        )?;
    }
    Ok(Cow::Owned(filled))
}

/// Build the `(input_data_id, predicted_price)` projection from caller columns.
fn project_predictions(records: &RecordSet, options: &WriteOptions) -> Result<RecordSet> {
    let (Some(price_column), Some(id_column)) = (
        options.predicted_price_column.as_deref(),
        options.input_data_id_column.as_deref(),
    ) else {
        return Err(DbError::invalid_arguments(
            "For the 'predictions' table, 'predicted_price_column' and 'input_data_id_column' must be provided.",
        ));
    };

    let ids = records
        .column(id_column)
        .ok_or_else(|| DbError::invalid_arguments(format!("column '{}' not found", id_column)))?;
    let prices = records
        .column(price_column)
        .ok_or_else(|| DbError::invalid_arguments(format!("column '{}' not found", price_column)))?;

    let rows = ids
        .into_iter()
        .zip(prices)
        .enumerate()
        .map(|(idx, (id, price))| {
            let id = id.as_i64().ok_or_else(|| {
                DbError::invalid_arguments(format!("row {}: '{}' is not an integer id", idx, id_column))
            })?;
            let price = price.as_f64().ok_or_else(|| {
                DbError::invalid_arguments(format!("row {}: '{}' is not numeric", idx, price_column))
            })?;
            Ok(vec![Value::Int(id), Value::Float(price)])
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RecordSet::from_rows(
        vec!["input_data_id".to_string(), "predicted_price".to_string()],
        rows,
    )?)
}

fn prediction_rows(transformed_ids: &[i64], predictions: &[f64]) -> Result<RecordSet> {
    let rows = transformed_ids
        .iter()
        .zip(predictions)
        .map(|(id, price)| vec![Value::Int(*id), Value::Float(*price)])
        .collect();
    Ok(RecordSet::from_rows(
        vec!["input_data_id".to_string(), "predicted_price".to_string()],
        rows,
    )?)
}

/// Multi-row insert of every row of `records` tagged with `batch_id`.
///
/// Returns the new row ids in insertion order.
async fn insert_rows(
    conn: &mut SqliteConnection,
    table: &str,
    records: &RecordSet,
    batch_id: BatchId,
) -> Result<Vec<i64>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    // A batch_id column in the input is replaced by the writer's own.
    let value_columns: Vec<usize> = records
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| !f.name.eq_ignore_ascii_case("batch_id"))
        .map(|(idx, _)| idx)
        .collect();

    let mut column_list: Vec<String> = value_columns
        .iter()
        .map(|idx| quote_ident(&records.fields()[*idx].name))
        .collect();
    column_list.push("batch_id".to_string());

    let rows_per_statement = (MAX_BIND_PARAMS / column_list.len()).max(1);
    let mut ids = Vec::with_capacity(records.len());

    for chunk in records.rows().chunks(rows_per_statement) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "INSERT INTO {} ({}) ",
            quote_ident(table),
            column_list.join(", ")
        ));
        builder.push_values(chunk, |mut b, row| {
            for idx in &value_columns {
                bind_value(&mut b, &row[*idx]);
            }
            b.push_bind(batch_id.as_i64());
        });
        builder.push(" RETURNING id");

        let returned = builder.build().fetch_all(&mut *conn).await?;
        let mut chunk_ids = returned
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        // RETURNING order is unspecified; ids grow with insertion order.
        chunk_ids.sort_unstable();
        ids.extend(chunk_ids);
    }

    debug!(table, rows = ids.len(), batch_id = %batch_id, "Rows inserted");
    Ok(ids)
}

fn bind_value<Sep: Display>(builder: &mut Separated<'_, '_, Sqlite, Sep>, value: &Value) {
    match value {
        Value::Null => builder.push_bind(None::<i64>),
        Value::Boolean(b) => builder.push_bind(*b),
        Value::Int(i) => builder.push_bind(*i),
        Value::Float(f) => builder.push_bind(*f),
        Value::Text(s) => builder.push_bind(s.clone()),
    };
}

async fn fetch_batch_rows(
    conn: &mut SqliteConnection,
    table: &str,
    batch_id: BatchId,
) -> Result<RecordSet> {
    let columns = table_columns(conn, table)
        .await?
        .ok_or_else(|| DbError::invalid_arguments(format!("table '{}' does not exist", table)))?;

    let sql = format!(
        "SELECT * FROM {} WHERE batch_id = ? ORDER BY id",
        quote_ident(table)
    );
    let rows = sqlx::query(&sql)
        .bind(batch_id.as_i64())
        .fetch_all(&mut *conn)
        .await?;

    let values = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(idx, column)| decode_cell(row, idx, column.column_type))
                .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
        })
        .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;

    let names = columns.into_iter().map(|c| c.name).collect();
    Ok(RecordSet::from_rows(names, values)?)
}

/// Decode by declared column type; SQLite stores booleans as integers.
fn decode_cell(
    row: &SqliteRow,
    idx: usize,
    column_type: ColumnType,
) -> std::result::Result<Value, sqlx::Error> {
    let value = match column_type {
        ColumnType::Integer => row
            .try_get_unchecked::<Option<i64>, _>(idx)?
            .map(Value::Int),
        ColumnType::Float => row
            .try_get_unchecked::<Option<f64>, _>(idx)?
            .map(Value::Float),
        ColumnType::Boolean => row
            .try_get_unchecked::<Option<bool>, _>(idx)?
            .map(Value::Boolean),
        ColumnType::Text => row
            .try_get_unchecked::<Option<String>, _>(idx)?
            .map(Value::Text),
    };
    Ok(value.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(names: &[&str], rows: Vec<Vec<Value>>) -> RecordSet {
        RecordSet::from_rows(names.iter().map(|s| s.to_string()).collect(), rows).unwrap()
    }

    #[test]
    fn test_target_parsing() {
        assert_eq!("raw".parse::<WriteTarget>().unwrap(), WriteTarget::Raw);
        assert_eq!(
            "transformed_data".parse::<WriteTarget>().unwrap(),
            WriteTarget::Transformed
        );
        assert_eq!(
            "Predictions".parse::<WriteTarget>().unwrap(),
            WriteTarget::Predictions
        );
        let err = "audit_log".parse::<WriteTarget>().unwrap_err();
        assert!(matches!(err, DbError::UnsupportedTarget(name) if name == "audit_log"));
    }

    #[test]
    fn test_projection_requires_both_columns() {
        let rs = records(&["id", "price"], vec![vec![Value::Int(1), Value::Float(2.0)]]);

        let missing_id = WriteOptions {
            predicted_price_column: Some("price".into()),
            input_data_id_column: None,
        };
        assert!(matches!(
            project_predictions(&rs, &missing_id),
            Err(DbError::InvalidArguments(_))
        ));
        assert!(matches!(
            project_predictions(&rs, &WriteOptions::default()),
            Err(DbError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_projection_builds_minimal_rows() {
        let rs = records(
            &["source_row", "score", "extra"],
            vec![
                vec![Value::Int(10), Value::Int(250_000), Value::from("x")],
                vec![Value::Int(11), Value::Float(199_500.5), Value::from("y")],
            ],
        );

        let projected =
            project_predictions(&rs, &WriteOptions::predictions("score", "source_row")).unwrap();
        assert_eq!(projected.column_names(), vec!["input_data_id", "predicted_price"]);
        assert_eq!(projected.value(0, "predicted_price"), Some(&Value::Float(250_000.0)));
        assert_eq!(projected.value(1, "input_data_id"), Some(&Value::Int(11)));
    }

    #[test]
    fn test_projection_unknown_column() {
        let rs = records(&["id"], vec![vec![Value::Int(1)]]);
        let err = project_predictions(&rs, &WriteOptions::predictions("price", "id")).unwrap_err();
        assert!(err.to_string().contains("price"));
    }

    #[test]
    fn test_check_compatible_reports_unknown_columns() {
        let table = vec![
            ColumnDef::new("id", ColumnType::Integer),
            ColumnDef::new("batch_id", ColumnType::Integer),
            ColumnDef::new("rooms", ColumnType::Integer),
        ];
        let ok = records(&["ROOMS", "batch_id"], vec![]);
        assert!(check_compatible("t", &table, &ok).is_ok());

        let drifted = records(&["rooms", "ocean_proximity_ISLAND"], vec![]);
        match check_compatible("t", &table, &drifted) {
            Err(DbError::SchemaMismatch { table, columns }) => {
                assert_eq!(table, "t");
                assert_eq!(columns, vec!["ocean_proximity_ISLAND".to_string()]);
            }
            other => panic!("expected schema mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_reject_managed_columns() {
        let ok = records(&["rooms", "BATCH_ID"], vec![]);
        assert!(reject_managed(TRANSFORMED_TABLE, &ok).is_ok());

        let rs = records(&["Id", "rooms", "inserted_at"], vec![]);
        match reject_managed(RAW_TABLE, &rs) {
            Err(err @ DbError::ReservedColumns { .. }) => {
                assert!(err.is_client_error());
                assert!(err.to_string().contains("[\"Id\", \"inserted_at\"]"));
            }
            other => panic!("expected reserved columns, got {:?}", other),
        }
    }

    #[test]
    fn test_absent_indicators_are_false() {
        let table = vec![
            ColumnDef::new("id", ColumnType::Integer),
            ColumnDef::new("rooms", ColumnType::Integer),
            ColumnDef::new("op_A", ColumnType::Boolean),
            ColumnDef::new("op_B", ColumnType::Boolean),
        ];
        let rs = records(
            &["rooms", "op_A"],
            vec![vec![Value::Int(3), Value::Boolean(true)]],
        );

        let filled = with_absent_indicators(&table, &rs).unwrap();
        assert_eq!(filled.column_names(), vec!["rooms", "op_A", "op_B"]);
        assert_eq!(filled.value(0, "op_B"), Some(&Value::Boolean(false)));

        let complete = records(
            &["rooms", "op_a", "op_b"],
            vec![vec![Value::Int(3), Value::Boolean(true), Value::Boolean(false)]],
        );
        assert!(matches!(
            with_absent_indicators(&table, &complete).unwrap(),
            Cow::Borrowed(_)
        ));
    }
}
