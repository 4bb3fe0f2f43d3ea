//! Schema store: maps a record shape to a storage table.
//!
//! All CREATE TABLE statements live here. Tables are created with
//! `CREATE TABLE IF NOT EXISTS`, so an existing table is never altered and two
//! first writers racing on the same table cannot both fail.

use crate::connection::Store;
use crate::error::{DbError, Result};
use appraisal_protocol::{DataType, RecordSet};
use sqlx::sqlite::SqliteConnection;
use sqlx::Row;
use tracing::{debug, info};

pub const RAW_TABLE: &str = "raw_data";
pub const TRANSFORMED_TABLE: &str = "transformed_data";
pub const PREDICTIONS_TABLE: &str = "predictions";

/// Columns the store fills in itself: the identity and the creation timestamps.
pub const MANAGED_COLUMNS: [&str; 3] = ["id", "timestamp", "inserted_at"];

pub fn is_managed_column(name: &str) -> bool {
    MANAGED_COLUMNS.iter().any(|c| c.eq_ignore_ascii_case(name))
}

/// Quote an identifier for SQLite. Indicator columns carry spaces and `<`.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Storage type of a data column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text,
}

impl ColumnType {
    /// The fixed type-mapping policy: integers, floats and booleans keep their
    /// kind, everything else is stored as text.
    pub fn from_data_type(data_type: DataType) -> Self {
        match data_type {
            DataType::Int64 => ColumnType::Integer,
            DataType::Float64 => ColumnType::Float,
            DataType::Boolean => ColumnType::Boolean,
            DataType::String => ColumnType::Text,
        }
    }

    pub fn sql_name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "FLOAT",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Text => "TEXT",
        }
    }

    /// Read back a declared type from `PRAGMA table_info`.
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.to_uppercase();
        if upper.contains("BOOL") {
            ColumnType::Boolean
        } else if upper.contains("INT") {
            ColumnType::Integer
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            ColumnType::Float
        } else {
            ColumnType::Text
        }
    }
}

/// A data column of a table (the identity, batch and timestamp columns are implicit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Full definition of one storage table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub timestamp_column: String,
    pub columns: Vec<ColumnDef>,
    /// `(column, referenced table)` pairs
    pub foreign_keys: Vec<(String, String)>,
}

impl TableSchema {
    /// Derive a schema from an example record set, one column per field.
    /// `batch_id` and the managed columns are never taken from the example.
    pub fn derive(name: &str, example: &RecordSet) -> Self {
        let columns = example
            .fields()
            .iter()
            .filter(|f| !f.name.eq_ignore_ascii_case("batch_id") && !is_managed_column(&f.name))
            .map(|f| ColumnDef::new(f.name.clone(), ColumnType::from_data_type(f.data_type)))
            .collect();

        Self {
            name: name.to_string(),
            timestamp_column: "timestamp".to_string(),
            columns,
            foreign_keys: Vec::new(),
        }
    }

    /// Fixed schema of the raw input table.
    pub fn raw_data() -> Self {
        use ColumnType::*;
        let columns = [
            ("longitude", Float),
            ("latitude", Float),
            ("median_age", Integer),
            ("rooms", Integer),
            ("bedrooms", Integer),
            ("pop", Integer),
            ("households", Integer),
            ("median_income", Float),
            ("median_house_value", Float),
            ("ocean_proximity", Text),
            ("agency", Boolean),
        ]
        .into_iter()
        .map(|(name, ty)| ColumnDef::new(name, ty))
        .collect();

        Self {
            name: RAW_TABLE.to_string(),
            timestamp_column: "inserted_at".to_string(),
            columns,
            foreign_keys: Vec::new(),
        }
    }

    /// Fixed schema of the predictions table. Its shape never depends on the data.
    pub fn predictions() -> Self {
        Self {
            name: PREDICTIONS_TABLE.to_string(),
            timestamp_column: "timestamp".to_string(),
            columns: vec![
                ColumnDef::new("input_data_id", ColumnType::Integer),
                ColumnDef::new("predicted_price", ColumnType::Float),
            ],
            foreign_keys: vec![("input_data_id".to_string(), TRANSFORMED_TABLE.to_string())],
        }
    }

    /// The fixed schema for a table name, if it has one.
    pub fn fixed(name: &str) -> Option<Self> {
        match name {
            RAW_TABLE => Some(Self::raw_data()),
            PREDICTIONS_TABLE => Some(Self::predictions()),
            _ => None,
        }
    }

    pub fn create_sql(&self) -> String {
        let mut defs = vec![
            "id INTEGER PRIMARY KEY AUTOINCREMENT".to_string(),
            "batch_id INTEGER NOT NULL".to_string(),
            format!(
                "{} DATETIME DEFAULT CURRENT_TIMESTAMP",
                quote_ident(&self.timestamp_column)
            ),
        ];
        defs.extend(
            self.columns
                .iter()
                .map(|c| format!("{} {}", quote_ident(&c.name), c.column_type.sql_name())),
        );
        defs.extend(self.foreign_keys.iter().map(|(column, parent)| {
            format!(
                "FOREIGN KEY({}) REFERENCES {}(id)",
                quote_ident(column),
                quote_ident(parent)
            )
        }));

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&self.name),
            defs.join(", ")
        )
    }
}

/// Create `table` if it does not exist yet.
///
/// With an example record set the schema is derived from it; without one only
/// tables with a fixed schema can be created. An existing table is left exactly
/// as it is, even if the example no longer matches it.
pub async fn ensure_table(
    conn: &mut SqliteConnection,
    table: &str,
    example: Option<&RecordSet>,
) -> Result<()> {
    let schema = match example {
        Some(example) => TableSchema::derive(table, example),
        None => TableSchema::fixed(table).ok_or_else(|| {
            DbError::invalid_arguments(format!(
                "table '{}' has no fixed schema and no example record set was given",
                table
            ))
        })?,
    };

    let sql = schema.create_sql();
    debug!(table, "CREATE TABLE: {}", sql);
    sqlx::query(&sql).execute(&mut *conn).await?;
    Ok(())
}

/// Columns of an existing table (including identity, batch and timestamp
/// columns), or `None` if the table does not exist.
pub async fn table_columns(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<Option<Vec<ColumnDef>>> {
    let sql = format!("PRAGMA table_info({})", quote_ident(table));
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
    if rows.is_empty() {
        return Ok(None);
    }

    let columns = rows
        .iter()
        .map(|row| {
            let name: String = row.try_get("name")?;
            let declared: String = row.try_get("type")?;
            Ok(ColumnDef::new(name, ColumnType::from_declared(&declared)))
        })
        .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;
    Ok(Some(columns))
}

impl Store {
    /// Ensure one table exists, in its own unit of work.
    pub async fn ensure_table(&self, table: &str, example: Option<&RecordSet>) -> Result<()> {
        let mut conn = self.acquire().await?;
        let outcome = ensure_table(&mut conn, table, example).await;
        conn.release(outcome).await
    }

    /// Columns of `table`, in its own unit of work.
    pub async fn table_columns(&self, table: &str) -> Result<Option<Vec<ColumnDef>>> {
        let mut conn = self.acquire().await?;
        let outcome = table_columns(&mut conn, table).await;
        conn.release(outcome).await
    }
}

/// Create the raw and predictions tables, and the transformed table when an
/// example of its shape is available.
pub async fn initialize_database(store: &Store, transformed_example: Option<&RecordSet>) -> Result<()> {
    let mut conn = store.acquire().await?;
    let outcome = async {
        ensure_table(&mut conn, RAW_TABLE, None).await?;
        if let Some(example) = transformed_example {
            ensure_table(&mut conn, TRANSFORMED_TABLE, Some(example)).await?;
        }
        ensure_table(&mut conn, PREDICTIONS_TABLE, None).await?;
        Ok::<(), DbError>(())
    }
    .await;
    let result = conn.release(outcome).await;
    if result.is_ok() {
        info!(path = %store.path().display(), "Database schema verified");
    }
    result
}
