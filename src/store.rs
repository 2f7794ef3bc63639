//! DuckDB-backed transaction store.
//!
//! Wraps a DuckDB connection and converts result rows into JSON maps, which
//! are then deserialized into typed rows with `serde_json`.

use std::collections::HashMap;
use std::path::Path;

use duckdb::{types::ValueRef, AccessMode, Config, Connection as DuckDbConnection};
use serde::de::DeserializeOwned;

use crate::config::{validate_identifier, TRANSACTION_COLUMNS};
use crate::error::Result;
use crate::models::TransactionRow;

/// A DuckDB database holding the sales table.
pub struct Store {
    conn: DuckDbConnection,
}

impl Store {
    /// Open (or create) a database file for reading and writing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = DuckDbConnection::open(path)?;
        Ok(Self { conn })
    }

    /// Open an existing database file read-only.
    ///
    /// Fails if the file does not exist, which is how a missing primary
    /// store surfaces to the loader.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::default().access_mode(AccessMode::ReadOnly)?;
        let conn = DuckDbConnection::open_with_flags(path, config)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Fetch every transaction row from `table`.
    ///
    /// Numeric columns are cast to DOUBLE so integer and decimal schemas
    /// deserialize the same way. A NULL in any column is a schema error.
    pub fn fetch_transactions(&self, table: &str) -> Result<Vec<TransactionRow>> {
        validate_identifier(table)?;
        let [city, product, units_sold, unit_price, cost_per_unit] = TRANSACTION_COLUMNS;
        let sql = format!(
            "SELECT CAST({city} AS VARCHAR) AS {city}, \
             CAST({product} AS VARCHAR) AS {product}, \
             CAST({units_sold} AS DOUBLE) AS {units_sold}, \
             CAST({unit_price} AS DOUBLE) AS {unit_price}, \
             CAST({cost_per_unit} AS DOUBLE) AS {cost_per_unit} \
             FROM {table}"
        );
        self.execute_into(&sql, &[])
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    pub fn execute(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let mut stmt = self.conn.prepare(sql)?;

        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();

        let mut rows_result = stmt.query(param_values.as_slice())?;

        // Column metadata is only available once the statement has run.
        let Some(executed) = rows_result.as_ref() else {
            return Ok(Vec::new());
        };
        let column_names: Vec<String> = executed
            .column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        let mut out = Vec::new();
        while let Some(row) = rows_result.next()? {
            let mut map = HashMap::with_capacity(column_names.len());
            for (i, col_name) in column_names.iter().enumerate() {
                map.insert(col_name.clone(), convert_value_ref(row.get_ref(i)?));
            }
            out.push(map);
        }

        Ok(out)
    }

    /// Execute SQL and deserialize each row into type `T`.
    pub fn execute_into<T: DeserializeOwned>(&self, sql: &str, params: &[String]) -> Result<Vec<T>> {
        let rows = self.execute(sql, params)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::Value::Object(row.into_iter().collect());
            results.push(serde_json::from_value(value)?);
        }
        Ok(results)
    }

    /// Run one or more SQL statements that return no rows.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Create an empty table with the transaction schema.
    pub fn create_transactions_table(&self, table_name: &str) -> Result<()> {
        validate_identifier(table_name)?;
        self.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table_name} (\
               city VARCHAR NOT NULL, \
               product VARCHAR NOT NULL, \
               units_sold DOUBLE NOT NULL, \
               unit_price DOUBLE NOT NULL, \
               cost_per_unit DOUBLE NOT NULL)"
        ))
    }

    /// Append transaction rows to an existing table.
    pub fn insert_transactions(&self, table_name: &str, rows: &[TransactionRow]) -> Result<()> {
        validate_identifier(table_name)?;
        let mut appender = self.conn.appender(table_name)?;
        for row in rows {
            appender.append_row(duckdb::params![
                row.city,
                row.product,
                row.units_sold,
                row.unit_price,
                row.cost_per_unit
            ])?;
        }
        appender.flush()?;
        Ok(())
    }
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UTinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::USmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UBigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => match i64::try_from(n) {
            Ok(i) => serde_json::Value::Number(i.into()),
            Err(_) => serde_json::Value::String(n.to_string()),
        },
        ValueRef::Float(f) => float_value(f as f64),
        ValueRef::Double(f) => float_value(f),
        ValueRef::Text(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).to_string()),
        _ => serde_json::Value::Null,
    }
}

/// JSON has no NaN or infinity; those become strings so deserializing them
/// into `f64` fails loudly instead of reading a silent null.
fn float_value(f: f64) -> serde_json::Value {
    serde_json::Number::from_f64(f)
        .map(serde_json::Value::Number)
        .unwrap_or_else(|| serde_json::Value::String(f.to_string()))
}
