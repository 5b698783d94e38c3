//! SQLite executor
//!
//! Values cross into SQLite as follows: booleans become 0/1 integers and
//! timestamps become nanoseconds since the Unix epoch. BLOB columns have no
//! [`Value`] counterpart and fail to scan.

use super::{BufferedCursor, ExecResult, Executor, RowCursor, ScanFailure};
use crate::value::Value;
use crate::{Error, Result};
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{Connection, params_from_iter};
use std::path::Path;

/// [`Executor`] backed by a single SQLite connection
pub struct SqliteExecutor {
    conn: Connection,
}

impl SqliteExecutor {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Executor for SqliteExecutor {
    fn exec(&self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        let changed = self.conn.execute(sql, params_from_iter(params.iter()))?;
        Ok(ExecResult::new(i64::try_from(changed).unwrap_or(i64::MAX)))
    }

    fn query<'a>(&'a self, sql: &str, params: &[Value]) -> Result<Box<dyn RowCursor + 'a>> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        // Rows borrow the prepared statement, so they are fetched before it is dropped.
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut fetched = Vec::new();
        loop {
            let row = match rows.next() {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(fetched = fetched.len(), "row fetch stopped: {}", e);
                    return Ok(Box::new(
                        BufferedCursor::from_results(fetched).with_trailing_error(e.into()),
                    ));
                }
            };
            fetched.push(convert_row(row, &columns));
        }

        Ok(Box::new(BufferedCursor::from_results(fetched)))
    }
}

/// Convert one row, stopping at the first column with no [`Value`] form
fn convert_row(
    row: &rusqlite::Row<'_>,
    columns: &[String],
) -> std::result::Result<Vec<Value>, ScanFailure> {
    let mut values = Vec::with_capacity(columns.len());
    for (idx, column) in columns.iter().enumerate() {
        let failure = |reason: String| ScanFailure {
            column: column.clone(),
            reason,
        };
        let cell = row.get_ref(idx).map_err(|e| failure(e.to_string()))?;
        values.push(from_sql_ref(cell).map_err(failure)?);
    }
    Ok(values)
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let output = match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Owned(SqlValue::Real(*r)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Value::Timestamp(t) => {
                let nanos = Value::timestamp_nanos(*t)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                ToSqlOutput::Owned(SqlValue::Integer(nanos))
            }
        };
        Ok(output)
    }
}

fn from_sql_ref(value: ValueRef<'_>) -> std::result::Result<Value, String> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(i) => Ok(Value::Integer(i)),
        ValueRef::Real(r) => Ok(Value::Real(r)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|s| Value::Text(s.to_string()))
            .map_err(|e| format!("invalid UTF-8 text: {}", e)),
        ValueRef::Blob(_) => Err("blob columns are not supported".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn collect(cursor: &mut dyn RowCursor) -> Vec<Vec<Value>> {
        let mut rows = Vec::new();
        while cursor.advance().unwrap() {
            rows.push(cursor.scan().unwrap());
        }
        cursor.close().unwrap();
        rows
    }

    #[test]
    fn test_exec_and_query() {
        let executor = SqliteExecutor::open_in_memory().unwrap();
        executor
            .exec("CREATE TABLE t (name TEXT, flag INTEGER, at INTEGER, score REAL)", &[])
            .unwrap();

        let at = UNIX_EPOCH + Duration::from_nanos(1_234_567_891);
        let result = executor
            .exec(
                "INSERT INTO t (name, flag, at, score) VALUES (?, ?, ?, ?), (?, ?, ?, ?)",
                &[
                    Value::from("a"),
                    Value::Bool(true),
                    Value::Timestamp(at),
                    Value::Real(1.5),
                    Value::from("b"),
                    Value::Bool(false),
                    Value::Null,
                    Value::Null,
                ],
            )
            .unwrap();
        assert_eq!(result.rows_affected(), 2);

        let mut cursor = executor
            .query("SELECT name, flag, at, score FROM t ORDER BY name", &[])
            .unwrap();
        let rows = collect(cursor.as_mut());
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            vec![Value::from("a"), Value::Integer(1), Value::Integer(1_234_567_891), Value::Real(1.5)]
        );
        assert_eq!(rows[1][2], Value::Null);
    }

    #[test]
    fn test_blob_fails_only_its_row() {
        let executor = SqliteExecutor::open_in_memory().unwrap();
        executor.exec("CREATE TABLE notes (body)", &[]).unwrap();
        executor
            .exec("INSERT INTO notes (body) VALUES ('a'), (x'00ff'), ('c')", &[])
            .unwrap();

        let mut cursor = executor.query("SELECT body FROM notes ORDER BY rowid", &[]).unwrap();
        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.scan().unwrap(), vec![Value::from("a")]);

        assert!(cursor.advance().unwrap());
        match cursor.scan().unwrap_err() {
            Error::Scan { row, column, reason } => {
                assert_eq!(row, 2);
                assert_eq!(column, "body");
                assert_eq!(reason, "blob columns are not supported");
            }
            other => panic!("unexpected error: {}", other),
        }

        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.scan().unwrap(), vec![Value::from("c")]);
        assert!(!cursor.advance().unwrap());
        cursor.close().unwrap();
    }

    #[test]
    fn test_out_of_range_timestamp_not_bound() {
        let executor = SqliteExecutor::open_in_memory().unwrap();
        executor.exec("CREATE TABLE t (at INTEGER)", &[]).unwrap();
        let far = UNIX_EPOCH + Duration::from_secs(400 * 365 * 24 * 3600);
        let err = executor
            .exec("INSERT INTO t (at) VALUES (?)", &[Value::Timestamp(far)])
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[test]
    fn test_storage_error_propagates() {
        let executor = SqliteExecutor::open_in_memory().unwrap();
        let err = executor.exec("INSERT INTO missing VALUES (1)", &[]).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
