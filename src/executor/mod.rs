//! Executor boundary
//!
//! The session hands finished statements to an [`Executor`] and reads query
//! results back through a [`RowCursor`]. [`SqliteExecutor`] is the bundled
//! implementation; anything else can plug in by implementing the two traits.

pub mod sqlite;

use crate::value::Value;
use crate::{Error, Result};
use std::collections::VecDeque;

pub use sqlite::SqliteExecutor;

/// Outcome of a write statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    rows_affected: i64,
}

impl ExecResult {
    pub fn new(rows_affected: i64) -> Self {
        Self { rows_affected }
    }

    pub fn rows_affected(&self) -> i64 {
        self.rows_affected
    }
}

/// Runs SQL text with positional parameters.
pub trait Executor {
    /// Run a statement that returns no rows
    fn exec(&self, sql: &str, params: &[Value]) -> Result<ExecResult>;

    /// Run a statement and return a cursor over its rows.
    ///
    /// The caller owns the cursor and must close it.
    fn query<'a>(&'a self, sql: &str, params: &[Value]) -> Result<Box<dyn RowCursor + 'a>>;
}

/// Forward-only sequence of result rows.
pub trait RowCursor {
    /// Move to the next row; `false` once the rows are exhausted
    fn advance(&mut self) -> Result<bool>;

    /// Column values of the current row, in select-list order.
    ///
    /// Only valid after `advance` returned `true`.
    fn scan(&mut self) -> Result<Vec<Value>>;

    /// Release the cursor. Calling it again is a no-op.
    fn close(&mut self) -> Result<()>;
}

/// A fetched row whose column could not be converted into a [`Value`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFailure {
    pub column: String,
    pub reason: String,
}

/// Cursor over rows that were fetched up front.
///
/// A row that failed to convert is kept in place and reported by `scan` for
/// that row only, so earlier rows stay readable. An error that stopped the
/// fetch is reported by `advance` once the fetched rows are used up.
#[derive(Debug, Default)]
pub struct BufferedCursor {
    rows: VecDeque<std::result::Result<Vec<Value>, ScanFailure>>,
    current: Option<std::result::Result<Vec<Value>, ScanFailure>>,
    position: usize,
    trailing: Option<Error>,
    closed: bool,
}

impl BufferedCursor {
    pub fn new(rows: impl IntoIterator<Item = Vec<Value>>) -> Self {
        Self::from_results(rows.into_iter().map(Ok))
    }

    pub fn from_results(
        rows: impl IntoIterator<Item = std::result::Result<Vec<Value>, ScanFailure>>,
    ) -> Self {
        Self {
            rows: rows.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Report `err` from `advance` after the buffered rows
    pub fn with_trailing_error(mut self, err: Error) -> Self {
        self.trailing = Some(err);
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl RowCursor for BufferedCursor {
    fn advance(&mut self) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }
        self.current = self.rows.pop_front();
        if self.current.is_some() {
            self.position += 1;
            return Ok(true);
        }
        match self.trailing.take() {
            Some(err) => Err(err),
            None => Ok(false),
        }
    }

    fn scan(&mut self) -> Result<Vec<Value>> {
        match &self.current {
            Some(Ok(values)) => Ok(values.clone()),
            Some(Err(failure)) => Err(Error::Scan {
                row: self.position,
                column: failure.column.clone(),
                reason: failure.reason.clone(),
            }),
            None => Err(Error::Executor("scan called without a current row".to_string())),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.current = None;
        self.rows.clear();
        self.trailing = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_cursor() {
        let mut cursor = BufferedCursor::new(vec![vec![Value::Integer(1)], vec![Value::Integer(2)]]);
        assert!(cursor.scan().is_err());

        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.scan().unwrap(), vec![Value::Integer(1)]);
        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.scan().unwrap(), vec![Value::Integer(2)]);
        assert!(!cursor.advance().unwrap());
        assert!(cursor.scan().is_err());
    }

    #[test]
    fn test_failed_row_reported_at_its_position() {
        let mut cursor = BufferedCursor::from_results(vec![
            Ok(vec![Value::from("a")]),
            Err(ScanFailure {
                column: "payload".to_string(),
                reason: "blob columns are not supported".to_string(),
            }),
            Ok(vec![Value::from("c")]),
        ]);

        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.scan().unwrap(), vec![Value::from("a")]);
        assert!(cursor.advance().unwrap());
        match cursor.scan().unwrap_err() {
            Error::Scan { row, column, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "payload");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.scan().unwrap(), vec![Value::from("c")]);
        assert!(!cursor.advance().unwrap());
    }

    #[test]
    fn test_trailing_error_after_rows() {
        let mut cursor = BufferedCursor::new(vec![vec![Value::Integer(1)]])
            .with_trailing_error(Error::Executor("connection lost".to_string()));
        assert!(cursor.advance().unwrap());
        assert!(cursor.advance().is_err());
        assert!(!cursor.advance().unwrap());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut cursor = BufferedCursor::new(vec![vec![Value::Null]]);
        cursor.close().unwrap();
        cursor.close().unwrap();
        assert!(cursor.is_closed());
        assert!(!cursor.advance().unwrap());
    }
}
