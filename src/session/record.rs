//! Record operations: insert, find and friends

use super::{Session, drain};
use crate::clause::{Clause, ClauseKind};
use crate::executor::RowCursor;
use crate::schema::{Record, TableSchema};
use crate::value::{FromValue, Value};
use crate::{Error, Result};

impl Session<'_> {
    /// Insert a batch of records with a single statement.
    ///
    /// Returns the executor's affected-row count. Parameters are laid out
    /// record-major, field-minor, in input order.
    pub fn insert<T: Record>(&mut self, records: &[T]) -> Result<i64> {
        let mut clauses = self.take_clauses()?;
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let schema = self.registry.model_of(record)?;
            clauses.set(Clause::Insert {
                table: schema.name().to_string(),
                columns: schema.column_names(),
            })?;
            rows.push(schema.record_values(record)?);
        }

        clauses.set(Clause::Values { rows })?;
        let stmt = clauses.build(&[ClauseKind::Insert, ClauseKind::Values])?;
        self.exec_statement(&stmt)
    }

    /// Append every matching row to `dest`, in row order.
    ///
    /// Uses the WHERE / ORDER BY / LIMIT clauses staged on this session. If a
    /// row fails to scan, the rows before it stay in `dest` and the error is
    /// returned.
    pub fn find<T: Record>(&mut self, dest: &mut Vec<T>) -> Result<()> {
        let mut clauses = self.take_clauses()?;
        let schema = self.registry.model::<T>()?;
        clauses.set(Clause::Select {
            table: schema.name().to_string(),
            columns: schema.column_names(),
        })?;
        let stmt = clauses.build(&[
            ClauseKind::Select,
            ClauseKind::Where,
            ClauseKind::OrderBy,
            ClauseKind::Limit,
        ])?;

        let mut cursor = self.open_cursor(stmt.sql(), stmt.params())?;
        let outcome = materialize(&schema, cursor.as_mut(), dest);
        self.finish_cursor(cursor.as_mut(), outcome)
    }

    /// The first matching record, if any
    pub fn first<T: Record>(&mut self) -> Result<Option<T>> {
        self.limit(1);
        let mut found = Vec::with_capacity(1);
        self.find(&mut found)?;
        Ok(found.into_iter().next())
    }

    /// Update matching rows of `T`'s table.
    ///
    /// Assignments are keyed by field name or column name.
    pub fn update<T: Record>(&mut self, assignments: &[(&str, Value)]) -> Result<i64> {
        let mut clauses = self.take_clauses()?;
        let schema = self.registry.model::<T>()?;

        let mut resolved = Vec::with_capacity(assignments.len());
        for (name, value) in assignments {
            let field = schema.field(name).ok_or_else(|| {
                Error::ClauseBuild(format!("UPDATE: {} has no field {}", schema.name(), name))
            })?;
            resolved.push((field.column_name().to_string(), value.clone()));
        }

        clauses.set(Clause::Update {
            table: schema.name().to_string(),
            assignments: resolved,
        })?;
        let stmt = clauses.build(&[ClauseKind::Update, ClauseKind::Where])?;
        self.exec_statement(&stmt)
    }

    /// Delete matching rows of `T`'s table
    pub fn delete<T: Record>(&mut self) -> Result<i64> {
        let mut clauses = self.take_clauses()?;
        let schema = self.registry.model::<T>()?;
        clauses.set(Clause::Delete {
            table: schema.name().to_string(),
        })?;
        let stmt = clauses.build(&[ClauseKind::Delete, ClauseKind::Where])?;
        self.exec_statement(&stmt)
    }

    /// Count matching rows of `T`'s table
    pub fn count<T: Record>(&mut self) -> Result<i64> {
        let mut clauses = self.take_clauses()?;
        let schema = self.registry.model::<T>()?;
        clauses.set(Clause::Count {
            table: schema.name().to_string(),
        })?;
        let stmt = clauses.build(&[ClauseKind::Count, ClauseKind::Where])?;

        let mut cursor = self.open_cursor(stmt.sql(), stmt.params())?;
        let mut rows = Vec::new();
        let outcome = drain(cursor.as_mut(), &mut rows);
        self.finish_cursor(cursor.as_mut(), outcome)?;

        let count_error = |reason: String| Error::Scan {
            row: 1,
            column: "COUNT(*)".to_string(),
            reason,
        };
        let value = rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .ok_or_else(|| count_error("no rows returned".to_string()))?;
        i64::from_value(value).map_err(|e| count_error(e.to_string()))
    }
}

/// Scan rows into fresh records, positionally by schema column order
fn materialize<T: Record>(
    schema: &TableSchema<T>,
    cursor: &mut dyn RowCursor,
    dest: &mut Vec<T>,
) -> Result<()> {
    let mut row = 0;
    while cursor.advance()? {
        row += 1;
        let values = cursor.scan()?;
        if values.len() != schema.len() {
            return Err(Error::Scan {
                row,
                column: "*".to_string(),
                reason: format!("expected {} columns, found {}", schema.len(), values.len()),
            });
        }

        let mut record = T::default();
        for (field, value) in schema.fields().iter().zip(values) {
            field.set(&mut record, value).map_err(|e| Error::Scan {
                row,
                column: field.column_name().to_string(),
                reason: e.to_string(),
            })?;
        }
        dest.push(record);
    }
    Ok(())
}
