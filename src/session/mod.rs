//! Record Session - one logical request against an executor
//!
//! A session collects clauses through the chain setters
//! ([`Session::where_clause`], [`Session::order_by`], [`Session::limit`]) and
//! consumes them in the next terminal operation (insert, find, first, update,
//! delete, count). Every terminal operation starts the following statement
//! from an empty clause set, whether it succeeded or not.
//!
//! Sessions are not shared between threads; create one per request.

pub mod record;

use crate::clause::{Clause, ClauseSet, Statement};
use crate::dialect::Dialect;
use crate::executor::{Executor, RowCursor};
use crate::schema::Registry;
use crate::value::Value;
use crate::{Error, Result};

pub struct Session<'a> {
    executor: &'a dyn Executor,
    registry: &'a Registry,
    dialect: Dialect,
    clauses: ClauseSet,
    pending: Option<Error>,
    hint: Option<String>,
}

impl<'a> Session<'a> {
    pub fn new(executor: &'a dyn Executor, registry: &'a Registry, dialect: Dialect) -> Self {
        Self {
            executor,
            registry,
            dialect,
            clauses: ClauseSet::new(dialect),
            pending: None,
            hint: None,
        }
    }

    /// Attach a label that is included in every log event of this session
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    /// Clauses collected for the next statement
    pub fn clauses(&self) -> &ClauseSet {
        &self.clauses
    }

    /// Restrict the next statement. `?` placeholders bind `params` in order.
    pub fn where_clause(&mut self, condition: &str, params: Vec<Value>) -> &mut Self {
        self.stage(Clause::Where {
            condition: condition.to_string(),
            params,
        })
    }

    /// Order the next query, e.g. `"age DESC"`
    pub fn order_by(&mut self, order: &str) -> &mut Self {
        self.stage(Clause::OrderBy {
            order: order.to_string(),
        })
    }

    pub fn limit(&mut self, count: u64) -> &mut Self {
        self.stage(Clause::Limit { count })
    }

    /// Drop every collected clause and any pending chain error
    pub fn reset(&mut self) {
        self.clauses = ClauseSet::new(self.dialect);
        self.pending = None;
    }

    /// Run raw SQL that returns no rows
    pub fn exec_raw(&mut self, sql: &str, params: &[Value]) -> Result<i64> {
        self.reset();
        self.exec_sql(sql, params)
    }

    /// Run raw SQL and collect every row
    pub fn query_raw(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Vec<Value>>> {
        self.reset();
        let mut cursor = self.open_cursor(sql, params)?;
        let mut rows = Vec::new();
        let outcome = drain(cursor.as_mut(), &mut rows);
        self.finish_cursor(cursor.as_mut(), outcome)?;
        Ok(rows)
    }

    fn stage(&mut self, clause: Clause) -> &mut Self {
        if self.pending.is_none() {
            if let Err(e) = self.clauses.set(clause) {
                self.pending = Some(e);
            }
        }
        self
    }

    /// Take the collected clauses for one statement, leaving a fresh set behind
    fn take_clauses(&mut self) -> Result<ClauseSet> {
        let clauses = std::mem::replace(&mut self.clauses, ClauseSet::new(self.dialect));
        match self.pending.take() {
            Some(e) => Err(e),
            None => Ok(clauses),
        }
    }

    fn exec_statement(&self, stmt: &Statement) -> Result<i64> {
        self.exec_sql(stmt.sql(), stmt.params())
    }

    fn exec_sql(&self, sql: &str, params: &[Value]) -> Result<i64> {
        tracing::debug!(
            hint = self.hint.as_deref().unwrap_or(""),
            sql,
            params = params.len(),
            "exec"
        );
        let result = self.executor.exec(sql, params)?;
        Ok(result.rows_affected())
    }

    fn open_cursor(&self, sql: &str, params: &[Value]) -> Result<Box<dyn RowCursor + 'a>> {
        tracing::debug!(
            hint = self.hint.as_deref().unwrap_or(""),
            sql,
            params = params.len(),
            "query"
        );
        let executor: &'a dyn Executor = self.executor;
        executor.query(sql, params)
    }

    /// Close a cursor exactly once and merge its outcome with the iteration's.
    ///
    /// An iteration error wins over a close error.
    fn finish_cursor(&self, cursor: &mut dyn RowCursor, outcome: Result<()>) -> Result<()> {
        let closed = cursor.close();
        match (outcome, closed) {
            (Err(e), Err(close_err)) => {
                tracing::warn!(
                    hint = self.hint.as_deref().unwrap_or(""),
                    "failed to close cursor after error: {}",
                    close_err
                );
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), closed) => closed,
        }
    }
}

impl std::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("dialect", &self.dialect)
            .field("clauses", &self.clauses)
            .field("hint", &self.hint)
            .finish()
    }
}

fn drain(cursor: &mut dyn RowCursor, rows: &mut Vec<Vec<Value>>) -> Result<()> {
    while cursor.advance()? {
        rows.push(cursor.scan()?);
    }
    Ok(())
}
