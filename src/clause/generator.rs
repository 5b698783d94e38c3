//! Rendering of individual clauses into SQL fragments

use super::{ClauseKind, Fragment};
use crate::dialect::Dialect;
use crate::value::Value;
use crate::{Error, Result};

/// Typed arguments for one clause.
///
/// Table and column names are quoted by the dialect at render time.
/// `Where` conditions and `OrderBy` text are caller SQL and are emitted
/// verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Insert { table: String, columns: Vec<String> },
    Values { rows: Vec<Vec<Value>> },
    Select { table: String, columns: Vec<String> },
    Count { table: String },
    Where { condition: String, params: Vec<Value> },
    OrderBy { order: String },
    Limit { count: u64 },
    Update { table: String, assignments: Vec<(String, Value)> },
    Delete { table: String },
}

impl Clause {
    pub fn kind(&self) -> ClauseKind {
        match self {
            Clause::Insert { .. } => ClauseKind::Insert,
            Clause::Values { .. } => ClauseKind::Values,
            Clause::Select { .. } => ClauseKind::Select,
            Clause::Count { .. } => ClauseKind::Count,
            Clause::Where { .. } => ClauseKind::Where,
            Clause::OrderBy { .. } => ClauseKind::OrderBy,
            Clause::Limit { .. } => ClauseKind::Limit,
            Clause::Update { .. } => ClauseKind::Update,
            Clause::Delete { .. } => ClauseKind::Delete,
        }
    }

    /// Render this clause for `dialect`
    pub fn render(self, dialect: Dialect) -> Result<Fragment> {
        let kind = self.kind();
        let fail = |reason: &str| Error::ClauseBuild(format!("{}: {}", kind, reason));

        match self {
            Clause::Insert { table, columns } => {
                let table = quote_table(dialect, &table).ok_or_else(|| fail("table name is empty"))?;
                let columns = quote_columns(dialect, &columns).ok_or_else(|| fail("no columns"))?;
                Ok(Fragment::new(format!("INSERT INTO {} ({})", table, columns), Vec::new()))
            }
            Clause::Values { rows } => {
                let width = rows.first().map(Vec::len).unwrap_or(0);
                if width == 0 {
                    return Err(fail("no rows to insert"));
                }
                if rows.iter().any(|row| row.len() != width) {
                    return Err(fail("rows have differing widths"));
                }
                let tuple = format!("({})", vec!["?"; width].join(", "));
                let tuples = vec![tuple.as_str(); rows.len()].join(", ");
                let params = rows.into_iter().flatten().collect();
                Ok(Fragment::new(format!("VALUES {}", tuples), params))
            }
            Clause::Select { table, columns } => {
                let table = quote_table(dialect, &table).ok_or_else(|| fail("table name is empty"))?;
                let columns = quote_columns(dialect, &columns).ok_or_else(|| fail("no columns"))?;
                Ok(Fragment::new(format!("SELECT {} FROM {}", columns, table), Vec::new()))
            }
            Clause::Count { table } => {
                let table = quote_table(dialect, &table).ok_or_else(|| fail("table name is empty"))?;
                Ok(Fragment::new(format!("SELECT COUNT(*) FROM {}", table), Vec::new()))
            }
            Clause::Where { condition, params } => {
                let condition = condition.trim();
                if condition.is_empty() {
                    return Err(fail("condition is empty"));
                }
                let placeholders = count_placeholders(condition);
                if placeholders != params.len() {
                    return Err(fail(&format!(
                        "{} placeholders but {} parameters",
                        placeholders,
                        params.len()
                    )));
                }
                Ok(Fragment::new(format!("WHERE {}", condition), params))
            }
            Clause::OrderBy { order } => {
                let order = order.trim();
                if order.is_empty() {
                    return Err(fail("ordering is empty"));
                }
                Ok(Fragment::new(format!("ORDER BY {}", order), Vec::new()))
            }
            Clause::Limit { count } => {
                let count = i64::try_from(count).map_err(|_| fail("limit out of range"))?;
                Ok(Fragment::new("LIMIT ?", vec![Value::Integer(count)]))
            }
            Clause::Update { table, assignments } => {
                let table = quote_table(dialect, &table).ok_or_else(|| fail("table name is empty"))?;
                if assignments.is_empty() {
                    return Err(fail("no assignments"));
                }
                let mut sets = Vec::with_capacity(assignments.len());
                let mut params = Vec::with_capacity(assignments.len());
                for (column, value) in assignments {
                    if column.is_empty() {
                        return Err(fail("column name is empty"));
                    }
                    sets.push(format!("{} = ?", dialect.quote_ident(&column)));
                    params.push(value);
                }
                Ok(Fragment::new(format!("UPDATE {} SET {}", table, sets.join(", ")), params))
            }
            Clause::Delete { table } => {
                let table = quote_table(dialect, &table).ok_or_else(|| fail("table name is empty"))?;
                Ok(Fragment::new(format!("DELETE FROM {}", table), Vec::new()))
            }
        }
    }
}

/// Count `?` placeholders outside quoted text and comments.
///
/// Skips `'..'`, `".."` and backtick spans (a doubled quote stays inside the
/// span), `-- ..` line comments and `/* .. */` block comments.
fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '?' => count += 1,
            '\'' | '"' | '`' => {
                for inner in chars.by_ref() {
                    if inner == c {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for inner in chars.by_ref() {
                    if prev == '*' && inner == '/' {
                        break;
                    }
                    prev = inner;
                }
            }
            _ => {}
        }
    }
    count
}

fn quote_table(dialect: Dialect, table: &str) -> Option<String> {
    (!table.is_empty()).then(|| dialect.quote_ident(table))
}

fn quote_columns(dialect: Dialect, columns: &[String]) -> Option<String> {
    if columns.is_empty() || columns.iter().any(String::is_empty) {
        return None;
    }
    let quoted: Vec<String> = columns.iter().map(|c| dialect.quote_ident(c)).collect();
    Some(quoted.join(", "))
}
