//! Clause Set & Statement Builder
//!
//! Clauses are stored by kind and rendered in whatever order the caller asks
//! for at build time:
//!
//! - INSERT shape: `build(&[Insert, Values])`
//! - SELECT shape: `build(&[Select, Where, OrderBy, Limit])`
//! - UPDATE shape: `build(&[Update, Where])`
//!
//! Each clause is rendered into a [`Fragment`] when it is set; building is
//! plain ordered concatenation of fragments and their parameters.

pub mod generator;

use crate::dialect::Dialect;
use crate::value::Value;
use crate::{Error, Result};
use std::collections::HashMap;
use std::fmt;

pub use generator::Clause;

/// Named SQL fragment kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    Insert,
    Values,
    Select,
    Count,
    Where,
    OrderBy,
    Limit,
    Update,
    Delete,
}

impl ClauseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClauseKind::Insert => "INSERT",
            ClauseKind::Values => "VALUES",
            ClauseKind::Select => "SELECT",
            ClauseKind::Count => "COUNT",
            ClauseKind::Where => "WHERE",
            ClauseKind::OrderBy => "ORDER BY",
            ClauseKind::Limit => "LIMIT",
            ClauseKind::Update => "UPDATE",
            ClauseKind::Delete => "DELETE",
        }
    }

    pub fn all() -> &'static [ClauseKind] {
        &[
            ClauseKind::Insert,
            ClauseKind::Values,
            ClauseKind::Select,
            ClauseKind::Count,
            ClauseKind::Where,
            ClauseKind::OrderBy,
            ClauseKind::Limit,
            ClauseKind::Update,
            ClauseKind::Delete,
        ]
    }
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rendered clause: SQL text plus its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Fragment {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// A finished statement, ready for the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<Value>,
}

impl Statement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}

/// Per-statement store of rendered clauses.
///
/// Setting a kind that is already present replaces it and hands back the old
/// fragment. Building never clears the set; call [`ClauseSet::clear`] or
/// start a new set before an unrelated statement.
#[derive(Debug, Clone, Default)]
pub struct ClauseSet {
    dialect: Dialect,
    fragments: HashMap<ClauseKind, Fragment>,
}

impl ClauseSet {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            fragments: HashMap::new(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Render and store a clause, returning the fragment it replaced
    pub fn set(&mut self, clause: Clause) -> Result<Option<Fragment>> {
        let kind = clause.kind();
        let fragment = clause.render(self.dialect)?;
        Ok(self.fragments.insert(kind, fragment))
    }

    pub fn get(&self, kind: ClauseKind) -> Option<&Fragment> {
        self.fragments.get(&kind)
    }

    pub fn contains(&self, kind: ClauseKind) -> bool {
        self.fragments.contains_key(&kind)
    }

    pub fn remove(&mut self, kind: ClauseKind) -> Option<Fragment> {
        self.fragments.remove(&kind)
    }

    pub fn clear(&mut self) {
        self.fragments.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Concatenate the stored fragments in exactly the order of `kinds`.
    ///
    /// Kinds that were never set contribute nothing.
    pub fn build(&self, kinds: &[ClauseKind]) -> Result<Statement> {
        let mut parts = Vec::with_capacity(kinds.len());
        let mut params = Vec::new();

        for (idx, kind) in kinds.iter().enumerate() {
            if kinds[..idx].contains(kind) {
                return Err(Error::ClauseBuild(format!("{} requested more than once", kind)));
            }
            if let Some(fragment) = self.fragments.get(kind) {
                parts.push(fragment.sql.as_str());
                params.extend(fragment.params.iter().cloned());
            }
        }

        if parts.is_empty() {
            let requested: Vec<&str> = kinds.iter().map(ClauseKind::as_str).collect();
            return Err(Error::ClauseBuild(format!(
                "none of [{}] has been set",
                requested.join(", ")
            )));
        }

        Ok(Statement {
            sql: parts.join(" "),
            params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select_users() -> Clause {
        Clause::Select {
            table: "users".into(),
            columns: vec!["name".into(), "age".into()],
        }
    }

    #[test]
    fn test_build_skips_missing_kinds() {
        let mut clauses = ClauseSet::new(Dialect::Generic);
        clauses.set(select_users()).unwrap();
        clauses
            .set(Clause::Where {
                condition: "age > ?".into(),
                params: vec![Value::Integer(18)],
            })
            .unwrap();

        let stmt = clauses
            .build(&[ClauseKind::Select, ClauseKind::Where, ClauseKind::OrderBy, ClauseKind::Limit])
            .unwrap();
        assert_eq!(stmt.sql(), "SELECT name, age FROM users WHERE age > ?");
        assert_eq!(stmt.params(), &[Value::Integer(18)]);
    }

    #[test]
    fn test_build_follows_requested_order() {
        let mut clauses = ClauseSet::new(Dialect::Generic);
        // set out of order on purpose
        clauses.set(Clause::Limit { count: 3 }).unwrap();
        clauses.set(Clause::OrderBy { order: "age DESC".into() }).unwrap();
        clauses
            .set(Clause::Where {
                condition: "name = ?".into(),
                params: vec![Value::from("tom")],
            })
            .unwrap();
        clauses.set(select_users()).unwrap();

        let stmt = clauses
            .build(&[ClauseKind::Select, ClauseKind::Where, ClauseKind::OrderBy, ClauseKind::Limit])
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT name, age FROM users WHERE name = ? ORDER BY age DESC LIMIT ?"
        );
        assert_eq!(stmt.params(), &[Value::from("tom"), Value::Integer(3)]);
    }

    #[test]
    fn test_set_replaces_same_kind() {
        let mut clauses = ClauseSet::new(Dialect::Generic);
        assert!(clauses.set(Clause::Limit { count: 1 }).unwrap().is_none());
        let replaced = clauses.set(Clause::Limit { count: 5 }).unwrap().unwrap();
        assert_eq!(replaced.params, vec![Value::Integer(1)]);
        assert_eq!(clauses.get(ClauseKind::Limit).unwrap().params, vec![Value::Integer(5)]);
    }

    #[test]
    fn test_build_does_not_clear() {
        let mut clauses = ClauseSet::new(Dialect::Generic);
        clauses.set(select_users()).unwrap();
        let first = clauses.build(&[ClauseKind::Select]).unwrap();
        let second = clauses.build(&[ClauseKind::Select]).unwrap();
        assert_eq!(first, second);

        clauses.clear();
        assert!(clauses.is_empty());
        assert!(clauses.build(&[ClauseKind::Select]).is_err());
    }

    #[test]
    fn test_insert_values_shape() {
        let mut clauses = ClauseSet::new(Dialect::Sqlite);
        clauses
            .set(Clause::Insert {
                table: "users".into(),
                columns: vec!["name".into(), "age".into()],
            })
            .unwrap();
        clauses
            .set(Clause::Values {
                rows: vec![
                    vec![Value::from("tom"), Value::Integer(18)],
                    vec![Value::from("sam"), Value::Integer(25)],
                ],
            })
            .unwrap();

        let stmt = clauses.build(&[ClauseKind::Insert, ClauseKind::Values]).unwrap();
        assert_eq!(
            stmt.sql(),
            "INSERT INTO \"users\" (\"name\", \"age\") VALUES (?, ?), (?, ?)"
        );
        assert_eq!(stmt.params().len(), 4);
        assert_eq!(stmt.params()[2], Value::from("sam"));
    }

    #[test]
    fn test_duplicate_kind_rejected() {
        let mut clauses = ClauseSet::new(Dialect::Generic);
        clauses.set(select_users()).unwrap();
        let err = clauses.build(&[ClauseKind::Select, ClauseKind::Select]).unwrap_err();
        assert!(matches!(err, Error::ClauseBuild(_)));
    }
}
