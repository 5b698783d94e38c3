//! Driver-specific SQL formatting
//!
//! Placeholders are always positional `?`; only identifier quoting differs.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Identifiers are emitted as-is
    Generic,
    /// `"name"` quoting
    #[default]
    Sqlite,
    /// `` `name` `` quoting
    MySql,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Generic => "generic",
            Dialect::Sqlite => "sqlite",
            Dialect::MySql => "mysql",
        }
    }

    /// Quote a table or column identifier
    pub fn quote_ident(&self, ident: &str) -> String {
        match self {
            Dialect::Generic => ident.to_string(),
            Dialect::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
            Dialect::MySql => format!("`{}`", ident.replace('`', "``")),
        }
    }
}

impl FromStr for Dialect {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generic" | "plain" => Ok(Dialect::Generic),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            _ => Err(crate::Error::Config(format!("Unknown dialect: {}", s))),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoting() {
        assert_eq!(Dialect::Generic.quote_ident("user"), "user");
        assert_eq!(Dialect::Sqlite.quote_ident("user"), "\"user\"");
        assert_eq!(Dialect::Sqlite.quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(Dialect::MySql.quote_ident("user"), "`user`");
    }

    #[test]
    fn test_parse() {
        assert_eq!("SQLite".parse::<Dialect>().unwrap(), Dialect::Sqlite);
        assert_eq!("mariadb".parse::<Dialect>().unwrap(), Dialect::MySql);
        assert!("oracle".parse::<Dialect>().is_err());
    }
}
