//! `lborm.toml` settings
//!
//! ```toml
//! database = "data/app.db"   # or ":memory:"
//! dialect = "sqlite"         # sqlite | mysql | generic
//! log_filter = "lborm=debug"
//! ```

use crate::dialect::Dialect;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when no path is given
pub const CONFIG_FILE: &str = "lborm.toml";

/// Database name that selects a private in-memory SQLite database
pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OrmConfig {
    pub database: Option<String>,
    #[serde(default)]
    pub dialect: Dialect,
    /// `tracing_subscriber::EnvFilter` directive used by the CLI
    pub log_filter: Option<String>,
}

/// Where an engine built from a config keeps its data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    Memory,
    File(PathBuf),
}

impl OrmConfig {
    /// Settings written by `lborm init`
    pub fn starter(database: Option<String>) -> Self {
        Self {
            database: Some(database.unwrap_or_else(|| "lborm.db".to_string())),
            ..Default::default()
        }
    }

    /// Read settings from `path`, or from [`CONFIG_FILE`] when `None`.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or(Path::new(CONFIG_FILE));
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text)
                .map_err(|reason| Error::Config(format!("{}: {}", path.display(), reason))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn parse(text: &str) -> std::result::Result<Self, String> {
        toml::from_str(text).map_err(|e| e.message().to_string())
    }

    /// Write these settings to `path`; an existing file is kept unless `overwrite`
    pub fn save(&self, path: &Path, overwrite: bool) -> Result<()> {
        if !overwrite && path.exists() {
            return Err(Error::Config(format!(
                "{} exists, pass --force to replace it",
                path.display()
            )));
        }
        let text = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Resolve the configured database
    pub fn target(&self) -> Result<DatabaseTarget> {
        match self.database.as_deref().map(str::trim) {
            None | Some("") => Err(Error::Config("no database configured".to_string())),
            Some(IN_MEMORY) => Ok(DatabaseTarget::Memory),
            Some(file) => Ok(DatabaseTarget::File(PathBuf::from(file))),
        }
    }
}

/// Create the directory a database file will live in
pub(crate) fn prepare_database_dir(db_path: &Path) -> Result<()> {
    match db_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
            Ok(())
        }
        _ => Ok(()),
    }
}
