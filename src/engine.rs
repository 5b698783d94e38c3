//! Engine - owns an executor and the schema registry, hands out sessions

use crate::config::{DatabaseTarget, OrmConfig, prepare_database_dir};
use crate::dialect::Dialect;
use crate::executor::{Executor, SqliteExecutor};
use crate::schema::Registry;
use crate::session::Session;
use crate::Result;
use std::path::Path;
use std::sync::Arc;

pub struct Engine<E: Executor = SqliteExecutor> {
    executor: E,
    registry: Arc<Registry>,
    dialect: Dialect,
}

impl Engine<SqliteExecutor> {
    /// Open a SQLite database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        prepare_database_dir(path)?;
        let executor = SqliteExecutor::open(path)?;
        tracing::info!("Opened database {}", path.display());
        Ok(Self::with_executor(executor, Dialect::Sqlite))
    }

    /// Open an in-memory SQLite database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::with_executor(SqliteExecutor::open_in_memory()?, Dialect::Sqlite))
    }

    /// Open the database named by a configuration file
    pub fn from_config(config: &OrmConfig) -> Result<Self> {
        let mut engine = match config.target()? {
            DatabaseTarget::Memory => Self::open_in_memory()?,
            DatabaseTarget::File(path) => Self::open(&path)?,
        };
        engine.dialect = config.dialect;
        Ok(engine)
    }
}

impl<E: Executor> Engine<E> {
    pub fn with_executor(executor: E, dialect: Dialect) -> Self {
        Self {
            executor,
            registry: Arc::new(Registry::new()),
            dialect,
        }
    }

    /// Share a registry between engines
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    /// Start a new session
    pub fn new_session(&self) -> Session<'_> {
        Session::new(&self.executor, &self.registry, self.dialect)
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }
}
