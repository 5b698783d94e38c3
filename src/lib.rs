//! # lborm - a minimal object-relational mapping layer
//!
//! lborm provides:
//! - Typed table schemas derived once per record type and cached in a [`Registry`]
//! - A clause set that renders SQL in caller-chosen clause order
//! - A record session that inserts batches and materializes rows into records
//! - A pluggable executor boundary with a bundled SQLite executor
//!
//! ```
//! use lborm::{Engine, Value};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct User {
//!     name: String,
//!     age: i64,
//! }
//!
//! lborm::record!(User { name, age });
//!
//! # fn main() -> lborm::Result<()> {
//! let engine = Engine::open_in_memory()?;
//! let mut session = engine.new_session();
//! session.exec_raw("CREATE TABLE \"User\" (name TEXT, age INTEGER)", &[])?;
//! session.insert(&[
//!     User { name: "tom".into(), age: 18 },
//!     User { name: "sam".into(), age: 25 },
//! ])?;
//!
//! let mut adults = Vec::new();
//! session.where_clause("age > ?", vec![Value::from(20)]).find::<User>(&mut adults)?;
//! assert_eq!(adults, vec![User { name: "sam".into(), age: 25 }]);
//! # Ok(())
//! # }
//! ```

pub mod value;
pub mod dialect;
pub mod schema;
pub mod clause;
pub mod executor;
pub mod session;
pub mod engine;
pub mod config;

// Re-exports for convenient access
pub use value::{ConversionError, FromValue, ToValue, Value, ValueKind};
pub use dialect::Dialect;
pub use schema::{FieldDescriptor, Record, Registry, TableSchema};
pub use clause::{Clause, ClauseKind, ClauseSet, Fragment, Statement};
pub use executor::{BufferedCursor, ExecResult, Executor, RowCursor, ScanFailure, SqliteExecutor};
pub use session::Session;
pub use engine::Engine;
pub use config::OrmConfig;

/// Result type alias for lborm operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for lborm operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid model {model}: {reason}")]
    InvalidModel { model: String, reason: String },

    #[error("Clause build error: {0}")]
    ClauseBuild(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Executor error: {0}")]
    Executor(String),

    #[error("Bind error at column {column}: {reason}")]
    Bind { column: String, reason: String },

    #[error("Scan error at row {row}, column {column}: {reason}")]
    Scan {
        row: usize,
        column: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}
