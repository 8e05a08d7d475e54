
pub mod pretty;

use serde::{Deserialize, Serialize};
use std::{io, path::PathBuf};
use thiserror::Error;
use types::Value;

/// Positional row representation backed by `types::Value`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row(pub Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.0.get(idx)
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}

/// In-memory, fully materialized table: the unit every stage of the
/// pipeline after the catalog operates on. Column names are always
/// lowercase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }
}

/// Named projection of a row keyed by column name, used while building join
/// and rename results where positional indices would be error-prone.
pub type RowMap = std::collections::HashMap<String, Value>;

/// Canonical error type shared across the query pipeline.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("table not found: {0}")]
    TableNotFound(String),
    #[error("schema read error for table {0}: {1}")]
    SchemaReadError(String, String),
    #[error("unknown table: {0}")]
    UnknownTable(String),
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("unresolved column: {0}")]
    UnresolvedColumn(String),
    #[error("ambiguous column: {0}")]
    AmbiguousColumn(String),
    #[error("invalid predicate: {0}")]
    InvalidPredicate(String),
    #[error("type error: {0}")]
    TypeError(String),
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias that carries a `DbError`.
pub type DbResult<T> = Result<T, DbError>;

/// Process-wide, read-only-after-init configuration.
///
/// # Example
/// ```
/// use common::Config;
/// use std::path::PathBuf;
///
/// let config = Config::builder()
///     .data_dir(PathBuf::from("./data"))
///     .parallel_level(4)
///     .build();
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, bon::Builder)]
pub struct Config {
    /// Directory containing `<table>.parquet` files.
    #[builder(default = PathBuf::from("./data"))]
    pub data_dir: PathBuf,
    /// Number of workers in the parallel single-table scan's worker pool.
    #[builder(default = 1)]
    pub parallel_level: usize,
    /// Upper bound on a single chunk's row count in the parallel scan.
    #[builder(default = 50_000)]
    pub max_chunk_size: usize,
    /// Target chunks per worker when sizing the parallel scan.
    #[builder(default = 10)]
    pub num_chunks_per_worker: usize,
    /// Result cache entry time-to-live, in seconds.
    #[builder(default = 3600)]
    pub cache_expiry_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            parallel_level: 1,
            max_chunk_size: 50_000,
            num_chunks_per_worker: 10,
            cache_expiry_secs: 3600,
        }
    }
}

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{Config, DbError, DbResult, Row, RowMap, Table};
    pub use types::{SqlType, Value};
}
