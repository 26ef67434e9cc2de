use crate::{Params, Query, TypeTag, Value};
use std::sync::Arc;
use thiserror::Error;

/// Closed error taxonomy of the persistence layer. Drivers translate every
/// backend failure into one of these; no driver error type escapes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no matching data")]
    NoData,
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("transaction begin failed: {0}")]
    TransactionBegin(String),
    #[error("invalid statement: {0}")]
    Statement(String),
    #[error("bind failed: {0}")]
    Bind(String),
    #[error("execute failed: {0}")]
    Execute(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("commit failed: {0}")]
    Commit(String),
    #[error("rollback failed: {0}")]
    Rollback(String),
    #[error("disconnect failed: {0}")]
    Disconnect(String),
    #[error("driver error: {0}")]
    Driver(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }

    pub fn names(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == name)
            .map(|i| &self.values[i])
    }
}

/// One row of named values headed for an insert or update.
pub type RowValues = Box<[(&'static str, Value)]>;

/// Declared column types, used to classify parameter binds.
pub type FieldTypes = [(String, TypeTag)];

pub fn tag_of(types: &FieldTypes, name: &str) -> Option<TypeTag> {
    types
        .iter()
        .find(|(field, _)| field == name)
        .map(|(_, tag)| *tag)
}

/// Executes compiled SQL against one connection.
///
/// A store owns its connection and its transaction depth; it is the context
/// object of one unit of work, never process-wide state. Transactions are
/// reference counted: only the 0 to 1 transition issues a real begin, only
/// the 1 to 0 transition issues a real commit, and a rollback zeroes the
/// depth unconditionally. Balanced nested begin/commit pairs are transparent
/// passthroughs that never touch the backend.
pub trait Store {
    /// Current transaction nesting depth.
    fn transaction_depth(&self) -> u32;

    fn begin_transaction(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    /// Runs a compiled select; `lock` requests row locks where the dialect
    /// supports them.
    fn select(&mut self, query: &Query, params: &Params, lock: bool) -> Result<Vec<RowLabeled>>;

    /// Fetches the single row whose primary key matches, or [`StoreError::NoData`].
    fn get(&mut self, table: &str, pkey: i64, fields: &FieldTypes, lock: bool)
    -> Result<RowLabeled>;

    fn count(&mut self, query: &Query, params: &Params) -> Result<i64>;

    /// Maximum of a numeric column, 0 for an empty table.
    fn get_max(&mut self, table: &str, column: &str) -> Result<i64>;

    /// Inserts one row or a homogeneous batch through one prepared
    /// statement. The first failing row aborts the whole call; there is no
    /// partial-batch success reporting.
    fn create(&mut self, table: &str, rows: &[RowValues], types: &FieldTypes) -> Result<()>;

    /// Updates by key column, same batch semantics as [`Store::create`].
    fn update(
        &mut self,
        table: &str,
        rows: &[RowValues],
        types: &FieldTypes,
        key_column: &str,
    ) -> Result<()>;

    fn delete(&mut self, table: &str, keys: &[i64], key_column: &str) -> Result<()>;

    /// Closes the connection, rolling back any open transaction first.
    /// Idempotent.
    fn disconnect(&mut self) -> Result<()>;
}
