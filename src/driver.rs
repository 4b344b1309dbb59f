//! The adapter boundary: traits a per-dialect driver implements so its
//! sessions can be pooled and driven by this crate.
//!
//! `Driver` is the stateless, shareable entry point (one instance per
//! dialect, held behind an `Arc` by every connection the pool opens).
//! `DriverSession`, `DriverStatement` and `DriverCursor` are the per-handle
//! objects it produces, corresponding to the original `Connection`,
//! `PreparedStatement` and `ResultSet` driver hooks.

use crate::value::{TemporalValue, Value};
use crate::Result;

/// Transaction isolation level, as accepted by [`DriverSession::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionType {
    #[default]
    Default,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
    Immediate,
    Exclusive,
}

/// The outcome of a non-query execute: rows affected and, for dialects
/// that support it, the row id generated by the statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_changed: i64,
    pub last_row_id: i64,
}

/// A stateless per-dialect adapter. One implementation per backend
/// (MySQL, PostgreSQL, SQLite, Oracle, ...); the pool holds it behind an
/// `Arc` and calls [`Driver::open`] once per connection it creates.
pub trait Driver: Send + Sync + std::fmt::Debug {
    /// A short identifier for logging, e.g. `"sqlite"`.
    fn name(&self) -> &'static str;

    /// URL schemes this driver claims, e.g. `&["sqlite"]`.
    fn url_schemes(&self) -> &'static [&'static str];

    /// Opens a new session against `url`. Called by the pool to fill a
    /// slot; never called while the pool's mutex is held.
    fn open(&self, url: &str) -> Result<Box<dyn DriverSession>>;
}

/// A single live connection to the backing store, as seen by the core.
/// Not `Sync`: a session is only ever driven by the single thread holding
/// the owning [`crate::Connection`] at a time.
pub trait DriverSession: Send {
    /// Cheap liveness check used by the reaper and by `acquire`'s
    /// optional validation pass. Must not panic; a dead session returns
    /// `false` rather than erroring.
    fn ping(&mut self) -> bool;

    fn begin(&mut self, ty: TransactionType) -> Result<()>;
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;

    /// Runs `sql` with no result set expected (DDL/DML).
    fn execute(&mut self, sql: &str) -> Result<ExecOutcome>;

    /// Runs `sql` and returns a cursor over its result set, without going
    /// through a reusable prepared statement.
    fn execute_query(&mut self, sql: &str) -> Result<Box<dyn DriverCursor>>;

    /// Compiles `sql` into a reusable, independent statement handle.
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn DriverStatement>>;

    fn set_query_timeout_ms(&mut self, ms: u32);
    fn set_max_rows(&mut self, max: u32);

    /// Clears any dialect-side session state (e.g. an open but unread
    /// result set) so the session can be returned to the pool.
    fn clear(&mut self);
}

/// A prepared, reusable statement handle, independent of the session that
/// created it once returned (the session may be driving other statements
/// concurrently from the core's point of view).
pub trait DriverStatement: Send {
    fn parameter_count(&self) -> usize;

    /// `index` is zero-based; the core has already range-checked it
    /// against [`DriverStatement::parameter_count`].
    fn bind(&mut self, index: usize, value: Value<'_>) -> Result<()>;

    fn execute(&mut self) -> Result<ExecOutcome>;
    fn execute_query(&mut self) -> Result<Box<dyn DriverCursor>>;
}

/// A forward-only cursor over a result set.
pub trait DriverCursor: Send {
    fn column_count(&self) -> usize;

    /// `index` is zero-based and already range-checked by the core.
    fn column_name(&self, index: usize) -> &str;
    fn column_size(&self, index: usize) -> Result<i64>;

    /// Advances to the next row. Returns `false` when exhausted.
    fn next(&mut self) -> Result<bool>;

    fn is_null(&self, index: usize) -> bool;

    fn get_string(&self, index: usize) -> Result<Option<String>>;
    fn get_int(&self, index: usize) -> Result<i64>;
    fn get_double(&self, index: usize) -> Result<f64>;
    fn get_blob(&self, index: usize) -> Result<Option<Vec<u8>>>;

    /// Raw temporal value; the core resolves this into either a unix
    /// timestamp or a broken-down [`crate::datetime::DateTime`] depending
    /// on what the caller asked for, parsing text with
    /// [`crate::datetime::parse_iso8601`] when the dialect has no native
    /// temporal type.
    fn get_temporal(&self, index: usize) -> Result<Option<TemporalValue>>;
}
