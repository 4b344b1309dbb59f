//! `Connection`: a single live session to the backing store, plus the
//! per-session tunables and transaction state the original library
//! attaches to it.

use std::cell::{Cell, RefCell};
use std::time::Instant;

use crate::driver::{DriverCursor, DriverSession, ExecOutcome, TransactionType};
use crate::error::Error;
use crate::result_set::ResultSet;
use crate::statement::PreparedStatement;
use crate::value::Value;
use crate::Result;

pub(crate) struct CursorSlot {
    pub(crate) generation: u64,
    pub(crate) cursor: Box<dyn DriverCursor>,
}

/// A connection checked out from (or about to be returned to) a [`crate::Pool`].
///
/// All methods take `&self`: the driver session is held behind a
/// `RefCell`, so a [`PreparedStatement`] or a [`ResultSet`] can borrow
/// `&'c Connection` and coexist with other reads, while the borrow
/// checker still guarantees neither can outlive the `Connection` they
/// were produced from — a `Connection` cannot be returned to the pool
/// (which requires owning it outright) while any such borrow is alive.
pub struct Connection {
    pub(crate) session: RefCell<Box<dyn DriverSession>>,
    pub(crate) driver_name: &'static str,
    pub(crate) created_at: Instant,
    pub(crate) last_used: Cell<Instant>,
    in_transaction: Cell<bool>,
    query_timeout_ms: Cell<u32>,
    max_rows: Cell<u32>,
    fetch_size: Cell<u32>,
    last_error: RefCell<Option<String>>,
    cursor_generation: Cell<u64>,
    pub(crate) cursor: RefCell<Option<CursorSlot>>,
    last_row_id: Cell<i64>,
    rows_changed: Cell<i64>,
}

/// Matches `Connection.h`'s documented default fetch size ("the default
/// value is 100").
pub const DEFAULT_FETCH_SIZE: u32 = 100;

impl Connection {
    pub(crate) fn new(session: Box<dyn DriverSession>, driver_name: &'static str) -> Self {
        let now = Instant::now();
        Connection {
            session: RefCell::new(session),
            driver_name,
            created_at: now,
            last_used: Cell::new(now),
            in_transaction: Cell::new(false),
            query_timeout_ms: Cell::new(0),
            max_rows: Cell::new(0),
            fetch_size: Cell::new(DEFAULT_FETCH_SIZE),
            last_error: RefCell::new(None),
            cursor_generation: Cell::new(0),
            cursor: RefCell::new(None),
            last_row_id: Cell::new(0),
            rows_changed: Cell::new(0),
        }
    }

    fn touch(&self) {
        self.last_used.set(Instant::now());
    }

    /// How long ago this connection was last used (bound/executed/pinged).
    pub fn idle_duration(&self) -> std::time::Duration {
        self.last_used.get().elapsed()
    }

    /// How long this connection has been open.
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    pub(crate) fn note_error(&self, err: &Error) {
        if let Error::Sql(msg) = err {
            *self.last_error.borrow_mut() = Some(msg.clone());
        }
    }

    /// Cheap liveness probe; never surfaces an error, matching
    /// `Connection_ping`'s "returns true/false" contract.
    pub fn ping(&self) -> bool {
        self.touch();
        self.session.borrow_mut().ping()
    }

    pub fn begin_transaction(&self) -> Result<()> {
        self.begin_transaction_type(TransactionType::Default)
    }

    pub fn begin_transaction_type(&self, ty: TransactionType) -> Result<()> {
        if self.in_transaction.get() {
            return Err(Error::api_misuse("begin_transaction called while already in a transaction"));
        }
        self.touch();
        let result = self.session.borrow_mut().begin(ty);
        match &result {
            Ok(()) => self.in_transaction.set(true),
            Err(e) => self.note_error(e),
        }
        result
    }

    pub fn commit(&self) -> Result<()> {
        if !self.in_transaction.get() {
            return Err(Error::api_misuse("commit called outside of a transaction"));
        }
        self.touch();
        let result = self.session.borrow_mut().commit();
        self.in_transaction.set(false);
        if let Err(e) = &result {
            self.note_error(e);
        }
        result
    }

    pub fn rollback(&self) -> Result<()> {
        if !self.in_transaction.get() {
            return Err(Error::api_misuse("rollback called outside of a transaction"));
        }
        self.touch();
        self.invalidate_cursor();
        let result = self.session.borrow_mut().rollback();
        self.in_transaction.set(false);
        if let Err(e) = &result {
            self.note_error(e);
        }
        result
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction.get()
    }

    /// Executes `sql`, which must not itself embed any value from `args`.
    /// When `args` is non-empty this internally prepares `sql`, binds
    /// `args` in order, and executes the bound statement, so callers never
    /// need to splice values into the SQL text themselves.
    pub fn execute(&self, sql: &str, args: &[Value<'_>]) -> Result<ExecOutcome> {
        if !args.is_empty() {
            let stmt = self.prepare_statement(sql)?;
            stmt.bind_values(args)?;
            return stmt.execute();
        }
        self.touch();
        self.invalidate_cursor();
        let result = self.session.borrow_mut().execute(sql);
        match &result {
            Ok(outcome) => self.note_outcome(*outcome),
            Err(e) => self.note_error(e),
        }
        result
    }

    pub(crate) fn note_outcome(&self, outcome: ExecOutcome) {
        self.last_row_id.set(outcome.last_row_id);
        self.rows_changed.set(outcome.rows_changed);
    }

    /// Runs `sql` as a query, which must not itself embed any value from
    /// `args`. When `args` is non-empty this internally prepares `sql`,
    /// binds `args` in order, and runs the bound statement as a query.
    pub fn execute_query(&self, sql: &str, args: &[Value<'_>]) -> Result<ResultSet<'_>> {
        if !args.is_empty() {
            let stmt = self.prepare_statement(sql)?;
            stmt.bind_values(args)?;
            return stmt.execute_query();
        }
        self.touch();
        self.invalidate_cursor();
        let cursor = self.session.borrow_mut().execute_query(sql);
        match cursor {
            Ok(cursor) => Ok(self.install_cursor(cursor)),
            Err(e) => {
                self.note_error(&e);
                Err(e)
            }
        }
    }

    pub fn prepare_statement(&self, sql: &str) -> Result<PreparedStatement<'_>> {
        self.touch();
        let stmt = self.session.borrow_mut().prepare(sql);
        match stmt {
            Ok(inner) => Ok(PreparedStatement::new(self, inner)),
            Err(e) => {
                self.note_error(&e);
                Err(e)
            }
        }
    }

    /// Discards any open result set and dialect-side session state so
    /// the connection is safe to return to the pool or reuse.
    pub fn clear(&self) {
        self.invalidate_cursor();
        self.in_transaction.set(false);
        self.session.borrow_mut().clear();
    }

    pub fn last_row_id(&self) -> i64 {
        self.last_row_id.get()
    }

    pub fn rows_changed(&self) -> i64 {
        self.rows_changed.get()
    }

    pub fn get_last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    pub fn query_timeout_ms(&self) -> u32 {
        self.query_timeout_ms.get()
    }

    pub fn set_query_timeout_ms(&self, ms: u32) {
        self.query_timeout_ms.set(ms);
        self.session.borrow_mut().set_query_timeout_ms(ms);
    }

    pub fn max_rows(&self) -> u32 {
        self.max_rows.get()
    }

    pub fn set_max_rows(&self, max: u32) {
        self.max_rows.set(max);
        self.session.borrow_mut().set_max_rows(max);
    }

    pub fn fetch_size(&self) -> u32 {
        self.fetch_size.get()
    }

    pub fn set_fetch_size(&self, rows: u32) {
        self.fetch_size.set(rows);
    }

    /// Checks a URL scheme against the installed driver registry
    /// (`Connection_isSupported` in the original).
    pub fn is_supported(scheme: &str) -> bool {
        crate::registry::is_supported(scheme)
    }

    pub(crate) fn invalidate_cursor(&self) {
        self.cursor_generation.set(self.cursor_generation.get().wrapping_add(1));
        *self.cursor.borrow_mut() = None;
    }

    pub(crate) fn install_cursor(&self, cursor: Box<dyn DriverCursor>) -> ResultSet<'_> {
        let generation = self.cursor_generation.get().wrapping_add(1);
        self.cursor_generation.set(generation);
        *self.cursor.borrow_mut() = Some(CursorSlot { generation, cursor });
        ResultSet::new(self, generation, self.fetch_size.get())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("driver", &self.driver_name)
            .field("in_transaction", &self.in_transaction.get())
            .finish()
    }
}
