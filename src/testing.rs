//! An in-memory driver backing the integration tests under `tests/`,
//! grounded in `sqlx-core/src/mock.rs`'s "fake backend" pattern: a
//! dependency-free stand-in for a real dialect so the pool, connection
//! and result-set state machine can be exercised without a database.
//!
//! The mock understands a tiny fixed schema (`items(id, name)`) and a
//! handful of statement shapes (`insert`, `select`, `select ... where id
//! = ?`, `delete`) rather than real SQL, which is all the literal test
//! scenarios need.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use crate::driver::{Driver, DriverCursor, DriverSession, DriverStatement, ExecOutcome, TransactionType};
use crate::error::Error;
use crate::value::{TemporalValue, Value};
use crate::Result;

#[derive(Clone, Debug)]
struct Row {
    id: i64,
    name: Option<String>,
}

#[derive(Clone, Debug, Default)]
enum Stored {
    #[default]
    Null,
    Long(i64),
    Str(String),
}

impl From<Value<'_>> for Stored {
    fn from(v: Value<'_>) -> Self {
        match v {
            Value::Null => Stored::Null,
            Value::Int(i) => Stored::Long(i as i64),
            Value::Long(i) => Stored::Long(i),
            Value::Double(d) => Stored::Str(d.to_string()),
            Value::Str(s) => Stored::Str(s.to_string()),
            Value::Blob(b) => Stored::Str(String::from_utf8_lossy(b).into_owned()),
            Value::Timestamp(t) => Stored::Long(t),
        }
    }
}

struct MockShared {
    table: Mutex<Vec<Row>>,
    next_id: AtomicI64,
    fail_next_open: AtomicBool,
    fail_ping_once: AtomicBool,
    open_count: AtomicI64,
}

/// A handle to the state backing a [`MockDriver`], so a test can flip
/// failure switches after the pool has already been built.
#[derive(Clone)]
pub struct MockControl {
    shared: Arc<MockShared>,
}

impl MockControl {
    /// The next call to [`Driver::open`] fails with `DriverOpen`.
    pub fn fail_next_open(&self) {
        self.shared.fail_next_open.store(true, Ordering::SeqCst);
    }

    /// The next `ping()` call, on any session, returns `false` once.
    pub fn fail_ping_once(&self) {
        self.shared.fail_ping_once.store(true, Ordering::SeqCst);
    }

    pub fn row_count(&self) -> usize {
        self.shared.table.lock().expect("mock table poisoned").len()
    }

    pub fn open_count(&self) -> i64 {
        self.shared.open_count.load(Ordering::SeqCst)
    }
}

/// A stateless, in-memory stand-in for a real dialect driver.
#[derive(Clone)]
pub struct MockDriver {
    shared: Arc<MockShared>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    pub fn new() -> Self {
        MockDriver {
            shared: Arc::new(MockShared {
                table: Mutex::new(Vec::new()),
                next_id: AtomicI64::new(1),
                fail_next_open: AtomicBool::new(false),
                fail_ping_once: AtomicBool::new(false),
                open_count: AtomicI64::new(0),
            }),
        }
    }

    pub fn control(&self) -> MockControl {
        MockControl {
            shared: self.shared.clone(),
        }
    }
}

impl std::fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDriver").finish()
    }
}

impl Driver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn url_schemes(&self) -> &'static [&'static str] {
        &["mock"]
    }

    fn open(&self, _url: &str) -> Result<Box<dyn DriverSession>> {
        if self.shared.fail_next_open.swap(false, Ordering::SeqCst) {
            return Err(Error::DriverOpen("mock: forced open failure".into()));
        }
        self.shared.open_count.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            shared: self.shared.clone(),
            snapshot: None,
        }))
    }
}

struct MockSession {
    shared: Arc<MockShared>,
    snapshot: Option<Vec<Row>>,
}

impl MockSession {
    fn run(&self, sql: &str, params: &[Stored]) -> Result<(ExecOutcome, Vec<Row>)> {
        let sql_lower = sql.trim().to_ascii_lowercase();
        if sql_lower == "fail" {
            return Err(Error::sql("mock: forced statement failure"));
        }
        let mut table = self.shared.table.lock().expect("mock table poisoned");
        if sql_lower.starts_with("create") {
            return Ok((ExecOutcome::default(), Vec::new()));
        }
        if sql_lower.starts_with("insert") {
            let name = match params.first() {
                Some(Stored::Str(s)) => Some(s.clone()),
                Some(Stored::Null) | None => None,
                Some(Stored::Long(n)) => Some(n.to_string()),
            };
            let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
            table.push(Row { id, name });
            return Ok((
                ExecOutcome {
                    rows_changed: 1,
                    last_row_id: id,
                },
                Vec::new(),
            ));
        }
        if sql_lower.starts_with("delete") {
            let n = table.len() as i64;
            table.clear();
            return Ok((
                ExecOutcome {
                    rows_changed: n,
                    last_row_id: 0,
                },
                Vec::new(),
            ));
        }
        if sql_lower.starts_with("select") {
            let rows = if sql_lower.contains("where") {
                let target = match params.first() {
                    Some(Stored::Long(n)) => *n,
                    _ => return Err(Error::api_misuse("select ... where id = ? requires a numeric parameter")),
                };
                table.iter().filter(|r| r.id == target).cloned().collect()
            } else {
                table.clone()
            };
            return Ok((ExecOutcome::default(), rows));
        }
        Err(Error::api_misuse(format!("mock driver does not understand: {sql}")))
    }
}

impl DriverSession for MockSession {
    fn ping(&mut self) -> bool {
        !self.shared.fail_ping_once.swap(false, Ordering::SeqCst)
    }

    fn begin(&mut self, _ty: TransactionType) -> Result<()> {
        let table = self.shared.table.lock().expect("mock table poisoned");
        self.snapshot = Some(table.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.snapshot = None;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if let Some(snapshot) = self.snapshot.take() {
            *self.shared.table.lock().expect("mock table poisoned") = snapshot;
        }
        Ok(())
    }

    fn execute(&mut self, sql: &str) -> Result<ExecOutcome> {
        self.run(sql, &[]).map(|(outcome, _)| outcome)
    }

    fn execute_query(&mut self, sql: &str) -> Result<Box<dyn DriverCursor>> {
        let (_, rows) = self.run(sql, &[])?;
        Ok(Box::new(MockCursor { rows, pos: None }))
    }

    fn prepare(&mut self, sql: &str) -> Result<Box<dyn DriverStatement>> {
        let param_count = sql.matches('?').count();
        Ok(Box::new(MockStatement {
            session_shared: self.shared.clone(),
            sql: sql.to_string(),
            params: vec![Stored::Null; param_count],
        }))
    }

    fn set_query_timeout_ms(&mut self, _ms: u32) {}
    fn set_max_rows(&mut self, _max: u32) {}

    fn clear(&mut self) {
        self.snapshot = None;
    }
}

struct MockStatement {
    session_shared: Arc<MockShared>,
    sql: String,
    params: Vec<Stored>,
}

impl DriverStatement for MockStatement {
    fn parameter_count(&self) -> usize {
        self.params.len()
    }

    fn bind(&mut self, index: usize, value: Value<'_>) -> Result<()> {
        self.params[index] = Stored::from(value);
        Ok(())
    }

    fn execute(&mut self) -> Result<ExecOutcome> {
        let session = MockSession {
            shared: self.session_shared.clone(),
            snapshot: None,
        };
        session.run(&self.sql, &self.params).map(|(outcome, _)| outcome)
    }

    fn execute_query(&mut self) -> Result<Box<dyn DriverCursor>> {
        let session = MockSession {
            shared: self.session_shared.clone(),
            snapshot: None,
        };
        let (_, rows) = session.run(&self.sql, &self.params)?;
        Ok(Box::new(MockCursor { rows, pos: None }))
    }
}

struct MockCursor {
    rows: Vec<Row>,
    pos: Option<usize>,
}

impl MockCursor {
    fn current(&self) -> Result<&Row> {
        let pos = self.pos.ok_or_else(|| Error::api_misuse("next() was not called"))?;
        self.rows.get(pos).ok_or_else(|| Error::api_misuse("cursor exhausted"))
    }
}

impl DriverCursor for MockCursor {
    fn column_count(&self) -> usize {
        2
    }

    fn column_name(&self, index: usize) -> &str {
        match index {
            0 => "id",
            _ => "name",
        }
    }

    fn column_size(&self, index: usize) -> Result<i64> {
        let row = self.current()?;
        Ok(match index {
            0 => row.id.to_string().len() as i64,
            _ => row.name.as_ref().map(|s| s.len() as i64).unwrap_or(0),
        })
    }

    fn next(&mut self) -> Result<bool> {
        let next_pos = self.pos.map(|p| p + 1).unwrap_or(0);
        self.pos = Some(next_pos);
        Ok(next_pos < self.rows.len())
    }

    fn is_null(&self, index: usize) -> bool {
        match self.current() {
            Ok(row) => index == 1 && row.name.is_none(),
            Err(_) => false,
        }
    }

    fn get_string(&self, index: usize) -> Result<Option<String>> {
        let row = self.current()?;
        Ok(match index {
            0 => Some(row.id.to_string()),
            _ => row.name.clone(),
        })
    }

    fn get_int(&self, index: usize) -> Result<i64> {
        let row = self.current()?;
        match index {
            0 => Ok(row.id),
            _ => Err(Error::sql("column 2 (name) is not numeric")),
        }
    }

    fn get_double(&self, index: usize) -> Result<f64> {
        self.get_int(index).map(|v| v as f64)
    }

    fn get_blob(&self, index: usize) -> Result<Option<Vec<u8>>> {
        Ok(self.get_string(index)?.map(String::into_bytes))
    }

    fn get_temporal(&self, _index: usize) -> Result<Option<TemporalValue>> {
        Ok(None)
    }
}
