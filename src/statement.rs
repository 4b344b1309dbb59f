//! `PreparedStatement`: a reusable, parameterized statement bound to one
//! [`Connection`].

use std::cell::RefCell;

use crate::connection::Connection;
use crate::driver::{DriverStatement, ExecOutcome};
use crate::error::Error;
use crate::result_set::ResultSet;
use crate::value::Value;
use crate::Result;

/// A statement prepared against a single connection, reusable across any
/// number of `bind`/`execute` cycles.
///
/// Borrows `&'c Connection` so the compiler rejects returning the owning
/// connection to its pool while a statement (or a result set derived from
/// it) is still alive.
pub struct PreparedStatement<'c> {
    conn: &'c Connection,
    inner: RefCell<Box<dyn DriverStatement>>,
}

impl<'c> PreparedStatement<'c> {
    pub(crate) fn new(conn: &'c Connection, inner: Box<dyn DriverStatement>) -> Self {
        PreparedStatement {
            conn,
            inner: RefCell::new(inner),
        }
    }

    pub fn get_parameter_count(&self) -> usize {
        self.inner.borrow().parameter_count()
    }

    /// Binds `value` to the 1-based parameter `index`.
    pub fn bind(&self, index: usize, value: Value<'_>) -> Result<()> {
        let count = self.get_parameter_count();
        if index == 0 || index > count {
            return Err(Error::api_misuse(format!(
                "bind index {index} out of range 1..={count}"
            )));
        }
        self.inner.borrow_mut().bind(index - 1, value)
    }

    /// Binds every value in `values` to parameters `1..=values.len()`;
    /// fails with `ApiMisuse` if the count does not match
    /// [`PreparedStatement::get_parameter_count`].
    pub fn bind_values(&self, values: &[Value<'_>]) -> Result<()> {
        let count = self.get_parameter_count();
        if values.len() != count {
            return Err(Error::api_misuse(format!(
                "bind_values expected {count} values, got {}",
                values.len()
            )));
        }
        for (i, value) in values.iter().enumerate() {
            self.inner.borrow_mut().bind(i, *value)?;
        }
        Ok(())
    }

    pub fn execute(&self) -> Result<ExecOutcome> {
        self.conn.invalidate_cursor();
        let result = self.inner.borrow_mut().execute();
        match &result {
            Ok(outcome) => self.conn.note_outcome(*outcome),
            Err(e) => self.conn.note_error(e),
        }
        result
    }

    pub fn execute_query(&self) -> Result<ResultSet<'c>> {
        self.conn.invalidate_cursor();
        let cursor = self.inner.borrow_mut().execute_query()?;
        Ok(self.conn.install_cursor(cursor))
    }
}
