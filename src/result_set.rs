//! `ResultSet`: a forward-only cursor over the rows produced by a query.

use std::cell::Cell;

use crate::connection::Connection;
use crate::datetime::{civil_from_timestamp, parse_iso8601, DateTime};
use crate::error::Error;
use crate::value::TemporalValue;
use crate::Result;

/// A cursor produced by [`Connection::execute_query`] or
/// [`crate::PreparedStatement::execute_query`].
///
/// Borrows `&'c Connection`, which both prevents the connection
/// returning to its pool while the result set is alive and lets the core
/// enforce the "only one live result set per connection" rule at
/// runtime: starting a new query bumps a generation counter on the
/// connection, and every accessor here checks it still owns the current
/// generation before touching the underlying driver cursor.
pub struct ResultSet<'c> {
    conn: &'c Connection,
    generation: u64,
    fetch_size: Cell<u32>,
}

impl<'c> ResultSet<'c> {
    pub(crate) fn new(conn: &'c Connection, generation: u64, fetch_size: u32) -> Self {
        ResultSet {
            conn,
            generation,
            fetch_size: Cell::new(fetch_size),
        }
    }

    fn with_cursor<T>(&self, f: impl FnOnce(&mut dyn crate::driver::DriverCursor) -> Result<T>) -> Result<T> {
        let mut slot = self.conn.cursor.borrow_mut();
        match slot.as_mut() {
            Some(s) if s.generation == self.generation => f(s.cursor.as_mut()),
            _ => Err(Error::api_misuse(
                "result set used after a later query invalidated it",
            )),
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let count = self.with_cursor(|c| Ok(c.column_count()))?;
        if index == 0 || index > count {
            return Err(Error::api_misuse(format!(
                "column index {index} out of range 1..={count}"
            )));
        }
        Ok(())
    }

    pub fn column_count(&self) -> Result<usize> {
        self.with_cursor(|c| Ok(c.column_count()))
    }

    pub fn column_name(&self, index: usize) -> Result<String> {
        self.check_index(index)?;
        self.with_cursor(|c| Ok(c.column_name(index - 1).to_owned()))
    }

    pub fn column_size(&self, index: usize) -> Result<i64> {
        self.check_index(index)?;
        self.with_cursor(|c| c.column_size(index - 1))
    }

    /// Column names are matched case-sensitively, per the original
    /// `*ByName` accessors.
    fn find_column(&self, name: &str) -> Result<usize> {
        let count = self.column_count()?;
        for i in 1..=count {
            if self.column_name(i)? == name {
                return Ok(i);
            }
        }
        Err(Error::api_misuse(format!("no such column: {name}")))
    }

    /// Advances to the next row. Returns `false` once exhausted.
    pub fn next(&self) -> Result<bool> {
        self.with_cursor(|c| c.next())
    }

    pub fn is_null(&self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        self.with_cursor(|c| Ok(c.is_null(index - 1)))
    }

    pub fn is_null_by_name(&self, name: &str) -> Result<bool> {
        self.is_null(self.find_column(name)?)
    }

    pub fn get_string(&self, index: usize) -> Result<Option<String>> {
        self.check_index(index)?;
        self.with_cursor(|c| c.get_string(index - 1))
    }

    pub fn get_string_by_name(&self, name: &str) -> Result<Option<String>> {
        self.get_string(self.find_column(name)?)
    }

    pub fn get_int(&self, index: usize) -> Result<i32> {
        self.check_index(index)?;
        self.with_cursor(|c| c.get_int(index - 1)).map(|v| v as i32)
    }

    pub fn get_int_by_name(&self, name: &str) -> Result<i32> {
        self.get_int(self.find_column(name)?)
    }

    pub fn get_long(&self, index: usize) -> Result<i64> {
        self.check_index(index)?;
        self.with_cursor(|c| c.get_int(index - 1))
    }

    pub fn get_long_by_name(&self, name: &str) -> Result<i64> {
        self.get_long(self.find_column(name)?)
    }

    pub fn get_double(&self, index: usize) -> Result<f64> {
        self.check_index(index)?;
        self.with_cursor(|c| c.get_double(index - 1))
    }

    pub fn get_double_by_name(&self, name: &str) -> Result<f64> {
        self.get_double(self.find_column(name)?)
    }

    pub fn get_blob(&self, index: usize) -> Result<Option<Vec<u8>>> {
        self.check_index(index)?;
        self.with_cursor(|c| c.get_blob(index - 1))
    }

    pub fn get_blob_by_name(&self, name: &str) -> Result<Option<Vec<u8>>> {
        self.get_blob(self.find_column(name)?)
    }

    /// Seconds since the Unix epoch. For dialects without a native
    /// timestamp type, a stored ISO-8601 string is parsed here.
    pub fn get_timestamp(&self, index: usize) -> Result<Option<i64>> {
        self.check_index(index)?;
        let raw = self.with_cursor(|c| c.get_temporal(index - 1))?;
        match raw {
            None => Ok(None),
            Some(TemporalValue::Numeric(secs)) => Ok(Some(secs)),
            Some(TemporalValue::Text(text)) => parse_iso8601(&text)
                .map(Some)
                .ok_or_else(|| Error::sql(format!("unparseable timestamp: {text:?}"))),
        }
    }

    pub fn get_timestamp_by_name(&self, name: &str) -> Result<Option<i64>> {
        self.get_timestamp(self.find_column(name)?)
    }

    /// Broken-down calendar fields, UTC.
    pub fn get_date_time(&self, index: usize) -> Result<Option<DateTime>> {
        Ok(self.get_timestamp(index)?.map(civil_from_timestamp))
    }

    pub fn get_date_time_by_name(&self, name: &str) -> Result<Option<DateTime>> {
        self.get_date_time(self.find_column(name)?)
    }

    pub fn fetch_size(&self) -> u32 {
        self.fetch_size.get()
    }

    pub fn set_fetch_size(&self, rows: u32) {
        self.fetch_size.set(rows);
    }
}
