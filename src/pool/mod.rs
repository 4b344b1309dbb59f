//! `Pool`: the bounded, synchronous connection pool.

mod inner;
pub mod options;
mod reaper;

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

pub use options::PoolOptions;

use crate::connection::Connection;
use crate::Result;
use inner::SharedPool;

/// A bounded pool of [`Connection`]s to a single backing store.
///
/// Construct one with [`Pool::builder`]. `Pool` is cheaply `Clone` (an
/// `Arc` around the shared state), matching the teacher's
/// `sqlx_core::pool::Pool`.
#[derive(Clone)]
pub struct Pool {
    shared: Arc<SharedPool>,
}

impl Pool {
    pub fn builder() -> PoolOptions {
        PoolOptions::new()
    }

    pub(crate) fn from_shared(shared: Arc<SharedPool>) -> Self {
        Pool { shared }
    }

    /// Checks out an idle connection, or opens a new one if the pool has
    /// not yet reached `max_connections`. Never blocks: returns
    /// `Error::PoolFull` immediately rather than waiting for a
    /// connection to free up.
    pub fn acquire(&self) -> Result<PooledConnection> {
        let conn = self.shared.acquire()?;
        Ok(PooledConnection {
            pool: Arc::clone(&self.shared),
            conn: Some(conn),
        })
    }

    /// Total connections currently held by the pool, idle or checked
    /// out.
    pub fn size(&self) -> u32 {
        self.shared.size()
    }

    /// Connections currently checked out.
    pub fn active(&self) -> u32 {
        self.shared.active()
    }

    /// True if the pool is at `max_connections` with no idle connection
    /// available; the next `acquire` would fail with `PoolFull`.
    pub fn is_full(&self) -> bool {
        self.shared.is_full()
    }

    pub fn max_connections(&self) -> u32 {
        self.shared.options.max_connections
    }

    pub fn min_connections(&self) -> u32 {
        self.shared.options.min_connections
    }

    /// Runs one reap cycle synchronously, outside of the background
    /// reaper's own schedule. Exposed so callers (and tests) can force a
    /// deterministic sweep rather than waiting on `reap_interval`.
    pub fn reap_once(&self) {
        self.shared.reap_once();
    }

    /// Stops the pool: marks it stopped (any in-flight `acquire` racing
    /// this call observes `stopped` and fails with `ApiMisuse`), joins
    /// the reaper thread, and drops every idle connection.
    pub fn stop(&self) {
        self.shared.stop();
    }

    /// Alias for [`Pool::stop`], kept for API familiarity.
    pub fn close(&self) {
        self.stop();
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("url", &self.shared.url)
            .field("size", &self.size())
            .field("active", &self.active())
            .field("max_connections", &self.max_connections())
            .finish()
    }
}

/// A [`Connection`] checked out from a [`Pool`]. Returned to the pool's
/// idle list on drop (after an auto-rollback of any open transaction and
/// a `clear()`), unless the pool has since been stopped.
pub struct PooledConnection {
    pool: Arc<SharedPool>,
    conn: Option<Connection>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection taken before drop")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection taken before drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}
