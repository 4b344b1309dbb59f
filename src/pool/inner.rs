//! The pool's shared state: a single `Mutex`-guarded slot list plus a
//! paired `Condvar`, exactly as specified — ping/I/O never happens while
//! holding the mutex during `acquire`, but the reaper does hold it while
//! pinging idle connections (a documented trade-off, not an oversight).

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

use crate::connection::Connection;
use crate::driver::Driver;
use crate::error::Error;
use crate::pool::options::PoolOptionsInner;
use crate::Result;

pub(crate) struct Slot {
    pub(crate) conn: Connection,
    pub(crate) idle_since: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LifecycleState {
    Running,
    Stopped,
}

pub(crate) struct PoolState {
    pub(crate) idle: VecDeque<Slot>,
    pub(crate) active: u32,
    pub(crate) lifecycle: LifecycleState,
}

pub(crate) struct SharedPool {
    pub(crate) url: String,
    pub(crate) driver: Arc<dyn Driver>,
    pub(crate) options: PoolOptionsInner,
    pub(crate) state: Mutex<PoolState>,
    pub(crate) condvar: Condvar,
    pub(crate) reaper: Mutex<Option<JoinHandle<()>>>,
}

impl SharedPool {
    /// Configures, then starts, the pool: opens connections one at a time
    /// up to `min_connections`. A failure to open the very first
    /// connection is reported as `Error::PoolStart`; a failure partway
    /// through the fill is logged and leaves the pool started with
    /// whatever it managed to open. With `min_connections == 0` this does
    /// no I/O at all, so a bad URL or unreachable backend only surfaces
    /// later, on the first `acquire`.
    pub(crate) fn start(
        url: String,
        driver: Arc<dyn Driver>,
        options: PoolOptionsInner,
    ) -> Result<Arc<Self>> {
        let mut idle = VecDeque::new();
        for _ in 0..options.min_connections {
            match driver.open(&url) {
                Ok(session) => {
                    let conn = Connection::new(session, driver.name());
                    if let Some(fetch_size) = options.fetch_size {
                        conn.set_fetch_size(fetch_size);
                    }
                    idle.push_back(Slot {
                        conn,
                        idle_since: Instant::now(),
                    });
                }
                Err(e) => {
                    if idle.is_empty() {
                        return Err(Error::PoolStart(e.to_string()));
                    }
                    log::warn!(target: "zdb_pool::pool", "failed to fill initial connection: {e}");
                    break;
                }
            }
        }
        let idle_count = idle.len() as u32;
        log::info!(target: "zdb_pool::pool", "pool started with {idle_count} connection(s)");

        let reaper_enabled = matches!(options.reap_interval, Some(interval) if !interval.is_zero());

        let shared = Arc::new(SharedPool {
            url,
            driver,
            options,
            state: Mutex::new(PoolState {
                idle,
                active: 0,
                lifecycle: LifecycleState::Running,
            }),
            condvar: Condvar::new(),
            reaper: Mutex::new(None),
        });
        if reaper_enabled {
            crate::pool::reaper::spawn(Arc::clone(&shared));
        }
        Ok(shared)
    }

    /// Checks out an idle connection, preferring the lowest-index (oldest)
    /// one so reuse cooperates with the reaper's rolling-window eviction,
    /// and validates it with a `ping()` taken outside the mutex before
    /// handing it back. A connection that fails the ping is discarded and
    /// the next-oldest idle connection is tried, matching the original
    /// `ConnectionPool_getConnection`'s reap-on-acquire behavior.
    pub(crate) fn acquire(&self) -> Result<Connection> {
        loop {
            let mut state = self.state.lock().expect("pool mutex poisoned");
            if state.lifecycle == LifecycleState::Stopped {
                return Err(Error::api_misuse("acquire called on a stopped pool"));
            }
            if let Some(slot) = state.idle.pop_front() {
                state.active += 1;
                drop(state);
                if slot.conn.ping() {
                    return Ok(slot.conn);
                }
                log::warn!(target: "zdb_pool::pool", "discarding idle connection that failed ping on acquire");
                let mut state = self.state.lock().expect("pool mutex poisoned");
                state.active -= 1;
                continue;
            }
            if state.active >= self.options.max_connections {
                return Err(Error::PoolFull);
            }
            // Open the new connection without holding the mutex.
            state.active += 1;
            drop(state);
            return match self.driver.open(&self.url) {
                Ok(session) => {
                    let conn = Connection::new(session, self.driver.name());
                    if let Some(fetch_size) = self.options.fetch_size {
                        conn.set_fetch_size(fetch_size);
                    }
                    Ok(conn)
                }
                Err(e) => {
                    let mut state = self.state.lock().expect("pool mutex poisoned");
                    state.active -= 1;
                    Err(Error::DriverOpen(e.to_string()))
                }
            };
        }
    }

    /// Returns `conn` to the idle list, clearing any leftover session
    /// state first. A transaction still open is rolled back; a failure
    /// to roll back is logged and swallowed, matching spec's propagation
    /// rules for release-time cleanup.
    pub(crate) fn release(&self, conn: Connection) {
        if conn.in_transaction() {
            if let Err(e) = conn.rollback() {
                log::warn!(target: "zdb_pool::pool", "auto-rollback on release failed: {e}");
            }
        }
        conn.clear();

        let mut state = self.state.lock().expect("pool mutex poisoned");
        state.active = state.active.saturating_sub(1);
        if state.lifecycle == LifecycleState::Stopped {
            // Pool already stopped while this connection was checked
            // out; let it drop instead of re-idling it.
            return;
        }
        // Newest goes to the back; `acquire` pops from the front, so the
        // idle list stays ordered oldest-to-newest the same way the
        // reaper's rolling-window eviction assumes.
        state.idle.push_back(Slot {
            conn,
            idle_since: Instant::now(),
        });
        self.condvar.notify_all();
    }

    pub(crate) fn size(&self) -> u32 {
        let state = self.state.lock().expect("pool mutex poisoned");
        state.active + state.idle.len() as u32
    }

    pub(crate) fn active(&self) -> u32 {
        self.state.lock().expect("pool mutex poisoned").active
    }

    pub(crate) fn is_full(&self) -> bool {
        let state = self.state.lock().expect("pool mutex poisoned");
        state.active >= self.options.max_connections && state.idle.is_empty()
    }

    /// Runs one reap cycle: evicts idle connections past their idle
    /// timeout (never below `min_connections`), evicts any idle
    /// connection that fails a ping, and refills up to
    /// `min_connections` if eviction dropped the pool below it.
    pub(crate) fn reap_once(&self) {
        let mut to_close: Vec<Slot> = Vec::new();
        {
            let mut state = self.state.lock().expect("pool mutex poisoned");
            let floor = self.options.min_connections;

            if let Some(idle_timeout) = self.options.idle_timeout {
                let now = Instant::now();
                while let Some(front) = state.idle.front() {
                    let total = state.active + state.idle.len() as u32;
                    if total <= floor {
                        break;
                    }
                    if now.duration_since(front.idle_since) < idle_timeout {
                        break;
                    }
                    to_close.push(state.idle.pop_front().expect("just checked front"));
                }
            }

            let mut dead = Vec::new();
            for (i, slot) in state.idle.iter_mut().enumerate() {
                if !slot.conn.ping() {
                    dead.push(i);
                }
            }
            for i in dead.into_iter().rev() {
                log::warn!(target: "zdb_pool::pool", "evicting idle connection that failed ping");
                to_close.push(state.idle.remove(i).expect("valid index"));
            }

            let total = state.active + state.idle.len() as u32;
            if total < floor {
                for _ in total..floor {
                    match self.driver.open(&self.url) {
                        Ok(session) => {
                            log::info!(target: "zdb_pool::pool", "reaper replaced an evicted connection");
                            let conn = Connection::new(session, self.driver.name());
                            if let Some(fetch_size) = self.options.fetch_size {
                                conn.set_fetch_size(fetch_size);
                            }
                            state.idle.push_back(Slot {
                                conn,
                                idle_since: Instant::now(),
                            });
                        }
                        Err(e) => {
                            log::warn!(target: "zdb_pool::pool", "reaper failed to refill pool: {e}");
                            break;
                        }
                    }
                }
            }
        }
        drop(to_close);
    }

    pub(crate) fn stop(&self) {
        let drained = {
            let mut state = self.state.lock().expect("pool mutex poisoned");
            state.lifecycle = LifecycleState::Stopped;
            std::mem::take(&mut state.idle)
        };
        self.condvar.notify_all();
        if let Some(handle) = self.reaper.lock().expect("reaper mutex poisoned").take() {
            let _ = handle.join();
        }
        drop(drained);
        log::info!(target: "zdb_pool::pool", "pool stopped");
    }
}
