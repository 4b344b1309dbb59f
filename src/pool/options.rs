//! `PoolOptions`: the fluent builder and the only supported construction
//! path for a [`super::Pool`], mirroring the teacher's
//! `sqlx_core::pool::options::PoolOptions`.

use std::sync::Arc;
use std::time::Duration;

use crate::driver::Driver;
use crate::error::Error;
use crate::pool::inner::SharedPool;
use crate::pool::Pool;
use crate::Result;

/// Default ceiling on live connections, mirroring
/// `SQL_DEFAULT_MAX_CONNECTIONS` from the original library.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// Default floor on live connections the pool starts with and never
/// reaps below.
pub const DEFAULT_INITIAL_CONNECTIONS: u32 = 0;

#[derive(Debug, Clone)]
pub(crate) struct PoolOptionsInner {
    pub(crate) max_connections: u32,
    pub(crate) min_connections: u32,
    pub(crate) idle_timeout: Option<Duration>,
    /// `None` (or `Some(Duration::ZERO)`) disables the reaper thread.
    pub(crate) reap_interval: Option<Duration>,
    /// Parsed from the `fetch-size` query parameter on the pool's URL, if
    /// present, and mirrored onto every connection the pool opens.
    pub(crate) fetch_size: Option<u32>,
}

/// Builder for a [`Pool`]. Every tunable has a paired getter, following
/// the teacher's naming convention.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    inner: PoolOptionsInner,
}

impl Default for PoolOptions {
    fn default() -> Self {
        PoolOptions {
            inner: PoolOptionsInner {
                max_connections: DEFAULT_MAX_CONNECTIONS,
                min_connections: DEFAULT_INITIAL_CONNECTIONS,
                idle_timeout: Some(Duration::from_secs(10 * 60)),
                reap_interval: Some(Duration::from_secs(60)),
                fetch_size: None,
            },
        }
    }
}

impl PoolOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.inner.max_connections = n;
        self
    }

    pub fn get_max_connections(&self) -> u32 {
        self.inner.max_connections
    }

    /// Also the pool's idle floor: the reaper never closes an idle
    /// connection if doing so would drop the total below this count.
    pub fn min_connections(mut self, n: u32) -> Self {
        self.inner.min_connections = n;
        self
    }

    pub fn get_min_connections(&self) -> u32 {
        self.inner.min_connections
    }

    /// `None` disables idle eviction entirely.
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.inner.idle_timeout = timeout;
        self
    }

    pub fn get_idle_timeout(&self) -> Option<Duration> {
        self.inner.idle_timeout
    }

    /// `None` disables the background reaper thread entirely.
    pub fn reap_interval(mut self, interval: Option<Duration>) -> Self {
        self.inner.reap_interval = interval;
        self
    }

    pub fn get_reap_interval(&self) -> Option<Duration> {
        self.inner.reap_interval
    }

    /// Builds and starts a [`Pool`] against `url` using `driver`,
    /// filling it with `min_connections` connections. A failure to open
    /// the very first connection is reported as `Error::PoolStart`;
    /// spawns the reaper thread on success unless the reap interval is
    /// disabled. The `fetch-size` query parameter, if present on `url`,
    /// is parsed here and mirrored onto every connection the pool opens.
    pub fn build(mut self, url: &str, driver: Arc<dyn Driver>) -> Result<Pool> {
        if self.inner.min_connections > self.inner.max_connections {
            return Err(Error::api_misuse(
                "min_connections must not exceed max_connections",
            ));
        }
        let parsed = url::Url::parse(url)?;
        for (key, value) in parsed.query_pairs() {
            if key == "fetch-size" {
                let fetch_size: u32 = value.parse().map_err(|_| {
                    Error::api_misuse(format!("invalid fetch-size query parameter: {value:?}"))
                })?;
                self.inner.fetch_size = Some(fetch_size);
            }
        }
        let shared = SharedPool::start(url.to_string(), driver, self.inner)?;
        Ok(Pool::from_shared(shared))
    }
}
