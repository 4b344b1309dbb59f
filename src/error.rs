//! Error and Result types.

use std::fmt;

/// A specialized `Result` type for `zdb-pool`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error kinds that can be produced by the pool, a connection, a
/// prepared statement or a result set.
///
/// Every variant maps to one of the error kinds described by the
/// specification this crate implements: `Sql`, `DriverOpen`, `PoolFull`,
/// `PoolStart`, `ValidationExhausted`, `ApiMisuse` and `Fatal`, plus the
/// usual `Io`/`UrlParse` conversions a crate built around the `url` crate
/// picks up for free.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A dialect-reported error during a statement, transaction or cursor
    /// call. Carries the dialect's own error message.
    #[error("{0}")]
    Sql(String),

    /// A new session could not be established by the driver.
    #[error("failed to open a new connection: {0}")]
    DriverOpen(String),

    /// The pool has no idle connection and is already at `max_connections`.
    #[error("connection pool is full")]
    PoolFull,

    /// The pool could not create its first connection during `start`.
    #[error("failed to start connection pool: {0}")]
    PoolStart(String),

    /// Reserved for implementations that add a bounded retry loop around
    /// validation; this crate's `acquire` is single-pass and does not
    /// currently produce this variant itself, but callers composing their
    /// own retry policy on top of `acquire` may want to surface it.
    #[error("exhausted validation attempts while acquiring a connection")]
    ValidationExhausted,

    /// The caller violated an API contract: an out-of-range parameter or
    /// column index, a parameter-count mismatch, a nested `begin`, a
    /// `commit`/`rollback` outside of a transaction, or an `acquire` that
    /// raced a `stop`.
    #[error("api misuse: {0}")]
    ApiMisuse(String),

    /// An unrecoverable error, delivered to the configured abort handler
    /// (see [`crate::set_abort_handler`]).
    #[error("fatal error: {0}")]
    Fatal(String),

    /// I/O error surfaced by a driver or by URL handling.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The connection URL could not be parsed.
    #[error(transparent)]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    pub(crate) fn api_misuse(msg: impl fmt::Display) -> Self {
        Error::ApiMisuse(msg.to_string())
    }

    pub(crate) fn sql(msg: impl fmt::Display) -> Self {
        Error::Sql(msg.to_string())
    }
}
