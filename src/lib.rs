//! Core of a multi-backend, synchronous SQL connection-pool library.
//!
//! This crate owns the pool lifecycle, the background reaper, the
//! connection/statement/result-set state machine, and the `Driver`
//! trait object boundary a per-dialect adapter implements. It is not
//! meant to be used directly by most applications — pair it with a
//! dialect crate that implements [`driver::Driver`] for MySQL,
//! PostgreSQL, SQLite, Oracle, or similar, and with a facade crate for a
//! more ergonomic surface.

mod abort;
pub mod connection;
pub mod datetime;
pub mod driver;
mod error;
pub mod pool;
pub mod registry;
pub mod result_set;
pub mod statement;
pub mod testing;
pub mod value;

pub use abort::set_abort_handler;
pub use connection::Connection;
pub use driver::{Driver, DriverCursor, DriverSession, DriverStatement, TransactionType};
pub use error::{Error, Result};
pub use pool::{Pool, PoolOptions, PooledConnection};
pub use result_set::ResultSet;
pub use statement::PreparedStatement;
pub use value::Value;

pub use pool::options::{DEFAULT_INITIAL_CONNECTIONS, DEFAULT_MAX_CONNECTIONS};

/// The fetch size new connections start with (`Connection.h`: "the
/// default value is 100").
pub use connection::DEFAULT_FETCH_SIZE;
