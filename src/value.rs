//! Bind parameter and raw temporal value types exchanged across the
//! driver boundary.

/// A single bind parameter passed to [`crate::PreparedStatement::bind`].
///
/// Borrowed variants (`Str`/`Blob`) are only required to live for the
/// duration of the `bind`/`execute` call that consumes them; the driver is
/// expected to copy them into its own wire representation before
/// returning, so the core does not need to keep a reference-slot table
/// the way the original C implementation did across its FFI boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Null,
    Int(i32),
    Long(i64),
    Double(f64),
    Str(&'a str),
    Blob(&'a [u8]),
    /// Seconds since the Unix epoch, UTC.
    Timestamp(i64),
}

/// A raw temporal value as reported by a [`crate::driver::DriverCursor`].
///
/// Dialects with a native timestamp type report [`TemporalValue::Numeric`]
/// (seconds since the Unix epoch). Dialects without one (SQLite-like
/// backends storing timestamps as text) report [`TemporalValue::Text`] and
/// leave parsing to the core, via [`crate::datetime::parse_iso8601`].
#[derive(Debug, Clone, PartialEq)]
pub enum TemporalValue {
    Numeric(i64),
    Text(String),
}
