//! Process-wide fatal-error hook.
//!
//! The original library let an application install a function pointer
//! invoked before the process aborts on an unrecoverable error. This is
//! that hook's Rust shape: a one-time-settable boxed closure behind a
//! `OnceLock`, since there is no function-pointer-global idiom in safe
//! Rust.

use std::sync::OnceLock;

type AbortHandler = Box<dyn Fn(&str) + Send + Sync>;

static ABORT_HANDLER: OnceLock<AbortHandler> = OnceLock::new();

/// Installs the process-wide handler invoked on [`crate::Error::Fatal`].
/// Only the first call takes effect; later calls are no-ops, matching the
/// original's "set once at startup" usage pattern.
pub fn set_abort_handler<F>(handler: F)
where
    F: Fn(&str) + Send + Sync + 'static,
{
    let _ = ABORT_HANDLER.set(Box::new(handler));
}

/// Reports a fatal condition: logs it at `error`, invokes the installed
/// handler if any, then aborts the process. Never returns.
pub fn fatal(message: &str) -> ! {
    log::error!(target: "zdb_pool", "fatal error: {message}");
    if let Some(handler) = ABORT_HANDLER.get() {
        handler(message);
    }
    std::process::abort();
}
