//! The background reaper thread.

use std::sync::Arc;

use crate::pool::inner::{LifecycleState, SharedPool};

/// Spawns the reaper loop and stashes its `JoinHandle` on `shared` so
/// `stop` can join it. Named so it's identifiable in a debugger/`/proc`.
pub(crate) fn spawn(shared: Arc<SharedPool>) {
    let for_thread = Arc::clone(&shared);
    let handle = std::thread::Builder::new()
        .name("zdb-pool-reaper".to_string())
        .spawn(move || run(for_thread))
        .expect("failed to spawn reaper thread");
    *shared.reaper.lock().expect("reaper mutex poisoned") = Some(handle);
}

fn run(shared: Arc<SharedPool>) {
    // Only spawned when `reap_interval` is `Some` and non-zero; see
    // `SharedPool::start`.
    let interval = shared
        .options
        .reap_interval
        .expect("reaper thread spawned without a configured reap_interval");
    loop {
        let state = shared.state.lock().expect("pool mutex poisoned");
        if state.lifecycle == LifecycleState::Stopped {
            return;
        }
        let (state, _timed_out) = shared
            .condvar
            .wait_timeout(state, interval)
            .expect("pool mutex poisoned");
        let stopped = state.lifecycle == LifecycleState::Stopped;
        drop(state);
        if stopped {
            return;
        }
        shared.reap_once();
    }
}
