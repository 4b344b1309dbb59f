use std::sync::Arc;
use std::time::Duration;

use zdb_pool::testing::{MockControl, MockDriver};
use zdb_pool::{Error, Pool};

fn build_pool(max: u32, min: u32, idle_timeout: Duration) -> (Pool, MockControl) {
    let _ = env_logger::builder().is_test(true).try_init();
    let driver = MockDriver::new();
    let control = driver.control();
    let pool = Pool::builder()
        .max_connections(max)
        .min_connections(min)
        .idle_timeout(Some(idle_timeout))
        .reap_interval(Some(Duration::from_secs(3600)))
        .build("mock://test", Arc::new(driver))
        .expect("pool should start");
    (pool, control)
}

#[test]
fn pool_start_fails_fast_when_driver_cannot_open() {
    let driver = MockDriver::new();
    let control = driver.control();
    control.fail_next_open();
    let err = Pool::builder()
        .min_connections(1)
        .build("mock://test", Arc::new(driver))
        .unwrap_err();
    assert!(matches!(err, Error::PoolStart(_)));
}

#[test]
fn acquire_fails_fast_when_pool_is_full() {
    let (pool, _control) = build_pool(1, 1, Duration::from_secs(600));

    let first = pool.acquire().unwrap();
    assert!(pool.is_full());
    let err = pool.acquire().unwrap_err();
    assert!(matches!(err, Error::PoolFull));

    drop(first);
    assert!(!pool.is_full());
    let _second = pool.acquire().unwrap();
}

#[test]
fn acquire_opens_a_fresh_connection_up_to_max() {
    let (pool, control) = build_pool(2, 0, Duration::from_secs(600));
    assert_eq!(pool.size(), 0);
    assert_eq!(control.open_count(), 0);

    let a = pool.acquire().unwrap();
    let b = pool.acquire().unwrap();
    assert_eq!(pool.active(), 2);
    assert_eq!(control.open_count(), 2);
    assert!(matches!(pool.acquire().unwrap_err(), Error::PoolFull));

    drop(a);
    drop(b);
    assert_eq!(pool.active(), 0);
    assert_eq!(pool.size(), 2);
}

#[test]
fn min_connections_zero_defers_a_bad_url_failure_past_start() {
    let driver = MockDriver::new();
    let control = driver.control();
    control.fail_next_open();
    // With no initial connections to fill, `start` does no I/O and
    // cannot observe the bad driver; the failure only surfaces once
    // something actually tries to open a connection.
    let pool = Pool::builder()
        .min_connections(0)
        .build("mock://test", Arc::new(driver))
        .expect("pool with no initial connections should start");
    assert_eq!(control.open_count(), 0);
    let err = pool.acquire().unwrap_err();
    assert!(matches!(err, Error::DriverOpen(_)));
}

#[test]
fn acquire_discards_an_idle_connection_that_fails_ping_and_opens_a_replacement() {
    let (pool, control) = build_pool(5, 1, Duration::from_secs(600));
    assert_eq!(control.open_count(), 1);

    control.fail_ping_once();
    let conn = pool.acquire().unwrap();
    assert!(conn.ping());
    assert_eq!(control.open_count(), 2);
    assert_eq!(pool.active(), 1);
}

#[test]
fn reaper_never_evicts_below_min_connections() {
    let (pool, control) = build_pool(5, 2, Duration::from_millis(5));
    assert_eq!(pool.size(), 2);

    std::thread::sleep(Duration::from_millis(20));
    pool.reap_once();

    assert_eq!(pool.size(), 2);
    assert_eq!(control.open_count(), 2);
}

#[test]
fn idle_connections_past_timeout_are_reaped_above_the_floor() {
    let (pool, control) = build_pool(5, 1, Duration::from_millis(5));
    {
        let extra = pool.acquire().unwrap();
        drop(extra);
    }
    assert_eq!(pool.size(), 1);

    let a = pool.acquire().unwrap();
    let b = pool.acquire().unwrap();
    drop(a);
    drop(b);
    assert_eq!(pool.size(), 2);

    std::thread::sleep(Duration::from_millis(20));
    pool.reap_once();

    // Floor is 1: the reaper may evict the idle excess but never past it.
    assert!(pool.size() >= 1);
    assert!(control.open_count() >= 1);
}

#[test]
fn failed_ping_evicts_and_pool_refills_to_floor() {
    let (pool, control) = build_pool(5, 1, Duration::from_secs(600));
    assert_eq!(pool.size(), 1);
    assert_eq!(control.open_count(), 1);

    control.fail_ping_once();
    pool.reap_once();

    assert_eq!(pool.size(), 1);
    assert_eq!(control.open_count(), 2);
}

#[test]
fn stop_drains_idle_connections_and_rejects_further_acquire() {
    let (pool, _control) = build_pool(5, 2, Duration::from_secs(600));
    assert_eq!(pool.size(), 2);

    pool.stop();

    assert_eq!(pool.size(), 0);
    assert!(matches!(pool.acquire().unwrap_err(), Error::ApiMisuse(_)));
}
