use std::sync::Arc;
use std::time::Duration;

use zdb_pool::testing::{MockControl, MockDriver};
use zdb_pool::{Error, Pool, Value};

fn build_pool(max: u32, min: u32) -> (Pool, MockControl) {
    let _ = env_logger::builder().is_test(true).try_init();
    let driver = MockDriver::new();
    let control = driver.control();
    let pool = Pool::builder()
        .max_connections(max)
        .min_connections(min)
        .idle_timeout(Some(Duration::from_secs(600)))
        .reap_interval(Some(Duration::from_secs(3600)))
        .build("mock://test", Arc::new(driver))
        .expect("pool should start");
    (pool, control)
}

#[test]
fn basic_crud_via_prepared_statement() {
    let (pool, _control) = build_pool(5, 1);
    let conn = pool.acquire().unwrap();
    conn.execute("create table items", &[]).unwrap();

    let insert = conn
        .prepare_statement("insert into items (name) values (?)")
        .unwrap();
    assert_eq!(insert.get_parameter_count(), 1);
    insert.bind(1, Value::Str("Alice")).unwrap();
    let outcome = insert.execute().unwrap();
    assert_eq!(outcome.rows_changed, 1);
    assert_eq!(conn.last_row_id(), outcome.last_row_id);
    assert_eq!(conn.rows_changed(), 1);

    let rs = conn.execute_query("select id, name from items", &[]).unwrap();
    assert!(rs.next().unwrap());
    assert_eq!(rs.get_string_by_name("name").unwrap(), Some("Alice".to_string()));
    assert!(!rs.is_null_by_name("name").unwrap());
    assert!(!rs.next().unwrap());
}

#[test]
fn execute_with_args_auto_prepares_and_binds() {
    let (pool, _control) = build_pool(5, 1);
    let conn = pool.acquire().unwrap();
    conn.execute("create table items", &[]).unwrap();

    let outcome = conn
        .execute(
            "insert into items (name) values (?)",
            &[Value::Str("Bob")],
        )
        .unwrap();
    assert_eq!(outcome.rows_changed, 1);

    let rs = conn
        .execute_query("select id, name from items where id = ?", &[Value::Long(outcome.last_row_id)])
        .unwrap();
    assert!(rs.next().unwrap());
    assert_eq!(rs.get_string_by_name("name").unwrap(), Some("Bob".to_string()));
    assert!(!rs.next().unwrap());
}

#[test]
fn bind_out_of_range_is_api_misuse() {
    let (pool, _control) = build_pool(5, 1);
    let conn = pool.acquire().unwrap();
    let insert = conn
        .prepare_statement("insert into items (name) values (?)")
        .unwrap();
    let err = insert.bind(2, Value::Str("x")).unwrap_err();
    assert!(matches!(err, Error::ApiMisuse(_)));
}

#[test]
fn bind_values_arity_mismatch_is_api_misuse() {
    let (pool, _control) = build_pool(5, 1);
    let conn = pool.acquire().unwrap();
    let insert = conn
        .prepare_statement("insert into items (name) values (?)")
        .unwrap();
    let err = insert
        .bind_values(&[Value::Str("a"), Value::Str("b")])
        .unwrap_err();
    assert!(matches!(err, Error::ApiMisuse(_)));
}

#[test]
fn null_values_are_distinguishable_from_present_values() {
    let (pool, _control) = build_pool(5, 1);
    let conn = pool.acquire().unwrap();

    let insert = conn
        .prepare_statement("insert into items (name) values (?)")
        .unwrap();
    insert.bind(1, Value::Null).unwrap();
    insert.execute().unwrap();

    let rs = conn.execute_query("select id, name from items", &[]).unwrap();
    assert!(rs.next().unwrap());
    assert!(rs.is_null(2).unwrap());
    assert_eq!(rs.get_string(2).unwrap(), None);
    assert!(!rs.is_null(1).unwrap());
}

#[test]
fn uncommitted_transaction_auto_rolls_back_on_release() {
    let (pool, control) = build_pool(5, 1);
    {
        let conn = pool.acquire().unwrap();
        let insert = conn
            .prepare_statement("insert into items (name) values (?)")
            .unwrap();
        insert.bind(1, Value::Str("seed")).unwrap();
        insert.execute().unwrap();
    }
    assert_eq!(control.row_count(), 1);

    {
        let conn = pool.acquire().unwrap();
        conn.begin_transaction().unwrap();
        let insert = conn
            .prepare_statement("insert into items (name) values (?)")
            .unwrap();
        insert.bind(1, Value::Str("uncommitted")).unwrap();
        insert.execute().unwrap();
        assert_eq!(control.row_count(), 2);
        // `conn` drops here without a commit: the pool's release path
        // must roll it back before the connection goes idle again.
    }
    assert_eq!(control.row_count(), 1);
}

#[test]
fn committed_transaction_survives_release() {
    let (pool, control) = build_pool(5, 1);
    {
        let conn = pool.acquire().unwrap();
        conn.begin_transaction().unwrap();
        let insert = conn
            .prepare_statement("insert into items (name) values (?)")
            .unwrap();
        insert.bind(1, Value::Str("committed")).unwrap();
        insert.execute().unwrap();
        conn.commit().unwrap();
    }
    assert_eq!(control.row_count(), 1);
}

#[test]
fn commit_without_a_transaction_is_api_misuse() {
    let (pool, _control) = build_pool(5, 1);
    let conn = pool.acquire().unwrap();
    assert!(matches!(conn.commit().unwrap_err(), Error::ApiMisuse(_)));
    assert!(matches!(conn.rollback().unwrap_err(), Error::ApiMisuse(_)));
}

#[test]
fn nested_begin_transaction_is_api_misuse() {
    let (pool, _control) = build_pool(5, 1);
    let conn = pool.acquire().unwrap();
    conn.begin_transaction().unwrap();
    assert!(matches!(
        conn.begin_transaction().unwrap_err(),
        Error::ApiMisuse(_)
    ));
    conn.rollback().unwrap();
}

#[test]
fn starting_a_new_query_invalidates_the_previous_result_set() {
    let (pool, _control) = build_pool(5, 1);
    let conn = pool.acquire().unwrap();
    let insert = conn
        .prepare_statement("insert into items (name) values (?)")
        .unwrap();
    insert.bind(1, Value::Str("a")).unwrap();
    insert.execute().unwrap();

    let rs1 = conn.execute_query("select id, name from items", &[]).unwrap();
    let _rs2 = conn.execute_query("select id, name from items", &[]).unwrap();
    assert!(matches!(rs1.next().unwrap_err(), Error::ApiMisuse(_)));
}
