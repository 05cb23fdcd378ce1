//! The shared checks against a real Redis
//!
//! Run with `cargo test --test client_tests -- --ignored` after pointing
//! `REDIS_HOST`, `REDIS_PORT`, `REDIS_PSW` and `REDIS_DB` at a disposable
//! database. Every check wipes that database.

use luakv::{Client, Config, LuaKvError};

use super::checks;

fn live_client() -> Client {
    let config = Config::from_env().unwrap();
    Client::open(config).unwrap()
}

#[test]
#[ignore = "needs a live Redis; configure with REDIS_HOST and friends"]
fn test_live_store_runs_lua_procedures() {
    let client = live_client();
    checks::run_all(&client);
}

#[test]
#[ignore = "needs a live Redis; configure with REDIS_HOST and friends"]
fn test_live_store_reports_stale_procedures() {
    let first = live_client();
    let second = live_client();

    first.get("k", None).unwrap();
    second.flush_procedures().unwrap();

    let err = first.get("k", None).unwrap_err();
    assert!(matches!(
        err,
        LuaKvError::Operation { ref source, .. } if matches!(**source, LuaKvError::StaleProcedure { .. })
    ));
}
