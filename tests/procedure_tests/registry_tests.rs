//! Tests for the procedure registry
//!
//! These tests verify:
//! - Sources load by name
//! - Handles are registered once and cached per registry
//! - A flushed store surfaces as StaleProcedure
//! - Every catalog procedure runs through EVALSHA

use luakv::network::{Connector, Transport};
use luakv::procedure::{load_source, Procedure, ProcedureRegistry};
use luakv::protocol::{Command, Reply};
use luakv::store::MemoryStore;
use luakv::LuaKvError;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup() -> (MemoryStore, Box<dyn Transport>, ProcedureRegistry) {
    let store = MemoryStore::new();
    let conn = store.connector(0).connect().unwrap();
    (store, conn, ProcedureRegistry::new())
}

fn run(conn: &mut Box<dyn Transport>, parts: &[&str]) -> Reply {
    let cmd = Command::from_parts(parts.iter().map(|p| p.as_bytes().to_vec()).collect());
    conn.request(&cmd).unwrap()
}

const NO_ARGS: [&str; 0] = [];

// =============================================================================
// Source Loading
// =============================================================================

#[test]
fn test_load_source_by_name() {
    for procedure in Procedure::ALL {
        let source = load_source(procedure.name()).unwrap();
        assert_eq!(source, procedure.source());
        assert!(!source.trim().is_empty());
    }
}

#[test]
fn test_load_source_unknown() {
    let err = load_source("drop_everything").unwrap_err();
    assert!(matches!(err, LuaKvError::UnknownProcedure(ref n) if n == "drop_everything"));
}

// =============================================================================
// Handle Cache
// =============================================================================

#[test]
fn test_handle_registered_once() {
    let (store, mut conn, registry) = setup();
    assert!(registry.cached(Procedure::GetHelper).is_none());

    let first = registry.handle(conn.as_mut(), Procedure::GetHelper).unwrap();
    assert_eq!(first, MemoryStore::digest(Procedure::GetHelper.source()));
    assert_eq!(store.script_count(), 1);

    // served from the cache even though the store forgot it
    store.flush_scripts();
    let second = registry.handle(conn.as_mut(), Procedure::GetHelper).unwrap();
    assert_eq!(first, second);
    assert_eq!(store.script_count(), 0);
}

#[test]
fn test_registries_do_not_share_handles() {
    let (_store, mut conn, registry) = setup();
    registry.handle(conn.as_mut(), Procedure::RenameKey).unwrap();

    let other = ProcedureRegistry::new();
    assert!(other.cached(Procedure::RenameKey).is_none());
    assert_eq!(registry.len(), 1);
    assert!(other.is_empty());
}

#[test]
fn test_stale_handle_is_not_recovered() {
    let (store, mut conn, registry) = setup();
    registry
        .invoke(conn.as_mut(), Procedure::GetHelper, &["k"], &NO_ARGS)
        .unwrap();

    store.flush_scripts();
    let err = registry
        .invoke(conn.as_mut(), Procedure::GetHelper, &["k"], &NO_ARGS)
        .unwrap_err();
    assert!(matches!(err, LuaKvError::StaleProcedure { ref name } if name == "get_helper"));
    assert_eq!(store.script_count(), 0);
}

#[test]
fn test_forget_all_allows_registration_again() {
    let (store, mut conn, registry) = setup();
    registry
        .invoke(conn.as_mut(), Procedure::GetHelper, &["k"], &NO_ARGS)
        .unwrap();
    store.flush_scripts();
    registry.forget_all();

    let reply = registry
        .invoke(conn.as_mut(), Procedure::GetHelper, &["k"], &NO_ARGS)
        .unwrap();
    assert_eq!(reply, Reply::nil());
    assert_eq!(store.script_count(), 1);
}

#[test]
fn test_script_error_propagates() {
    let (_store, mut conn, registry) = setup();
    let err = registry
        .invoke(
            conn.as_mut(),
            Procedure::SetNotArrayHelper,
            &["k"],
            &["maybe", "0", "0", "0", "0", "v"],
        )
        .unwrap_err();
    assert!(matches!(err, LuaKvError::Server(ref m) if m.contains("malformed flag")));
}

// =============================================================================
// Catalog Procedures
// =============================================================================

#[test]
fn test_write_and_read_procedures() {
    let (_store, mut conn, registry) = setup();

    let old = registry
        .invoke(conn.as_mut(), Procedure::SetNotArrayHelper, &["k"], &["1", "0", "0", "0", "0", "v1"])
        .unwrap();
    assert_eq!(old, Reply::nil());

    let old = registry
        .invoke(conn.as_mut(), Procedure::RpushHelper, &["k"], &["1", "0", "0", "0", "0", "a", "b"])
        .unwrap();
    assert_eq!(old, Reply::bulk("v1"));

    let value = registry
        .invoke(conn.as_mut(), Procedure::GetHelper, &["k"], &NO_ARGS)
        .unwrap();
    assert_eq!(value, Reply::bulk_array(["a", "b"]));
}

#[test]
fn test_delete_without_want_returns_nil() {
    let (_store, mut conn, registry) = setup();
    run(&mut conn, &["SET", "k", "v"]);

    let reply = registry
        .invoke(conn.as_mut(), Procedure::DeleteWithReturning, &["k"], &["0"])
        .unwrap();
    assert_eq!(reply, Reply::nil());
    assert_eq!(run(&mut conn, &["EXISTS", "k"]), Reply::Integer(0));

    run(&mut conn, &["RPUSH", "l", "x"]);
    let reply = registry
        .invoke(conn.as_mut(), Procedure::UnlinkWithReturning, &["l"], &["1"])
        .unwrap();
    assert_eq!(reply, Reply::bulk_array(["x"]));
}

#[test]
fn test_rename_and_remove_all() {
    let (_store, mut conn, registry) = setup();
    run(&mut conn, &["SET", "a", "1"]);
    run(&mut conn, &["SET", "b", "2"]);

    let renamed = registry
        .invoke(conn.as_mut(), Procedure::RenameKey, &["a", "c"], &NO_ARGS)
        .unwrap();
    assert_eq!(renamed, Reply::Integer(1));
    let renamed = registry
        .invoke(conn.as_mut(), Procedure::RenameKey, &["a", "d"], &NO_ARGS)
        .unwrap();
    assert_eq!(renamed, Reply::Integer(0));

    let no_keys: [&str; 0] = [];
    let count = registry
        .invoke(conn.as_mut(), Procedure::RemoveAllKeys, &no_keys, &["1"])
        .unwrap();
    assert_eq!(count, Reply::Integer(2));
    let count = registry
        .invoke(conn.as_mut(), Procedure::RemoveAllKeys, &no_keys, &["0"])
        .unwrap();
    assert_eq!(count, Reply::nil());
}

#[test]
fn test_bulk_ttl_procedures() {
    let (_store, mut conn, registry) = setup();
    run(&mut conn, &["SET", "a", "1"]);
    run(&mut conn, &["SET", "b", "2"]);

    let applied = registry
        .invoke(conn.as_mut(), Procedure::SetKeysTtl, &["a", "b", "missing"], &["60000"])
        .unwrap();
    assert_eq!(applied, Reply::Integer(2));

    let dropped = registry
        .invoke(conn.as_mut(), Procedure::DropKeysTtl, &["a", "missing"], &NO_ARGS)
        .unwrap();
    assert_eq!(dropped, Reply::Integer(1));
    assert_eq!(run(&mut conn, &["PTTL", "a"]), Reply::Integer(-1));
    assert!(matches!(run(&mut conn, &["PTTL", "b"]), Reply::Integer(ms) if ms > 0));
}

#[test]
fn test_append_value_to_array() {
    let (_store, mut conn, registry) = setup();
    let len = registry
        .invoke(conn.as_mut(), Procedure::AppendValueToArray, &["l"], &["-1", "a"])
        .unwrap();
    assert_eq!(len, Reply::Integer(1));
    registry
        .invoke(conn.as_mut(), Procedure::AppendValueToArray, &["l"], &["0", "b"])
        .unwrap();
    registry
        .invoke(conn.as_mut(), Procedure::AppendValueToArray, &["l"], &["99", "c"])
        .unwrap();

    assert_eq!(run(&mut conn, &["LRANGE", "l", "0", "-1"]), Reply::bulk_array(["b", "a", "c"]));
}

#[test]
fn test_mass_remove_with_report_returns_values() {
    let (store, mut conn, registry) = setup();
    run(&mut conn, &["SET", "s", "1"]);
    run(&mut conn, &["RPUSH", "l", "a", "b"]);

    let report = registry
        .invoke(conn.as_mut(), Procedure::MassRemoveWithReport, &["l", "gone", "s"], &["1", "1"])
        .unwrap();
    assert_eq!(
        report,
        Reply::Array(Some(vec![
            Reply::Array(Some(vec![Reply::bulk("l"), Reply::bulk_array(["a", "b"])])),
            Reply::Array(Some(vec![Reply::bulk("s"), Reply::bulk("1")])),
        ]))
    );
    assert_eq!(store.key_count(0), 0);

    let found = registry
        .invoke(conn.as_mut(), Procedure::ExistingKeys, &["l", "s"], &NO_ARGS)
        .unwrap();
    assert_eq!(found, Reply::Array(Some(vec![])));
}
