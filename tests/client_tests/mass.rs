//! Multi-key delete and existence checks

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use luakv::network::{Connector, Transport};
use luakv::protocol::{Command, Reply};
use luakv::{Client, Config, Data, MassDeleteOptions, MemoryStore, Result, SetOptions};

use super::memory_client;

fn seed(client: &luakv::Client) {
    client.set("a", 1, &SetOptions::new()).unwrap();
    client.set("b", 2, &SetOptions::new()).unwrap();
}

#[test]
fn test_mass_delete_partitions_keys() {
    let (store, client) = memory_client();
    seed(&client);

    let options = MassDeleteOptions::new().return_existing().return_missing();
    let outcome = client.mass_delete(["a", "b", "c", "a"], &options).unwrap();

    assert_eq!(outcome.existing, vec!["a", "b"]);
    assert_eq!(outcome.missing, vec!["c"]);
    assert!(outcome.values.is_empty());
    assert_eq!(store.key_count(0), 0);
}

#[test]
fn test_mass_delete_returns_converted_values() {
    let (_store, client) = memory_client();
    seed(&client);

    let options = MassDeleteOptions::new().return_values().convert_values_to("int");
    let outcome = client.mass_delete(["a", "b", "c"], &options).unwrap();

    assert_eq!(outcome.values.len(), 2);
    assert_eq!(outcome.values["a"], Data::from(1));
    assert_eq!(outcome.values["b"], Data::from(2));
    assert!(outcome.existing.is_empty());
    assert!(outcome.missing.is_empty());
}

#[test]
fn test_mass_delete_without_report_removes_everything() {
    let (store, client) = memory_client();
    seed(&client);
    client.set("list", vec![1, 2], &SetOptions::new()).unwrap();

    let outcome = client
        .mass_delete(["a", "list", "missing"], &MassDeleteOptions::new())
        .unwrap();
    assert_eq!(outcome, Default::default());
    assert_eq!(store.key_count(0), 1);
}

#[test]
fn test_mass_unlink() {
    let (store, client) = memory_client();
    seed(&client);

    let outcome = client
        .mass_unlink(vec!["b".to_string()], &MassDeleteOptions::new().return_existing())
        .unwrap();
    assert_eq!(outcome.existing, vec!["b"]);
    assert_eq!(store.key_count(0), 1);
}

#[test]
fn test_mass_operations_on_empty_input() {
    let (_store, client) = memory_client();
    let none: [&str; 0] = [];
    let outcome = client
        .mass_delete(none, &MassDeleteOptions::new().return_missing())
        .unwrap();
    assert!(outcome.missing.is_empty());
    assert!(client.mass_check_exists(none).unwrap().is_empty());
}

#[test]
fn test_mass_check_exists() {
    let (_store, client) = memory_client();
    seed(&client);

    let found = client.mass_check_exists(["c", "b", "a", "b"]).unwrap();
    assert_eq!(found, vec!["b", "a"]);
}

#[test]
fn test_list_keys_are_reported_and_removed() {
    let (store, client) = memory_client();
    client.set("list", vec![1, 2], &SetOptions::new()).unwrap();
    client.set("s", "x", &SetOptions::new()).unwrap();

    assert_eq!(client.mass_check_exists(["list", "gone", "s"]).unwrap(), vec!["list", "s"]);

    let options = MassDeleteOptions::new()
        .return_existing()
        .return_missing()
        .convert_values_to("int");
    let outcome = client.mass_delete(["list", "gone"], &options).unwrap();
    assert_eq!(outcome.existing, vec!["list"]);
    assert_eq!(outcome.missing, vec!["gone"]);
    assert_eq!(outcome.values["list"], Data::from(vec![1, 2]));
    assert_eq!(store.key_count(0), 1);
}

// =============================================================================
// Concurrent Writers
// =============================================================================

/// Writes `a = changed` from another session right after the first data
/// command is answered
struct Interleaving {
    store: MemoryStore,
    inner: Box<dyn Transport>,
    fired: Arc<AtomicBool>,
}

impl Transport for Interleaving {
    fn request(&mut self, command: &Command) -> Result<Reply> {
        let reply = self.inner.request(command)?;
        let data_command = command.name() != "SCRIPT" && command.name() != "PING";
        if data_command && !matches!(reply, Reply::Error(_)) && !self.fired.swap(true, Ordering::SeqCst) {
            let write = Command::new("SET").arg("a").arg("changed");
            self.store.execute(&mut self.store.session(), &write);
        }
        Ok(reply)
    }
}

struct InterleavingConnector {
    store: MemoryStore,
    fired: Arc<AtomicBool>,
}

impl Connector for InterleavingConnector {
    fn connect(&self) -> Result<Box<dyn Transport>> {
        Ok(Box::new(Interleaving {
            store: self.store.clone(),
            inner: self.store.connector(0).connect()?,
            fired: Arc::clone(&self.fired),
        }))
    }

    fn describe(&self) -> String {
        "interleaving".to_string()
    }
}

#[test]
fn test_report_matches_what_was_removed() {
    let store = MemoryStore::new();
    let fired = Arc::new(AtomicBool::new(false));
    let connector = InterleavingConnector {
        store: store.clone(),
        fired: Arc::clone(&fired),
    };
    let client = Client::with_connector(Config::default(), connector).unwrap();
    store.execute(&mut store.session(), &Command::new("SET").arg("a").arg("1"));

    let options = MassDeleteOptions::new().return_existing().return_values();
    let outcome = client.mass_delete(["a", "b"], &options).unwrap();

    assert!(fired.load(Ordering::SeqCst));
    assert_eq!(outcome.existing, vec!["a"]);
    assert_eq!(outcome.values["a"], Data::string("1"));
    // the concurrent write landed after the removal and survives it
    assert_eq!(client.get("a", None).unwrap(), Some(Data::string("changed")));
}
