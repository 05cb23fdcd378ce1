//! Client integration tests
//!
//! Every test runs the real client stack (pool, procedure registry,
//! converter) against an in-process `MemoryStore`. The ignored tests in
//! `live` run the same checks against a real Redis.

mod checks;
mod live;
mod mass;
mod round_trip;
mod scenario;

use luakv::{Client, Config, MemoryStore};

// =============================================================================
// Helper Functions
// =============================================================================

fn memory_client() -> (MemoryStore, Client) {
    memory_client_on(0)
}

fn memory_client_on(db: u32) -> (MemoryStore, Client) {
    let store = MemoryStore::new();
    let config = Config::builder().db(db).build();
    let client = Client::with_connector(config, store.connector(db)).unwrap();
    (store, client)
}
