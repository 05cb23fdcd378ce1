//! A full round of typical use

use luakv::{Data, SetOptions};

use super::memory_client;

#[test]
fn test_end_to_end_scenario() {
    let (store, client) = memory_client();

    client.set("a", 5, &SetOptions::new()).unwrap();
    assert_eq!(client.get("a", None).unwrap(), Some(Data::string("5")));
    assert_eq!(client.get("a", Some("int")).unwrap(), Some(Data::from(5)));
    assert_eq!(client.delete("a", true, None).unwrap(), Some(Data::string("5")));
    assert_eq!(client.get("a", None).unwrap(), None);

    assert_eq!(store.key_count(0), 0);
    assert!(client.ping());
}

#[test]
fn test_shared_client_across_threads() {
    let (store, client) = memory_client();
    let client = std::sync::Arc::new(client);

    let workers: Vec<_> = (0..4)
        .map(|t| {
            let client = std::sync::Arc::clone(&client);
            std::thread::spawn(move || {
                for i in 0..50 {
                    let key = format!("t{t}-{i}");
                    client.set(&key, i, &SetOptions::new()).unwrap();
                    assert_eq!(client.get(&key, Some("int")).unwrap(), Some(Data::from(i)));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(store.key_count(0), 200);
}

#[test]
fn test_shared_checks_in_process() {
    let (_store, client) = memory_client();
    super::checks::run_all(&client);
}
