//! Behavior checks shared by the in-process and live-store suites
//!
//! Each check wipes the selected database first, then drives one area of the
//! client end to end. The same functions run against `MemoryStore` and, when
//! configured, a real Redis executing the Lua procedures.

use luakv::{Client, Data, MassDeleteOptions, SetOptions};

pub fn scalar_and_list_round_trips(client: &Client) {
    client.remove_all_keys(false).unwrap();

    client.set("int", 5, &SetOptions::new()).unwrap();
    assert_eq!(client.get("int", Some("int")).unwrap(), Some(Data::from(5)));

    client.set("flag", false, &SetOptions::new()).unwrap();
    assert_eq!(client.get("flag", None).unwrap(), Some(Data::string("False")));

    // crosses the 5000-element chunk boundary twice
    let items: Vec<i64> = (0..12_000).collect();
    client.set("big", items.clone(), &SetOptions::new()).unwrap();
    assert_eq!(client.get("big", Some("int")).unwrap(), Some(Data::from(items)));

    let old = client
        .set("big", "small", &SetOptions::new().convert_old_value_to("int"))
        .unwrap()
        .unwrap();
    assert_eq!(old.as_list().map(<[_]>::len), Some(12_000));
    assert_eq!(client.get("big", None).unwrap(), Some(Data::string("small")));
}

pub fn conditional_writes_and_ttl(client: &Client) {
    client.remove_all_keys(false).unwrap();

    client.set("k", "first", &SetOptions::new()).unwrap();
    client
        .set("k", "second", &SetOptions::new().if_not_exists().ttl_ms(5_000))
        .unwrap();
    assert_eq!(client.get("k", None).unwrap(), Some(Data::string("first")));
    assert_eq!(client.get_key_ttl("k").unwrap(), Some(0));

    client
        .set("absent", "v", &SetOptions::new().if_exists().ttl_ms(5_000))
        .unwrap();
    assert_eq!(client.get_key_ttl("absent").unwrap(), None);

    client.set("t", vec![1, 2], &SetOptions::new().ttl_seconds(60)).unwrap();
    client.set("t", vec![3], &SetOptions::new().keep_ttl()).unwrap();
    assert!(client.get_key_ttl("t").unwrap().unwrap() > 30_000);
    assert_eq!(client.get("t", Some("int")).unwrap(), Some(Data::from(vec![3])));

    client.set("t", "plain", &SetOptions::new()).unwrap();
    assert_eq!(client.get_key_ttl("t").unwrap(), Some(0));
}

pub fn mass_delete_report(client: &Client) {
    client.remove_all_keys(false).unwrap();

    client.set("s", 1, &SetOptions::new()).unwrap();
    client.set("l", vec![true, false], &SetOptions::new()).unwrap();
    assert_eq!(client.mass_check_exists(["l", "x", "s"]).unwrap(), vec!["l", "s"]);

    let options = MassDeleteOptions::new()
        .return_existing()
        .return_missing()
        .return_values();
    let outcome = client.mass_unlink(["s", "x", "l", "s"], &options).unwrap();
    assert_eq!(outcome.existing, vec!["s", "l"]);
    assert_eq!(outcome.missing, vec!["x"]);
    assert_eq!(outcome.values["s"], Data::string("1"));
    assert_eq!(outcome.values["l"], Data::strings(["True", "False"]));
    assert!(client.mass_check_exists(["s", "l"]).unwrap().is_empty());
}

pub fn append_and_rename(client: &Client) {
    client.remove_all_keys(false).unwrap();

    client.set("l", vec![1, 2, 3], &SetOptions::new()).unwrap();
    assert_eq!(client.append_value_to_array("l", 9, Some(1)).unwrap(), Some(4));
    assert_eq!(client.append_value_to_array("l", 0, Some(0)).unwrap(), Some(5));
    assert_eq!(client.append_value_to_array("l", 7, None).unwrap(), Some(6));
    assert_eq!(
        client.get("l", Some("int")).unwrap(),
        Some(Data::from(vec![0, 1, 9, 2, 3, 7]))
    );

    assert_eq!(client.rename_key("l", "m", true).unwrap(), Some(true));
    assert_eq!(client.rename_key("l", "n", true).unwrap(), Some(false));
    assert_eq!(client.get("l", None).unwrap(), None);
}

pub fn bulk_ttl(client: &Client) {
    client.remove_all_keys(false).unwrap();

    for key in ["a", "b"] {
        client.set(key, key, &SetOptions::new()).unwrap();
    }
    assert_eq!(client.set_keys_ttl(["a", "b", "c"], Some(60), None).unwrap(), 2);
    assert!(client.get_key_ttl("a").unwrap().unwrap() > 30_000);

    assert_eq!(client.drop_keys_ttl(["a", "b", "c"]).unwrap(), 2);
    assert_eq!(client.get_key_ttl("b").unwrap(), Some(0));
    assert_eq!(client.get_key_ttl("c").unwrap(), None);
}

pub fn delete_and_unlink_returning(client: &Client) {
    client.remove_all_keys(false).unwrap();

    client.set("a", vec![1.5, 2.0], &SetOptions::new()).unwrap();
    client.set("b", "x", &SetOptions::new()).unwrap();

    assert_eq!(
        client.delete("a", true, Some("float")).unwrap(),
        Some(Data::from(vec![1.5, 2.0]))
    );
    assert_eq!(client.unlink("b", true, None).unwrap(), Some(Data::string("x")));
    assert_eq!(client.unlink("b", true, None).unwrap(), None);
    assert_eq!(client.remove_all_keys(true).unwrap(), Some(0));
}

/// Every check above, in order
pub fn run_all(client: &Client) {
    scalar_and_list_round_trips(client);
    conditional_writes_and_ttl(client);
    mass_delete_report(client);
    append_and_rename(client);
    bulk_ttl(client);
    delete_and_unlink_returning(client);
}
