//! Collections of every element type through set / get

use std::collections::{BTreeSet, HashSet};

use luakv::{Data, Scalar, SetOptions};
use proptest::prelude::*;

use super::memory_client;

fn store_and_load(value: Data, spec: Option<&str>) -> Data {
    let (_store, client) = memory_client();
    client.set("k", value, &SetOptions::new()).unwrap();
    client.get("k", spec).unwrap().unwrap()
}

fn members(value: &Data) -> HashSet<Scalar> {
    match value {
        Data::List(items) => items.iter().cloned().collect(),
        Data::Set(items) => items.clone(),
        Data::Scalar(item) => [item.clone()].into_iter().collect(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_int_list(items in prop::collection::vec(any::<i64>(), 1..20)) {
        let got = store_and_load(Data::from(items.clone()), Some("int"));
        prop_assert_eq!(got, Data::from(items));
    }

    #[test]
    fn prop_float_list(items in prop::collection::vec(-1.0e6f64..1.0e6, 1..20)) {
        let got = store_and_load(Data::from(items.clone()), Some("float"));
        prop_assert_eq!(got, Data::from(items));
    }

    #[test]
    fn prop_bool_list(items in prop::collection::vec(any::<bool>(), 1..20)) {
        let got = store_and_load(Data::from(items.clone()), Some("bool"));
        prop_assert_eq!(got, Data::from(items));
    }

    #[test]
    fn prop_str_list(items in prop::collection::vec("[a-z0-9 ]{0,12}", 1..20)) {
        let got = store_and_load(Data::from(items.clone()), None);
        prop_assert_eq!(got, Data::strings(items));
    }

    #[test]
    fn prop_fixed_size_array(a in any::<i64>(), b in any::<i64>(), c in any::<i64>()) {
        let got = store_and_load(Data::from([a, b, c]), Some("int"));
        prop_assert_eq!(got, Data::from(vec![a, b, c]));
    }

    #[test]
    fn prop_int_set(items in prop::collection::hash_set(any::<i64>(), 1..20)) {
        let want = Data::from(items.clone());
        let got = store_and_load(Data::from(items), Some("int"));
        prop_assert_eq!(members(&got), members(&want));
    }

    #[test]
    fn prop_float_set(items in prop::collection::vec(-1.0e6f64..1.0e6, 1..20)) {
        let set: HashSet<Scalar> = items.into_iter().map(Scalar::from).collect();
        let want = Data::Set(set.clone());
        let got = store_and_load(Data::Set(set), Some("float"));
        prop_assert_eq!(members(&got), members(&want));
    }

    #[test]
    fn prop_str_sorted_set(items in prop::collection::btree_set("[a-z]{1,8}", 1..20)) {
        let want = Data::from(items.clone());
        let got = store_and_load(Data::from(items), None);
        prop_assert_eq!(members(&got), members(&want));
    }

    #[test]
    fn prop_bool_sorted_set(items in prop::collection::btree_set(any::<bool>(), 1..3)) {
        let want = Data::from(items.clone());
        let got = store_and_load(Data::from(items), Some("bool"));
        prop_assert_eq!(members(&got), members(&want));
    }
}

#[test]
fn test_sorted_set_is_stored_as_a_list() {
    let items: BTreeSet<&str> = ["b", "a"].into_iter().collect();
    let got = store_and_load(Data::from(items), None);
    assert_eq!(got.as_list().map(<[Scalar]>::len), Some(2));
}
