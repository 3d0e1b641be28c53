use std::collections::BTreeSet;

use proptest::prelude::*;
use procvisor::{ExecutionStrategy, Registry};
use procvisor_test_utils::builders::{DescriptorBuilder, SubCommandBuilder};

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,11}"
}

proptest! {
    // Whatever was stored last under a name is what comes back out.
    #[test]
    fn last_set_wins(entries in proptest::collection::vec((name_strategy(), "[a-z]{1,8}"), 1..20)) {
        let registry = Registry::new();
        for (name, exe) in &entries {
            let d = DescriptorBuilder::new(name)
                .exe(exe)
                .action("start", SubCommandBuilder::new().build())
                .build();
            prop_assert!(registry.set(d));
        }

        let distinct: BTreeSet<&String> = entries.iter().map(|(n, _)| n).collect();
        prop_assert_eq!(registry.len(), distinct.len());

        for name in distinct {
            let expected = entries.iter().rev().find(|(n, _)| n == name).map(|(_, e)| e.clone());
            let got = registry.get(name).map(|d| d.exe);
            prop_assert_eq!(got, expected);
        }
    }

    #[test]
    fn get_many_returns_only_known_names(
        known in proptest::collection::btree_set(name_strategy(), 1..8),
        unknown in proptest::collection::btree_set("[A-Z]{3,6}", 0..4),
    ) {
        let registry = Registry::new();
        for name in &known {
            registry.set(DescriptorBuilder::new(name).exe("true").build());
        }

        let query: Vec<&String> = known.iter().chain(unknown.iter()).collect();
        let found = registry.get_many(&query).expect("at least one name is known");
        let found_names: BTreeSet<String> = found.keys().cloned().collect();
        prop_assert_eq!(found_names, known.clone());

        if !unknown.is_empty() {
            prop_assert!(registry.get_many(&unknown).is_none());
        }
    }
}

#[test]
fn set_rejects_empty_name() {
    let registry = Registry::new();
    let d = DescriptorBuilder::new("  ")
        .exe("true")
        .strategy(ExecutionStrategy::Spawn)
        .build();
    assert!(!registry.set(d));
    assert!(registry.is_empty());
}

#[test]
fn clones_share_the_same_table() {
    let registry = Registry::new();
    let other = registry.clone();
    registry.set(DescriptorBuilder::new("api").exe("server").build());
    assert_eq!(other.names(), vec!["api".to_string()]);
}
