use std::collections::BTreeMap;

use proptest::prelude::*;
use proptest_derive::Arbitrary;

use crate::{Keyed, Tracing, Trie};

/// Simple model implementation using BTreeMap for comparison.
#[derive(Default)]
struct Model {
    map: BTreeMap<Vec<u8>, u64>,
}

/// Stored entry: owned key bytes plus a value.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    key: Vec<u8>,
    value: u64,
}

impl Keyed for Entry {
    fn key(&self) -> &[u8] {
        &self.key
    }
}

/// Actions to test against both implementations.
#[derive(Arbitrary, Debug, Clone)]
enum Action {
    Insert(KeyValue),
    Find(Key),
    Erase(Key),
}

/// Wrapper for key generation with custom strategy.
#[derive(Debug, Clone)]
struct Key(Vec<u8>);

/// Wrapper for key-value pair.
#[derive(Debug, Clone)]
struct KeyValue {
    key: Key,
    value: u64,
}

impl Arbitrary for Key {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        let nibble_collider = prop_oneof![
            Just(0x00u8),
            Just(0x01u8),
            Just(0x10u8),
            Just(0x11u8),
            Just(0x12u8),
            Just(0xf0u8),
        ];
        prop_oneof![
            // Empty key (lives at the root)
            Just(Key(vec![])),
            // Short keys over a tiny alphabet to force shared prefixes and
            // splits on both nibble alignments
            prop::collection::vec(nibble_collider, 1..5).prop_map(Key),
            // Arbitrary bytes
            prop::collection::vec(any::<u8>(), 1..8).prop_map(Key),
            // Human-looking keys with shared stems
            "[ab]{1,6}".prop_map(|s| Key(s.into_bytes())),
        ]
        .boxed()
    }
}

impl Arbitrary for KeyValue {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (any::<Key>(), any::<u64>())
            .prop_map(|(key, value)| KeyValue { key, value })
            .boxed()
    }
}

/// Test harness that executes actions on both the trie and the model.
#[derive(Default)]
struct Test {
    trie: Trie<Entry>,
    model: Model,
}

impl Test {
    fn execute(&mut self, action: Action) {
        match action {
            Action::Insert(kv) => {
                let key = kv.key.0;
                let cur = self.trie.insert(Entry {
                    key: key.clone(),
                    value: kv.value,
                });
                // Insertion never overwrites: both sides keep the first
                // value stored under the key.
                let expected = *self.model.map.entry(key.clone()).or_insert(kv.value);
                assert_eq!(
                    self.trie.entry(cur).map(|e| e.value),
                    Some(expected),
                    "insert cursor mismatch: key={:?}",
                    key
                );
            }
            Action::Find(key) => {
                let got = self.trie.get(&key.0).map(|e| e.value);
                let expected = self.model.map.get(&key.0).copied();
                assert_eq!(got, expected, "find mismatch: key={:?}", key.0);
            }
            Action::Erase(key) => {
                let mut cur = self.trie.find(&key.0);
                match self.model.map.remove(&key.0) {
                    Some(value) => {
                        let succ = self.trie.advance(cur);
                        let removed = self.trie.erase(&mut cur).expect("cursor points at entry");
                        assert_eq!(removed.value, value, "erase mismatch: key={:?}", key.0);
                        assert_eq!(cur, succ, "erase must advance to the in-order successor");
                    }
                    None => assert!(
                        cur.is_end(),
                        "trie holds a key the model lacks: {:?}",
                        key.0
                    ),
                }
            }
        }
        assert_eq!(
            self.trie.len(),
            self.model.map.len(),
            "length mismatch after action"
        );
    }

    fn audit(&self) {
        self.trie
            .check_invariants()
            .expect("structural invariants must hold");
        let got: Vec<(Vec<u8>, u64)> = self
            .trie
            .iter()
            .map(|e| (e.key.clone(), e.value))
            .collect();
        let expected: Vec<(Vec<u8>, u64)> = self
            .model
            .map
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        assert_eq!(got, expected, "in-order traversal must match the model");
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn proptest_vs_btreemap(actions in prop::collection::vec(any::<Action>(), 1..64)) {
        let mut test = Test::default();
        for action in actions {
            test.execute(action);
        }
        test.audit();
    }

    #[test]
    fn proptest_slobby_round_trips_match_strict(
        keys in prop::collection::btree_set(prop::collection::vec(any::<u8>(), 1..12), 1..40)
    ) {
        let mut strict: Trie<Entry> = Trie::new();
        let mut slobby: Trie<Entry> = Trie::with_tracing(Tracing::Slobby);
        for (i, key) in keys.iter().enumerate() {
            strict.insert(Entry { key: key.clone(), value: i as u64 });
            slobby.insert(Entry { key: key.clone(), value: i as u64 });
        }
        for key in &keys {
            prop_assert_eq!(
                strict.get(key).map(|e| e.value),
                slobby.get(key).map(|e| e.value)
            );
        }
        strict.check_invariants().expect("strict invariants");
        slobby.check_invariants().expect("slobby invariants");
    }
}
