//! Order-preserving deduplication by logical key.

use crate::types::Keyed;
use std::collections::HashSet;

/// Append the items of `incoming` whose key is not already present.
///
/// `existing` is copied through untouched and in order; an incoming item is
/// skipped when its key appears in `existing` or earlier in `incoming`.
pub fn merge<T: Keyed + Clone>(existing: &[T], incoming: &[T]) -> Vec<T> {
    let mut seen: HashSet<&str> = existing.iter().map(|i| i.unique_key()).collect();
    let mut merged = existing.to_vec();

    for item in incoming {
        if seen.insert(item.unique_key()) {
            merged.push(item.clone());
        }
    }

    merged
}

/// Keep the first occurrence of every key, preserving order.
pub fn uniq_by_key<T: Keyed>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.unique_key().to_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Card {
        key: String,
        tag: u32,
    }

    impl Keyed for Card {
        fn unique_key(&self) -> &str {
            &self.key
        }
    }

    fn card(key: &str, tag: u32) -> Card {
        Card {
            key: key.to_string(),
            tag,
        }
    }

    #[test]
    fn test_merge_appends_new_keys_in_order() {
        let existing = vec![card("a", 0), card("b", 0)];
        let incoming = vec![card("c", 1), card("a", 1), card("d", 1)];

        let merged = merge(&existing, &incoming);
        let keys: Vec<&str> = merged.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c", "d"]);
        // the existing "a" wins over the incoming one
        assert_eq!(merged[0].tag, 0);
    }

    #[test]
    fn test_merge_dedups_within_incoming() {
        let merged = merge(&[], &[card("x", 1), card("x", 2), card("y", 3)]);
        assert_eq!(merged, vec![card("x", 1), card("y", 3)]);
    }

    #[test]
    fn test_merge_empty_incoming() {
        let existing = vec![card("a", 0)];
        assert_eq!(merge(&existing, &[]), existing);
    }

    #[test]
    fn test_uniq_by_key_first_wins() {
        let out = uniq_by_key(vec![card("a", 1), card("b", 1), card("a", 2)]);
        assert_eq!(out, vec![card("a", 1), card("b", 1)]);
    }

    fn cards() -> impl Strategy<Value = Vec<Card>> {
        prop::collection::vec(("[a-f]", 0u32..4).prop_map(|(k, t)| card(&k, t)), 0..20)
    }

    proptest! {
        #[test]
        fn prop_merge_is_idempotent(existing in cards(), incoming in cards()) {
            let existing = uniq_by_key(existing);
            let once = merge(&existing, &incoming);
            let twice = merge(&once, &incoming);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_merge_keys_unique_and_bounded(existing in cards(), incoming in cards()) {
            let existing = uniq_by_key(existing);
            let merged = merge(&existing, &incoming);

            let keys: HashSet<&str> = merged.iter().map(|c| c.unique_key()).collect();
            prop_assert_eq!(keys.len(), merged.len());
            prop_assert!(merged.len() <= existing.len() + incoming.len());
        }

        #[test]
        fn prop_merge_never_touches_existing(existing in cards(), incoming in cards()) {
            let existing = uniq_by_key(existing);
            let merged = merge(&existing, &incoming);
            prop_assert_eq!(&merged[..existing.len()], &existing[..]);
        }
    }
}
