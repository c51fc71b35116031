//! Order-preserving grouping of a sequence by a derived key.

use std::collections::HashMap;
use std::hash::Hash;

/// Groups keyed in first-occurrence order, items kept in input order.
#[derive(Debug, Clone)]
pub struct Groups<K, V> {
    index: HashMap<K, usize>,
    groups: Vec<(K, Vec<V>)>,
}

impl<K, V> Default for Groups<K, V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> Groups<K, V> {
    fn push(&mut self, key: K, item: V) {
        if let Some(&slot) = self.index.get(&key) {
            self.groups[slot].1.push(item);
        } else {
            self.index.insert(key.clone(), self.groups.len());
            self.groups.push((key, vec![item]));
        }
    }

    /// Items grouped under `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&[V]> {
        self.index
            .get(key)
            .map(|&slot| self.groups[slot].1.as_slice())
    }
}

impl<K, V> Groups<K, V> {
    /// Keys in first-occurrence order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.groups.iter().map(|(key, _)| key)
    }

    /// Groups in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[V])> {
        self.groups.iter().map(|(key, items)| (key, items.as_slice()))
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no items were grouped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of grouped items.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|(_, items)| items.len()).sum()
    }

    /// Consume into ordered `(key, items)` pairs.
    #[must_use]
    pub fn into_vec(self) -> Vec<(K, Vec<V>)> {
        self.groups
    }
}

impl<K, V> IntoIterator for Groups<K, V> {
    type Item = (K, Vec<V>);
    type IntoIter = std::vec::IntoIter<(K, Vec<V>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Bucket `items` by `key_of`.
///
/// Keys appear in first-occurrence order and each group keeps the relative
/// order of its items. Nothing is dropped or deduplicated.
pub fn group_by<K, V, I, F>(items: I, mut key_of: F) -> Groups<K, V>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = V>,
    F: FnMut(&V) -> K,
{
    let mut groups = Groups::default();
    for item in items {
        let key = key_of(&item);
        groups.push(key, item);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        t: i64,
        n: &'static str,
    }

    #[test]
    fn groups_by_time_in_first_seen_order() {
        let items = vec![
            Item { t: 10, n: "A" },
            Item { t: 10, n: "B" },
            Item { t: 20, n: "C" },
        ];
        let groups = group_by(items, |item| item.t);

        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec![10, 20]);
        let names = |key| {
            groups
                .get(&key)
                .map(|items| items.iter().map(|item| item.n).collect::<Vec<_>>())
        };
        assert_eq!(names(10), Some(vec!["A", "B"]));
        assert_eq!(names(20), Some(vec!["C"]));
        assert_eq!(names(30), None);
    }

    #[test]
    fn interleaved_keys_keep_first_occurrence_order() {
        let groups = group_by(["b1", "a1", "b2", "c1", "a2"], |name| name.as_bytes()[0]);
        let pairs = groups.into_vec();
        assert_eq!(
            pairs,
            vec![
                (b'b', vec!["b1", "b2"]),
                (b'a', vec!["a1", "a2"]),
                (b'c', vec!["c1"]),
            ]
        );
    }

    #[test]
    fn empty_input_yields_no_groups() {
        let groups = group_by(Vec::<u8>::new(), |value| *value);
        assert!(groups.is_empty());
        assert_eq!(groups.item_count(), 0);
    }

    proptest! {
        #[test]
        fn grouping_neither_loses_nor_reorders(values in proptest::collection::vec(0u8..50, 0..64), modulo in 1u8..8) {
            let tagged: Vec<(usize, u8)> = values.iter().copied().enumerate().collect();
            let groups = group_by(tagged.clone(), |(_, value)| value % modulo);

            prop_assert_eq!(groups.item_count(), tagged.len());

            let mut seen: Vec<(usize, u8)> = Vec::with_capacity(tagged.len());
            for (key, items) in groups.iter() {
                prop_assert!(items.windows(2).all(|pair| pair[0].0 < pair[1].0));
                prop_assert!(items.iter().all(|(_, value)| value % modulo == *key));
                seen.extend_from_slice(items);
            }
            seen.sort_unstable();
            prop_assert_eq!(seen, tagged);

            let first_positions: Vec<usize> = groups.iter().map(|(_, items)| items[0].0).collect();
            prop_assert!(first_positions.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }
}
