//! Ordered key index over a borrowed collection.
//!
//! Keys are produced by an explicit key function (folded name or canonical
//! signature). The first item for a key wins; later duplicates are absorbed and
//! never surface. Iteration follows the collection's original order.

use crate::normalize::fold_ident;
use std::collections::HashMap;

pub struct Lookup<'a, T> {
    entries: Vec<(String, &'a T)>,
    positions: HashMap<String, usize>,
}

impl<'a, T> Lookup<'a, T> {
    /// Index `items` by `key`, keeping the first occurrence of each key.
    pub fn build<I, F>(items: I, key: F) -> Self
    where
        I: IntoIterator<Item = &'a T>,
        F: Fn(&T) -> String,
    {
        let mut entries = Vec::new();
        let mut positions = HashMap::new();

        for item in items {
            let k = key(item);
            if positions.contains_key(&k) {
                continue;
            }
            positions.insert(k.clone(), entries.len());
            entries.push((k, item));
        }

        Self { entries, positions }
    }

    /// Index by an identifier, case-insensitively.
    pub fn by_name<I, F>(items: I, name: F) -> Self
    where
        I: IntoIterator<Item = &'a T>,
        F: Fn(&T) -> &str,
    {
        Self::build(items, |item| fold_ident(name(item)))
    }

    /// Exact key lookup
    pub fn get(&self, key: &str) -> Option<&'a T> {
        self.positions.get(key).map(|&i| self.entries[i].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    /// Lookup by a raw identifier, folding it the same way keys were folded
    pub fn find(&self, name: &str) -> Option<&'a T> {
        self.get(&fold_ident(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &'a T)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
