//! Disjoint-set forest over opaque keys.
//!
//! Keys are mapped to dense slots on first [`add`][DisjointSets::add]
//! (index indirection), so any hashable handle works as a key. Iteration in
//! [`disjoint_sets`][DisjointSets::disjoint_sets] follows first-insertion
//! order, which makes the output a deterministic function of the operation
//! sequence.

use std::collections::HashMap;
use std::hash::Hash;

/// A union-find structure with path compression and union by rank.
#[derive(Debug, Clone, Default)]
pub struct DisjointSets<K> {
    index: HashMap<K, usize>,
    keys: Vec<K>,
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl<K: Clone + Eq + Hash> DisjointSets<K> {
    pub fn new() -> Self {
        DisjointSets {
            index: HashMap::new(),
            keys: Vec::new(),
            parent: Vec::new(),
            rank: Vec::new(),
        }
    }

    /// Number of keys added so far.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Installs `key` as its own singleton. Idempotent.
    pub fn add(&mut self, key: K) -> usize {
        if let Some(&slot) = self.index.get(&key) {
            return slot;
        }
        let slot = self.keys.len();
        self.index.insert(key.clone(), slot);
        self.keys.push(key);
        self.parent.push(slot);
        self.rank.push(0);
        slot
    }

    fn find_slot(&mut self, slot: usize) -> usize {
        let mut root = slot;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression: point everything on the walk at the root.
        let mut cursor = slot;
        while self.parent[cursor] != root {
            let next = self.parent[cursor];
            self.parent[cursor] = root;
            cursor = next;
        }
        root
    }

    /// The representative of `key`'s set, or `None` if never added.
    pub fn find(&mut self, key: &K) -> Option<&K> {
        let slot = *self.index.get(key)?;
        let root = self.find_slot(slot);
        Some(&self.keys[root])
    }

    /// Merges the sets containing `a` and `b`, adding either if missing.
    pub fn union(&mut self, a: &K, b: &K) {
        let sa = self.add(a.clone());
        let sb = self.add(b.clone());
        let ra = self.find_slot(sa);
        let rb = self.find_slot(sb);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }

    /// Whether `a` and `b` are currently in the same set.
    pub fn same_set(&mut self, a: &K, b: &K) -> bool {
        match (self.index.get(a).copied(), self.index.get(b).copied()) {
            (Some(sa), Some(sb)) => self.find_slot(sa) == self.find_slot(sb),
            _ => false,
        }
    }

    /// The current partition as a list of lists.
    ///
    /// Groups appear in order of their earliest-added member, and members
    /// within a group in insertion order.
    pub fn disjoint_sets(&mut self) -> Vec<Vec<K>> {
        let mut group_of_root: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<Vec<K>> = Vec::new();
        for slot in 0..self.keys.len() {
            let root = self.find_slot(slot);
            let group = *group_of_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[group].push(self.keys[slot].clone());
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut sets = DisjointSets::new();
        assert_eq!(sets.add("a"), 0);
        assert_eq!(sets.add("b"), 1);
        assert_eq!(sets.add("a"), 0);
        assert_eq!(sets.len(), 2);
    }

    #[test]
    fn test_union_and_find() {
        let mut sets = DisjointSets::new();
        sets.add(1);
        sets.add(2);
        sets.add(3);
        sets.union(&1, &2);
        assert!(sets.same_set(&1, &2));
        assert!(!sets.same_set(&1, &3));
        let rep1 = sets.find(&1).copied();
        let rep2 = sets.find(&2).copied();
        assert_eq!(rep1, rep2);
    }

    #[test]
    fn test_transitivity() {
        let mut sets = DisjointSets::new();
        for i in 0..6 {
            sets.add(i);
        }
        sets.union(&0, &1);
        sets.union(&2, &3);
        sets.union(&1, &2);
        assert!(sets.same_set(&0, &3));
        assert!(!sets.same_set(&0, &4));
    }

    #[test]
    fn test_disjoint_sets_order() {
        let mut sets = DisjointSets::new();
        for key in ["p", "q", "r", "s"] {
            sets.add(key);
        }
        sets.union(&"q", &"s");
        let partition = sets.disjoint_sets();
        assert_eq!(partition, vec![vec!["p"], vec!["q", "s"], vec!["r"]]);
    }

    #[test]
    fn test_determinism_across_runs() {
        let build = || {
            let mut sets = DisjointSets::new();
            for i in 0..20 {
                sets.add(i);
            }
            for i in (0..20).step_by(3) {
                sets.union(&i, &(i / 2));
            }
            sets.disjoint_sets()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_singletons_included() {
        let mut sets = DisjointSets::new();
        sets.add(10);
        sets.add(20);
        let partition = sets.disjoint_sets();
        assert_eq!(partition.len(), 2);
        assert_eq!(partition[0], vec![10]);
        assert_eq!(partition[1], vec![20]);
    }
}
