//! Delimiter-Bounded Prefix Trie
//!
//! This module implements the hierarchical key index used by the storage
//! engine. Keys are segmented on a fixed delimiter (`:`) and indexed so that
//! whole subtrees of the hierarchy can be enumerated or invalidated at once.
//!
//! ## Cumulative Labeling
//!
//! Every child is keyed by the *cumulative* prefix it represents, not by its
//! own component. Adding `country:USA:state:MI` produces the chain
//!
//! ```text
//! "" ── "country" ── "country:USA" ── "country:USA:state" ── "country:USA:state:MI"
//! ```
//!
//! so each lookup step is a single exact map hit. This is what makes the trie
//! delimiter-bounded: a search for `"cou"` or `"country:"` can never land on
//! a node, because no node carries those labels.
//!
//! The trie gains nothing over a flat map for single-key lookup. Its purpose
//! is subtree enumeration (`find`) and subtree invalidation (`delete_all`).

use std::collections::HashMap;

/// The character that segments keys into hierarchy components.
pub const DELIMITER: char = ':';

/// A single node in the trie.
///
/// `value` is the cumulative prefix this node represents (the root's value is
/// the empty string). `is_key` marks nodes that correspond to externally
/// inserted keys rather than intermediate prefixes.
#[derive(Debug, Default)]
struct TrieNode {
    value: String,
    is_key: bool,
    children: HashMap<String, TrieNode>,
}

impl TrieNode {
    fn new(value: String) -> Self {
        Self {
            value,
            is_key: false,
            children: HashMap::new(),
        }
    }

    /// A node represents a key if it was inserted as one, or if it is a leaf.
    /// Pruning keeps non-key leaves out of the tree, so the leaf clause only
    /// matters transiently during traversal.
    fn collect_keys(&self, keys: &mut Vec<String>) {
        if self.children.is_empty() {
            keys.push(self.value.clone());
            return;
        }

        if self.is_key {
            keys.push(self.value.clone());
        }

        for child in self.children.values() {
            child.collect_keys(keys);
        }
    }
}

/// A prefix trie over colon-delimited keys.
///
/// # Example
///
/// ```
/// use trelliskv::storage::PrefixTrie;
///
/// let mut trie = PrefixTrie::new();
/// trie.add("region:1:store:1");
/// trie.add("region:1:manager");
///
/// let mut keys = trie.find("region:1");
/// keys.sort();
/// assert_eq!(keys, vec!["region:1:manager", "region:1:store:1"]);
/// assert!(trie.find("reg").is_empty());
/// ```
#[derive(Debug, Default)]
pub struct PrefixTrie {
    root: TrieNode,
}

impl PrefixTrie {
    /// Creates an empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key, creating one node per delimiter-separated component.
    ///
    /// Adding a key that is already present is a no-op.
    pub fn add(&mut self, key: &str) {
        let mut node = &mut self.root;
        for label in cumulative_labels(key) {
            node = node
                .children
                .entry(label.clone())
                .or_insert_with(|| TrieNode::new(label));
        }
        node.is_key = true;
    }

    /// Finds every key at or below the node whose cumulative value equals
    /// `prefix`.
    ///
    /// The empty prefix enumerates the whole trie. A prefix that does not
    /// land exactly on a node (a partial component, a trailing delimiter, a
    /// missing level) matches nothing.
    pub fn find(&self, prefix: &str) -> Vec<String> {
        let mut keys = Vec::new();

        if prefix.is_empty() {
            for child in self.root.children.values() {
                child.collect_keys(&mut keys);
            }
            return keys;
        }

        let mut node = &self.root;
        for label in cumulative_labels(prefix) {
            match node.children.get(&label) {
                Some(child) => node = child,
                None => return keys,
            }
        }

        node.collect_keys(&mut keys);
        keys
    }

    /// Removes the exact key from the trie.
    ///
    /// If the matching node still has children it only stops being a key;
    /// otherwise the node is unlinked and any ancestor left as a non-key
    /// leaf is pruned along with it.
    ///
    /// Returns whether the key was present.
    pub fn delete(&mut self, key: &str) -> bool {
        let labels = cumulative_labels(key);
        let (deleted, _) = Self::remove_key(&mut self.root, &labels);
        deleted
    }

    /// Removes the entire subtree rooted at the node whose cumulative value
    /// equals `prefix`, pruning any ancestors left as non-key leaves.
    ///
    /// The empty prefix discards everything below the root. Returns whether
    /// anything was removed.
    pub fn delete_all(&mut self, prefix: &str) -> bool {
        if prefix.is_empty() {
            let deleted = !self.root.children.is_empty();
            self.root.children.clear();
            return deleted;
        }

        let labels = cumulative_labels(prefix);
        let (deleted, _) = Self::remove_subtree(&mut self.root, &labels);
        deleted
    }

    /// Discards every node below the root.
    pub fn clear(&mut self) {
        self.root.children.clear();
    }

    /// True when the trie holds no keys.
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    // Walks down the label chain, clears `is_key` on the terminal node, and
    // reports back up whether each visited node should be unlinked from its
    // parent. Returns (key deleted, prune this node).
    fn remove_key(node: &mut TrieNode, labels: &[String]) -> (bool, bool) {
        match labels {
            [] => {
                let deleted = node.is_key;
                node.is_key = false;
                (deleted, node.children.is_empty())
            }
            [label, rest @ ..] => {
                let Some(child) = node.children.get_mut(label) else {
                    return (false, false);
                };
                let (deleted, prune_child) = Self::remove_key(child, rest);
                if prune_child {
                    node.children.remove(label);
                }
                (deleted, !node.is_key && node.children.is_empty())
            }
        }
    }

    // Same walk as remove_key, but the terminal node is unlinked wholesale.
    fn remove_subtree(node: &mut TrieNode, labels: &[String]) -> (bool, bool) {
        match labels {
            [] => (false, false),
            [label] => {
                let deleted = node.children.remove(label).is_some();
                (deleted, deleted && !node.is_key && node.children.is_empty())
            }
            [label, rest @ ..] => {
                let Some(child) = node.children.get_mut(label) else {
                    return (false, false);
                };
                let (deleted, prune_child) = Self::remove_subtree(child, rest);
                if prune_child {
                    node.children.remove(label);
                }
                (deleted, deleted && !node.is_key && node.children.is_empty())
            }
        }
    }
}

/// Splits a key on the delimiter and accumulates one label per component:
/// `"a:b:c"` yields `["a", "a:b", "a:b:c"]`.
fn cumulative_labels(key: &str) -> Vec<String> {
    let mut labels = Vec::new();
    let mut acc = String::with_capacity(key.len());

    for (i, component) in key.split(DELIMITER).enumerate() {
        if i > 0 {
            acc.push(DELIMITER);
        }
        acc.push_str(component);
        labels.push(acc.clone());
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut keys: Vec<String>) -> Vec<String> {
        keys.sort();
        keys
    }

    #[test]
    fn test_cumulative_labels() {
        assert_eq!(
            cumulative_labels("country:USA:state"),
            vec!["country", "country:USA", "country:USA:state"]
        );
        assert_eq!(cumulative_labels("country"), vec!["country"]);
        assert_eq!(cumulative_labels(""), vec![""]);
    }

    #[test]
    fn test_add_keys_without_separator() {
        let mut trie = PrefixTrie::new();

        trie.add("country");
        assert_eq!(trie.find(""), vec!["country"]);

        trie.add("department");
        assert_eq!(
            sorted(trie.find("")),
            vec!["country", "department"]
        );
    }

    #[test]
    fn test_add_builds_cumulative_chain() {
        let mut trie = PrefixTrie::new();
        trie.add("country:USA:state:MI");

        // Every intermediate label must be reachable as an exact prefix.
        for prefix in ["country", "country:USA", "country:USA:state"] {
            assert_eq!(trie.find(prefix), vec!["country:USA:state:MI"]);
        }
        assert_eq!(trie.find("country:USA:state:MI"), vec!["country:USA:state:MI"]);
    }

    #[test]
    fn test_shared_prefixes_share_nodes() {
        let mut trie = PrefixTrie::new();
        trie.add("country:USA:state:MI:city:China");
        trie.add("country:USA:state:OH:city:Sandusky");

        assert_eq!(trie.root.children.len(), 1);
        assert_eq!(trie.find("").len(), 2);
    }

    #[test]
    fn test_key_nested_under_another_key() {
        let mut trie = PrefixTrie::new();
        trie.add("country:USA:state:MI");
        trie.add("country:USA:state:MI:city:China");

        assert_eq!(
            sorted(trie.find("")),
            vec!["country:USA:state:MI", "country:USA:state:MI:city:China"]
        );
        assert_eq!(trie.find("country:USA:state:MI").len(), 2);

        // Same shape regardless of insertion order.
        let mut trie = PrefixTrie::new();
        trie.add("country:USA:state:MI:city:China");
        trie.add("country:USA:state:MI");
        assert_eq!(trie.find("country:USA:state:MI").len(), 2);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut trie = PrefixTrie::new();
        trie.add("region:1:store:1");
        trie.add("region:1:store:1");

        assert_eq!(trie.find(""), vec!["region:1:store:1"]);
    }

    #[test]
    fn test_find_by_prefix_levels() {
        let mut trie = PrefixTrie::new();
        trie.add("country:USA:state:MI:city:China");
        trie.add("country:USA:state:OH:city:Sandusky");
        trie.add("country:USA:state:MI:city:St. Clair");
        trie.add("country:USA:state:OH:city:Cleveland");
        trie.add("country:USA:state:IN:city:Gary");

        assert_eq!(trie.find("").len(), 5);
        assert_eq!(trie.find("country:USA").len(), 5);
        assert_eq!(
            sorted(trie.find("country:USA:state:OH")),
            vec![
                "country:USA:state:OH:city:Cleveland",
                "country:USA:state:OH:city:Sandusky"
            ]
        );
        assert_eq!(
            trie.find("country:USA:state:MI:city:China"),
            vec!["country:USA:state:MI:city:China"]
        );
    }

    #[test]
    fn test_partial_components_never_match() {
        let mut trie = PrefixTrie::new();
        trie.add("country:USA:state:MI:city:China");
        trie.add("country:USA:state:MI");

        assert!(trie.find("c").is_empty());
        assert!(trie.find("cou").is_empty());
        assert!(trie.find("country:USA:stat").is_empty());
        assert!(trie.find("country:USB").is_empty());
        // A trailing delimiter is an extra (empty) component, not a match.
        assert!(trie.find("country:USA:").is_empty());
    }

    #[test]
    fn test_find_on_empty_trie() {
        let trie = PrefixTrie::new();
        assert!(trie.find("").is_empty());
        assert!(trie.find("anything").is_empty());
    }

    #[test]
    fn test_empty_string_is_a_valid_key() {
        let mut trie = PrefixTrie::new();
        trie.add("");

        assert_eq!(trie.find(""), vec![""]);
        assert!(trie.delete(""));
        assert!(trie.is_empty());
    }

    #[test]
    fn test_delete_leaf_prunes_ancestors() {
        let mut trie = PrefixTrie::new();
        trie.add("region:1:store:1:employee:1");

        assert!(trie.delete("region:1:store:1:employee:1"));

        // The whole chain was intermediate-only, so nothing may remain.
        assert!(trie.is_empty());
        assert!(trie.find("region").is_empty());
    }

    #[test]
    fn test_delete_stops_pruning_at_live_branches() {
        let mut trie = PrefixTrie::new();
        trie.add("region:1:store:1:employee:1");
        trie.add("region:1:manager");

        assert!(trie.delete("region:1:store:1:employee:1"));

        assert_eq!(trie.find(""), vec!["region:1:manager"]);
        // The store subtree is gone entirely, not just its leaf.
        assert!(trie.find("region:1:store").is_empty());
    }

    #[test]
    fn test_delete_key_with_children_keeps_subtree() {
        let mut trie = PrefixTrie::new();
        trie.add("region:1:store:1");
        trie.add("region:1:store:1:employee:1");

        assert!(trie.delete("region:1:store:1"));

        assert_eq!(trie.find(""), vec!["region:1:store:1:employee:1"]);
        // The prefix still resolves because the descendant key holds it open.
        assert_eq!(
            trie.find("region:1:store:1"),
            vec!["region:1:store:1:employee:1"]
        );
    }

    #[test]
    fn test_delete_absent_key_is_a_noop() {
        let mut trie = PrefixTrie::new();
        trie.add("region:1:manager");

        assert!(!trie.delete("region:2:manager"));
        // An intermediate prefix is not a key, so deleting it does nothing.
        assert!(!trie.delete("region:1"));
        assert_eq!(trie.find(""), vec!["region:1:manager"]);
    }

    #[test]
    fn test_delete_all_removes_subtree() {
        let mut trie = PrefixTrie::new();
        trie.add("region:1:store:1:employee:1");
        trie.add("region:1:store:1:employee:2");
        trie.add("region:1:manager");

        assert!(trie.delete_all("region:1:store:1"));

        assert_eq!(trie.find(""), vec!["region:1:manager"]);
        assert!(trie.find("region:1:store:1").is_empty());
    }

    #[test]
    fn test_delete_all_prunes_orphaned_ancestors() {
        let mut trie = PrefixTrie::new();
        trie.add("region:1:store:1:employee:1");
        trie.add("category:3:product:7");

        assert!(trie.delete_all("region:1:store"));

        // "region" and "region:1" were never keys and now have no
        // descendants, so they must not linger as phantom leaves.
        assert_eq!(trie.find(""), vec!["category:3:product:7"]);
        assert!(trie.find("region").is_empty());
    }

    #[test]
    fn test_delete_all_with_empty_prefix_clears_trie() {
        let mut trie = PrefixTrie::new();
        trie.add("region:1:manager");
        trie.add("category:3:product:7");

        assert!(trie.delete_all(""));
        assert!(trie.is_empty());

        // On an already-empty trie nothing is deleted.
        assert!(!trie.delete_all(""));
    }

    #[test]
    fn test_delete_all_on_absent_prefix() {
        let mut trie = PrefixTrie::new();
        trie.add("region:1:manager");

        assert!(!trie.delete_all("region:5"));
        assert!(!trie.delete_all("reg"));
        assert_eq!(trie.find(""), vec!["region:1:manager"]);
    }

    #[test]
    fn test_clear() {
        let mut trie = PrefixTrie::new();
        trie.add("a:b");
        trie.add("c");

        trie.clear();
        assert!(trie.is_empty());
        assert!(trie.find("").is_empty());
    }
}
