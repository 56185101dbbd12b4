//! Append-only binary index over pattern handlers.
//!
//! Nodes live in an arena and refer to each other by index. Insertion walks from the root and, at
//! each node, tests the node's pattern against the *source text* of the new pattern: a match goes
//! left, a miss goes right. Chains of left children therefore hold patterns the ancestor accepts as
//! text, which lookup treats as "more specific". Nothing is ever removed or rebalanced.

use crate::pattern::{PatternHandler, PatternMatcher};

type NodeId = usize;

struct Node {
    handler: PatternHandler,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

/// Specificity-aware pattern index. The root is always node 0.
#[derive(Default)]
pub struct DispatchTree {
    nodes: Vec<Node>,
}

impl DispatchTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence of left/right turns from the root to the node holding `pattern`
    /// (`false` = left, `true` = right). Empty for the root; `None` if absent.
    pub fn path_to(&self, pattern: &str) -> Option<Vec<bool>> {
        let mut id = self
            .nodes
            .iter()
            .position(|n| n.handler.source() == pattern)?;
        let mut turns = Vec::new();
        while let Some(parent) = self.nodes[id].parent {
            turns.push(self.nodes[parent].right == Some(id));
            id = parent;
        }
        turns.reverse();
        Some(turns)
    }

    fn descend(&self, text: &str) -> Option<NodeId> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut current = 0;
        loop {
            let node = &self.nodes[current];
            if node.handler.matches(text) {
                match node.left {
                    Some(left) => current = left,
                    None => return Some(current),
                }
            } else {
                match node.right {
                    Some(right) => current = right,
                    None => return node.parent,
                }
            }
        }
    }
}

impl PatternMatcher for DispatchTree {
    fn insert(&mut self, handler: PatternHandler) {
        let id = self.nodes.len();
        if self.nodes.is_empty() {
            self.nodes.push(Node {
                handler,
                parent: None,
                left: None,
                right: None,
            });
            return;
        }

        let mut current = 0;
        loop {
            let go_left = self.nodes[current].handler.matches(handler.source());
            let node = &mut self.nodes[current];
            let slot = if go_left {
                &mut node.left
            } else {
                &mut node.right
            };
            match *slot {
                Some(next) => current = next,
                None => {
                    *slot = Some(id);
                    break;
                }
            }
        }

        self.nodes.push(Node {
            handler,
            parent: Some(current),
            left: None,
            right: None,
        });
    }

    fn lookup(&self, text: &str, scope: &str) -> Option<&PatternHandler> {
        let mut cursor = self.descend(text);
        // Climb towards the root; the first node accepting the scope wins, matched or not.
        while let Some(id) = cursor {
            let node = &self.nodes[id];
            if node.handler.accepts(scope) {
                return Some(&node.handler);
            }
            cursor = node.parent;
        }
        None
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}

impl std::fmt::Debug for DispatchTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.nodes.iter().map(|n| &n.handler))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::tests::noop;

    fn tree_of(patterns: &[(&str, &str)]) -> DispatchTree {
        let mut tree = DispatchTree::new();
        for (pattern, scope) in patterns {
            tree.insert(PatternHandler::new(pattern, [*scope], noop()).unwrap());
        }
        tree
    }

    #[test]
    fn test_empty_tree_finds_nothing() {
        let tree = DispatchTree::new();
        assert!(tree.lookup("/start", "private").is_none());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_insertion_paths() {
        let tree = tree_of(&[
            ("help", "all"),
            ("help admin", "all"),
            ("settings", "all"),
            ("help admin ban", "all"),
        ]);

        assert_eq!(tree.path_to("help"), Some(vec![]));
        // "help" matches the text "help admin" -> left.
        assert_eq!(tree.path_to("help admin"), Some(vec![false]));
        // "help" does not match "settings" -> right.
        assert_eq!(tree.path_to("settings"), Some(vec![true]));
        // left, then "help admin" matches "help admin ban" -> left again.
        assert_eq!(tree.path_to("help admin ban"), Some(vec![false, false]));
        assert_eq!(tree.path_to("missing"), None);
    }

    #[test]
    fn test_lookup_prefers_more_specific_descendant() {
        let tree = tree_of(&[("help", "all"), ("help admin", "all")]);
        assert_eq!(tree.lookup("help admin now", "private").unwrap().source(), "help admin");
        assert_eq!(tree.lookup("help me", "private").unwrap().source(), "help");
    }

    #[test]
    fn test_lookup_climbs_when_scope_rejects() {
        let tree = tree_of(&[("help", "all"), ("help admin", "group")]);
        assert_eq!(tree.lookup("help admin", "group").unwrap().source(), "help admin");
        assert_eq!(tree.lookup("help admin", "private").unwrap().source(), "help");
    }

    #[test]
    fn test_lookup_follows_right_branch() {
        let tree = tree_of(&[("help", "all"), ("settings", "all"), ("about", "all")]);
        assert_eq!(tree.lookup("open settings", "private").unwrap().source(), "settings");
        assert_eq!(tree.lookup("about us", "private").unwrap().source(), "about");
    }

    #[test]
    fn test_miss_at_leaf_stops_at_parent() {
        // "settings" sits right of "help"; neither matches "hello", descent stops at "help".
        let tree = tree_of(&[("help", "all"), ("settings", "all")]);
        assert_eq!(tree.lookup("hello", "private").unwrap().source(), "help");
    }

    #[test]
    fn test_climb_checks_scope_only() {
        // Descent ends at "settings", which rejects "private"; the climb reaches the wildcard root.
        let tree = tree_of(&[("help", "all"), ("settings", "group")]);
        assert_eq!(tree.lookup("open settings", "group").unwrap().source(), "settings");
        assert_eq!(tree.lookup("open settings", "private").unwrap().source(), "help");
    }

    #[test]
    fn test_climb_exhausts_root_without_scope_match() {
        let tree = tree_of(&[("help", "group"), ("settings", "group")]);
        assert!(tree.lookup("open settings", "private").is_none());
    }
}
