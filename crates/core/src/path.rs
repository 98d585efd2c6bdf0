//! `MatchCriterion`/`MatchPathEnumerator` — spec §4.4.

use serde_json::Value;

use crate::tree::MatchTree;

/// A flat, ordered conjunction of criterion dicts — one conjunctive clause
/// of the tree's DNF expansion.
pub type MatchCriterion = Vec<Value>;

/// Produces the DNF expansion of a `MatchTree`: one path per leaf.
///
/// Grounded on `analyze_flow_paths`/`enumerate_flow_paths` in
/// `crates/analyze/src/s6_flow_paths.rs`: depth-first root-to-leaf
/// enumeration, concatenating per-node payloads along the way. The
/// cross-product of the original boolean expression falls out of the
/// tree's branching structure — no explicit Cartesian expansion is done.
pub struct MatchPathEnumerator;

impl MatchPathEnumerator {
    pub fn enumerate(tree: &MatchTree) -> Vec<MatchCriterion> {
        let mut paths = Vec::new();
        let mut acc = Vec::new();
        Self::walk(tree, 0, &mut acc, &mut paths);
        debug_assert!(acc.is_empty());
        paths
    }

    fn walk(tree: &MatchTree, node_id: usize, acc: &mut Vec<Value>, out: &mut Vec<MatchCriterion>) {
        let node = &tree.nodes[node_id];
        let mark = acc.len();
        acc.extend(node.criteria_list.iter().cloned());
        if node.children.is_empty() {
            out.push(acc.clone());
        } else {
            for &child in &node.children {
                Self::walk(tree, child, acc, out);
            }
        }
        acc.truncate(mark);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MatchTreeBuilder;
    use serde_json::json;

    #[test]
    fn root_only_tree_yields_one_path() {
        let clause = vec![
            json!({"genomic": {"HUGO": "BRAF"}}),
            json!({"clinical": {"AGE": ">=18"}}),
        ];
        let tree = MatchTreeBuilder::build(&clause);
        let paths = MatchPathEnumerator::enumerate(&tree);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].len(), 2);
    }

    #[test]
    fn top_level_or_yields_one_path_per_branch() {
        let clause = vec![json!({"or": [
            {"genomic": {"HUGO": "BRAF"}},
            {"genomic": {"HUGO": "KRAS"}},
        ]})];
        let tree = MatchTreeBuilder::build(&clause);
        let paths = MatchPathEnumerator::enumerate(&tree);
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.len() == 1));
    }

    #[test]
    fn nested_and_in_or_yields_two_paths_with_different_lengths() {
        let clause = vec![json!({"or": [
            {"and": [
                {"genomic": {"HUGO": "BRAF"}},
                {"genomic": {"VARIANT": "p.V600E"}},
            ]},
            {"clinical": {"AGE": ">=70"}},
        ]})];
        let tree = MatchTreeBuilder::build(&clause);
        let mut paths = MatchPathEnumerator::enumerate(&tree);
        paths.sort_by_key(|p| p.len());
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].len(), 1);
        assert_eq!(paths[1].len(), 2);
    }

    #[test]
    fn path_count_equals_leaf_count() {
        let clause = vec![json!({"or": [
            {"genomic": {"HUGO": "BRAF"}},
            {"genomic": {"HUGO": "KRAS"}},
            {"genomic": {"HUGO": "NRAS"}},
        ]})];
        let tree = MatchTreeBuilder::build(&clause);
        let paths = MatchPathEnumerator::enumerate(&tree);
        assert_eq!(paths.len(), tree.leaves().count());
    }
}
