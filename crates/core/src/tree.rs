//! `MatchTree` and `MatchTreeBuilder` — spec §4.3.

use std::collections::VecDeque;

use serde_json::Value;

/// One node of a match tree. Node 0 is always the implicit root
/// (empty `criteria_list`, `is_or = false`).
///
/// Grounded on the owned-arena representation Design Note 3 calls for, in
/// place of a general graph library — mirroring the flat `Vec`-of-steps
/// shape `crates/analyze/src/s6_flow_paths.rs` uses for its step graph.
#[derive(Debug, Clone, Default)]
pub struct MatchTreeNode {
    pub criteria_list: Vec<Value>,
    pub is_or: bool,
    pub children: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct MatchTree {
    pub nodes: Vec<MatchTreeNode>,
}

impl MatchTree {
    pub fn root(&self) -> &MatchTreeNode {
        &self.nodes[0]
    }

    pub fn leaves(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.nodes.len()).filter(move |&id| self.nodes[id].children.is_empty())
    }
}

/// Converts a `MatchClause` (ordered criterion items) into an explicit
/// boolean tree.
///
/// Grounded on `Predicate::And`/`Predicate::Or` recursive construction in
/// `crates/eval/src/predicate.rs`, adapted from an evaluator (which
/// recurses at eval time) to a builder (which recurses at construction time
/// to materialize an explicit node arena).
pub struct MatchTreeBuilder;

impl MatchTreeBuilder {
    pub fn build(match_clause: &[Value]) -> MatchTree {
        let mut nodes = vec![MatchTreeNode::default()];
        let mut queue: VecDeque<(usize, Value)> =
            match_clause.iter().cloned().map(|item| (0, item)).collect();

        while let Some((parent_id, criterion)) = queue.pop_front() {
            let Some(map) = criterion.as_object() else {
                continue;
            };
            for (label, value) in map {
                match label.as_str() {
                    "and" => {
                        // Flatten onto the parent — unless the parent is an
                        // OR node, in which case this "and" group needs its
                        // own accumulator node so its conjuncts land on one
                        // shared leaf instead of each becoming its own
                        // sibling branch of the OR.
                        let target_parent = if nodes[parent_id].is_or {
                            let new_id = nodes.len();
                            nodes.push(MatchTreeNode::default());
                            nodes[parent_id].children.push(new_id);
                            new_id
                        } else {
                            parent_id
                        };
                        if let Some(items) = value.as_array() {
                            for item in items {
                                queue.push_back((target_parent, item.clone()));
                            }
                        }
                    }
                    "or" => {
                        let new_id = nodes.len();
                        nodes.push(MatchTreeNode {
                            is_or: true,
                            ..Default::default()
                        });
                        nodes[parent_id].children.push(new_id);
                        if let Some(items) = value.as_array() {
                            for item in items {
                                queue.push_back((new_id, item.clone()));
                            }
                        }
                    }
                    "genomic" | "clinical" => {
                        if nodes[parent_id].is_or {
                            let new_id = nodes.len();
                            nodes.push(MatchTreeNode {
                                criteria_list: vec![criterion.clone()],
                                ..Default::default()
                            });
                            nodes[parent_id].children.push(new_id);
                        } else {
                            nodes[parent_id].criteria_list.push(criterion.clone());
                        }
                    }
                    _ => {}
                }
            }
        }
        MatchTree { nodes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn simple_and_produces_single_root_with_two_leaf_criteria() {
        let clause = vec![
            json!({"genomic": {"HUGO": "BRAF"}}),
            json!({"clinical": {"AGE": ">=18"}}),
        ];
        let tree = MatchTreeBuilder::build(&clause);
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.root().criteria_list.len(), 2);
        assert!(!tree.root().is_or);
    }

    #[test]
    fn top_level_or_creates_two_or_children() {
        let clause = vec![json!({"or": [
            {"genomic": {"HUGO": "BRAF"}},
            {"genomic": {"HUGO": "KRAS"}},
        ]})];
        let tree = MatchTreeBuilder::build(&clause);
        // root -> or-node -> two leaves, one per branch.
        assert_eq!(tree.nodes.len(), 4);
        assert!(tree.root().criteria_list.is_empty());
        assert_eq!(tree.root().children.len(), 1);
        let or_node = &tree.nodes[tree.root().children[0]];
        assert!(or_node.is_or);
        assert_eq!(or_node.children.len(), 2);
        for &child in &or_node.children {
            assert_eq!(tree.nodes[child].criteria_list.len(), 1);
        }
    }

    #[test]
    fn and_is_flattened_onto_parent_without_new_nodes() {
        let clause = vec![json!({"and": [
            {"genomic": {"HUGO": "BRAF"}},
            {"genomic": {"VARIANT": "p.V600E"}},
        ]})];
        let tree = MatchTreeBuilder::build(&clause);
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.root().criteria_list.len(), 2);
    }

    #[test]
    fn nested_and_in_or_produces_two_paths_worth_of_structure() {
        let clause = vec![json!({"or": [
            {"and": [
                {"genomic": {"HUGO": "BRAF"}},
                {"genomic": {"VARIANT": "p.V600E"}},
            ]},
            {"clinical": {"AGE": ">=70"}},
        ]})];
        let tree = MatchTreeBuilder::build(&clause);
        // root -> or-node -> [and-accumulator(2 criteria), clinical-leaf(1 criterion)]
        assert_eq!(tree.nodes.len(), 4);
        let and_child = tree.nodes.iter().find(|n| n.criteria_list.len() == 2).unwrap();
        assert!(!and_child.is_or);
        let clinical_child = tree.nodes.iter().find(|n| n.criteria_list.len() == 1).unwrap();
        assert!(!clinical_child.is_or);
    }
}
