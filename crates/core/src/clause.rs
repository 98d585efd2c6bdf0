//! `MatchClauseData` and `MatchClauseExtractor` — spec §4.2.

use std::collections::VecDeque;

use serde_json::{Map, Value};
use trialmatch_storage::{Document, PathSegment};

/// One eligible `match` clause found inside a trial, together with the
/// context needed to translate and report it.
#[derive(Debug, Clone)]
pub struct MatchClauseData {
    /// The ordered criterion items under the `match` key.
    pub match_clause: Vec<Value>,
    /// Dict keys and list indices from the trial root to this clause.
    pub parent_path: Vec<PathSegment>,
    /// The innermost named container enclosing the clause: `step`, `arm`, `dose`, ...
    pub level: String,
    /// The dict that directly contains the `match` key (used to read
    /// suspension flags and other sibling fields).
    pub surrounding: Value,
}

/// Walks a trial document to locate every embedded, non-suspended `match`
/// clause.
///
/// Grounded on the work-queue traversal pattern used throughout
/// `crates/analyze` for graph/tree walks, generalized here to navigate an
/// untyped JSON tree instead of a typed step graph.
pub struct MatchClauseExtractor;

impl MatchClauseExtractor {
    /// Traversal is depth-first via stack (pop-from-tail) semantics; the
    /// emitted order is stable for a given input but is not a documented
    /// guarantee downstream stages may depend on.
    pub fn extract(trial_document: &Value) -> Vec<MatchClauseData> {
        let mut queue: VecDeque<(Vec<PathSegment>, String, Value)> = VecDeque::new();
        if let Some(obj) = trial_document.as_object() {
            for (key, value) in obj {
                if key == "match" {
                    continue;
                }
                queue.push_back((Vec::new(), key.clone(), value.clone()));
            }
        }

        let mut results = Vec::new();
        while let Some((path_so_far, current_key, current_value)) = queue.pop_back() {
            match current_value {
                Value::Object(map) => {
                    for (key, value) in &map {
                        if key == "match" {
                            let mut parent_path = path_so_far.clone();
                            parent_path.push(PathSegment::Key(current_key.clone()));
                            parent_path.push(PathSegment::Key("match".to_string()));
                            if let Some(clause) = build_clause_data(value, parent_path, &map) {
                                results.push(clause);
                            }
                        } else {
                            let mut next_path = path_so_far.clone();
                            next_path.push(PathSegment::Key(current_key.clone()));
                            queue.push_back((next_path, key.clone(), value.clone()));
                        }
                    }
                }
                Value::Array(items) => {
                    let mut next_path = path_so_far.clone();
                    next_path.push(PathSegment::Key(current_key.clone()));
                    for (index, item) in items.into_iter().enumerate() {
                        queue.push_back((next_path.clone(), index.to_string(), item));
                    }
                }
                _ => {} // scalars ignored
            }
        }
        results
    }
}

fn build_clause_data(
    match_value: &Value,
    parent_path: Vec<PathSegment>,
    surrounding: &Map<String, Value>,
) -> Option<MatchClauseData> {
    let level = derive_level(&parent_path);
    let surrounding_doc = Document::new(Value::Object(surrounding.clone()));
    if is_suspended(&level, &surrounding_doc) {
        return None;
    }
    let match_clause = match_value.as_array().cloned().unwrap_or_default();
    Some(MatchClauseData {
        match_clause,
        parent_path,
        level,
        surrounding: surrounding_doc.into_value(),
    })
}

/// The first non-integer element of the reversed parent path, excluding the
/// trailing literal `"match"` segment itself.
fn derive_level(parent_path: &[PathSegment]) -> String {
    let without_match = &parent_path[..parent_path.len().saturating_sub(1)];
    without_match
        .iter()
        .rev()
        .find_map(|seg| match seg {
            PathSegment::Key(k) => Some(k.clone()),
            PathSegment::Index(_) => None,
        })
        .unwrap_or_default()
}

/// A `match` clause is skipped when its level is a suspended arm/dose, or a
/// step whose every arm is suspended. An absent `arm` list at the `step`
/// level is treated as fully suspended (spec.md's open question — kept as
/// the documented behavior pending curator confirmation).
fn is_suspended(level: &str, surrounding: &Document) -> bool {
    match level {
        "arm" => surrounding.normalized_string_field("arm_suspended", "n") == "y",
        "dose" => surrounding.normalized_string_field("level_suspended", "n") == "y",
        "step" => match surrounding.get("arm").and_then(Value::as_array) {
            Some(arms) if !arms.is_empty() => arms.iter().all(|arm| {
                Document::new(arm.clone()).normalized_string_field("arm_suspended", "n") == "y"
            }),
            _ => true,
        },
        _ => false,
    }
}
