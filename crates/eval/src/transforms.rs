//! The fixed transform-function registry — spec §4.5 / Design Note 1.
//!
//! Each transform maps one curated `(trial_key, trial_value)` pair to zero
//! or more `(document_field, document_predicate)` entries. Dispatch is by
//! string name out of [`registry`], mirroring the `AdapterRegistry`
//! protocol → adapter lookup in `crates/eval/src/adapter/mod.rs`.

use std::collections::HashMap;

use serde_json::{json, Value};
use trialmatch_storage::PathSegment;

use crate::translator::KeySettings;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("this predicate contributes nothing")]
    SkipCriterion,
}

pub struct TransformArgs<'a> {
    pub trial_key: &'a str,
    pub sample_key: &'a str,
    pub trial_value: &'a Value,
    pub parent_path: &'a [PathSegment],
    /// The category (`"genomic"` or `"clinical"`) this key was found under —
    /// spec.md §4.5's `trial_path`. None of the registered transforms need
    /// it yet, but a transform that behaves differently depending on
    /// category can read it.
    pub trial_path: &'a str,
    pub settings: &'a KeySettings,
}

pub type TransformFn = fn(&TransformArgs) -> Result<Vec<(String, Value)>, TransformError>;

pub fn registry() -> HashMap<&'static str, TransformFn> {
    let mut m: HashMap<&'static str, TransformFn> = HashMap::new();
    m.insert("nomap", nomap);
    m.insert("age_to_birthdate_range", age_to_birthdate_range);
    m.insert("hugo_symbol", hugo_symbol);
    m.insert("variant_exclusion_aware", variant_exclusion_aware);
    m.insert("wildcard_protein_change", wildcard_protein_change);
    m.insert("oncotree_descendants", oncotree_descendants);
    m
}

/// Passes the trial value through untouched as an equality predicate.
fn nomap(args: &TransformArgs) -> Result<Vec<(String, Value)>, TransformError> {
    Ok(vec![(args.sample_key.to_string(), args.trial_value.clone())])
}

fn split_comparator(raw: &str) -> (&str, &str) {
    for op in [">=", "<=", ">", "<", "="] {
        if let Some(rest) = raw.strip_prefix(op) {
            return (op, rest.trim());
        }
    }
    ("=", raw.trim())
}

/// Rewrites a curated `"AGE"` comparator (`">=18"`) into a birthdate-field
/// range predicate, at year granularity. `current_year` is approximated
/// from the wall clock rather than pulling in a calendar crate, since the
/// pipeline only needs comparisons accurate to the year.
fn age_to_birthdate_range(args: &TransformArgs) -> Result<Vec<(String, Value)>, TransformError> {
    let Some(raw) = args.trial_value.as_str() else {
        return Err(TransformError::SkipCriterion);
    };
    let (op, number) = split_comparator(raw);
    let Ok(age) = number.parse::<i64>() else {
        return Err(TransformError::SkipCriterion);
    };
    let cutoff_year = current_year() - age;
    let pred = match op {
        // at least `age` years old => born on or before the end of cutoff_year
        ">=" => json!({ "$lte": format!("{cutoff_year:04}-12-31") }),
        ">" => json!({ "$lte": format!("{:04}-12-31", cutoff_year - 1) }),
        "<=" => json!({ "$gte": format!("{cutoff_year:04}-01-01") }),
        "<" => json!({ "$gte": format!("{:04}-01-01", cutoff_year + 1) }),
        _ => json!({
            "$gte": format!("{cutoff_year:04}-01-01"),
            "$lte": format!("{cutoff_year:04}-12-31"),
        }),
    };
    Ok(vec![("BIRTH_DATE".to_string(), pred)])
}

fn current_year() -> i64 {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    1970 + (secs / (365 * 86400 + 86400 / 4)) as i64
}

const HUGO_ALIASES: &[(&str, &str)] = &[("HER2", "ERBB2"), ("PD-L1", "CD274"), ("PD1", "PDCD1")];

/// Canonicalizes a curated gene alias to its HUGO symbol.
fn hugo_symbol(args: &TransformArgs) -> Result<Vec<(String, Value)>, TransformError> {
    let Some(raw) = args.trial_value.as_str() else {
        return Err(TransformError::SkipCriterion);
    };
    let upper = raw.trim().to_ascii_uppercase();
    let canonical = HUGO_ALIASES
        .iter()
        .find(|(alias, _)| *alias == upper)
        .map(|(_, canon)| *canon)
        .unwrap_or(upper.as_str());
    Ok(vec![(args.sample_key.to_string(), json!(canonical))])
}

/// A curated value prefixed with `!` excludes the named classification
/// instead of requiring it.
fn variant_exclusion_aware(args: &TransformArgs) -> Result<Vec<(String, Value)>, TransformError> {
    let Some(raw) = args.trial_value.as_str() else {
        return Err(TransformError::SkipCriterion);
    };
    let pred = match raw.strip_prefix('!') {
        Some(excluded) => json!({ "$ne": excluded }),
        None => json!(raw),
    };
    Ok(vec![(args.sample_key.to_string(), pred)])
}

/// Rewrites a `*`-wildcarded protein change (`"p.V600*"`) into a regex
/// predicate.
fn wildcard_protein_change(args: &TransformArgs) -> Result<Vec<(String, Value)>, TransformError> {
    let Some(raw) = args.trial_value.as_str() else {
        return Err(TransformError::SkipCriterion);
    };
    if !raw.contains('*') {
        return Ok(vec![(args.sample_key.to_string(), json!(raw))]);
    }
    let mut pattern = String::from("^");
    for ch in raw.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            c if "\\.+?()[]{}|^$".contains(c) => {
                pattern.push('\\');
                pattern.push(c);
            }
            c => pattern.push(c),
        }
    }
    pattern.push('$');
    Ok(vec![(args.sample_key.to_string(), json!({ "$regex": pattern }))])
}

const ONCOTREE_DESCENDANTS: &[(&str, &[&str])] = &[
    ("LUNG", &["LUNG", "NSCLC", "SCLC"]),
    ("BREAST", &["BREAST", "IDC", "ILC"]),
];

/// Expands a tumor-type code to itself plus its known Oncotree descendants.
fn oncotree_descendants(args: &TransformArgs) -> Result<Vec<(String, Value)>, TransformError> {
    let Some(raw) = args.trial_value.as_str() else {
        return Err(TransformError::SkipCriterion);
    };
    let upper = raw.trim().to_ascii_uppercase();
    let descendants: Vec<String> = ONCOTREE_DESCENDANTS
        .iter()
        .find(|(code, _)| *code == upper)
        .map(|(_, d)| d.iter().map(|s| s.to_string()).collect())
        .unwrap_or_else(|| vec![upper.clone()]);
    Ok(vec![(args.sample_key.to_string(), json!({ "$in": descendants }))])
}
