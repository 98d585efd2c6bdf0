//! `FileDocumentStore` — a `DocumentStore` backed by JSON fixture files, one
//! array-of-documents file per collection. Predicate matching is
//! operator-aware (`$in`/`$gte`/`$lte`/`$ne`/`$regex`, or bare equality),
//! mirroring the predicate shapes `CriteriaTranslator`'s transforms emit.
//!
//! This stands in for the document-store connection spec.md treats as an
//! external collaborator; it exists so the pipeline has a concrete backend
//! to run against, not as a production storage engine.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};
use trialmatch_storage::{AndClause, Document, DocumentStore, StoreError};

const COLLECTIONS: &[&str] = &["trial", "clinical", "genomic"];

pub struct FileDocumentStore {
    collections: HashMap<String, Vec<(String, Document)>>,
}

impl FileDocumentStore {
    pub fn load(fixtures_dir: &Path) -> Result<FileDocumentStore, StoreError> {
        let mut collections = HashMap::new();
        for &name in COLLECTIONS {
            let path = fixtures_dir.join(format!("{name}.json"));
            let text = fs::read_to_string(&path)
                .map_err(|err| StoreError::Connectivity(format!("{}: {err}", path.display())))?;
            let value: Value = serde_json::from_str(&text)
                .map_err(|err| StoreError::Connectivity(format!("{}: {err}", path.display())))?;
            let items = value.as_array().cloned().unwrap_or_default();
            let rows = items
                .into_iter()
                .enumerate()
                .map(|(i, doc)| {
                    let id = doc
                        .get("_id")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("{name}-{i}"));
                    (id, Document::new(doc))
                })
                .collect();
            collections.insert(name.to_string(), rows);
        }
        Ok(FileDocumentStore { collections })
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn find(
        &self,
        collection: &str,
        and_clauses: &[AndClause],
        projection: &[String],
    ) -> Result<Vec<(String, Document)>, StoreError> {
        let rows = self.collections.get(collection).ok_or_else(|| StoreError::Backend {
            collection: collection.to_string(),
            message: "unknown collection".to_string(),
        })?;

        let matched = rows
            .iter()
            .filter(|(_, doc)| and_clauses.iter().all(|clause| clause_matches(clause, doc)))
            .map(|(id, doc)| (id.clone(), project(doc, projection)))
            .collect();
        Ok(matched)
    }
}

fn clause_matches(clause: &AndClause, doc: &Document) -> bool {
    clause.iter().all(|(field, pred)| predicate_matches(doc.get(field), pred))
}

fn predicate_matches(value: Option<&Value>, pred: &Value) -> bool {
    let Some(ops) = pred.as_object() else {
        return value == Some(pred);
    };
    ops.iter().all(|(op, operand)| match op.as_str() {
        "$in" => operand
            .as_array()
            .map(|choices| value.map(|v| choices.contains(v)).unwrap_or(false))
            .unwrap_or(false),
        "$gte" => compare_strings(value, operand, |v, o| v >= o),
        "$lte" => compare_strings(value, operand, |v, o| v <= o),
        "$ne" => value != Some(operand),
        "$regex" => match (value.and_then(Value::as_str), operand.as_str()) {
            (Some(v), Some(pattern)) => Regex::new(pattern).map(|re| re.is_match(v)).unwrap_or(false),
            _ => false,
        },
        _ => false,
    })
}

fn compare_strings(value: Option<&Value>, operand: &Value, cmp: impl Fn(&str, &str) -> bool) -> bool {
    match (value.and_then(Value::as_str), operand.as_str()) {
        (Some(v), Some(o)) => cmp(v, o),
        _ => false,
    }
}

fn project(doc: &Document, projection: &[String]) -> Document {
    if projection.is_empty() {
        return doc.clone();
    }
    let mut map = Map::new();
    if let Some(obj) = doc.as_object() {
        for field in projection {
            if let Some(value) = obj.get(field) {
                map.insert(field.clone(), value.clone());
            }
        }
        if let Some(id) = obj.get("_id") {
            map.insert("_id".to_string(), id.clone());
        }
    }
    Document::new(Value::Object(map))
}
