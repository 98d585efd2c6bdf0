//! `MultiCollectionQuery`, `RawQueryResult`, `TwoPhaseQueryRunner` — spec §4.6.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde_json::{json, Value};
use trialmatch_storage::{AndClause, Document, DocumentStore, StoreError};

/// Produced by the translator: the predicates to run against each
/// collection for one DNF path. A path with no predicates in a category
/// leaves that category's list empty.
#[derive(Debug, Clone, Default)]
pub struct MultiCollectionQuery {
    pub clinical: Vec<AndClause>,
    pub genomic: Vec<AndClause>,
}

/// One per patient that satisfied the full path.
#[derive(Debug, Clone)]
pub struct RawQueryResult {
    pub clinical_id: String,
    pub clinical_doc: Document,
    pub genomic_docs: Vec<Document>,
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Executes a `MultiCollectionQuery` as a two-phase join: clinical narrows,
/// genomic filters by foreign key and set-intersects back into the
/// surviving clinical id set.
///
/// Grounded on `DatabaseAdapter`/`DatabaseQuery`'s split
/// (`crates/eval/src/adapter/database.rs`) between a thin domain-specific
/// caller and a generic query-execution primitive — here, `DocumentStore`.
pub struct TwoPhaseQueryRunner<S> {
    store: Arc<S>,
    join_field: String,
}

impl<S: DocumentStore> TwoPhaseQueryRunner<S> {
    pub fn new(store: Arc<S>, join_field: impl Into<String>) -> Self {
        TwoPhaseQueryRunner {
            store,
            join_field: join_field.into(),
        }
    }

    /// Per-clause document-store errors are fatal to *this path* only; the
    /// caller is expected to log and continue with the next path rather
    /// than propagate the failure further (spec §4.6, §7).
    pub async fn run(
        &self,
        query: &MultiCollectionQuery,
        clinical_projection: &[String],
        genomic_projection: &[String],
    ) -> Result<Vec<RawQueryResult>, QueryError> {
        let clinical_rows = self
            .store
            .find("clinical", &query.clinical, clinical_projection)
            .await?;

        if clinical_rows.is_empty() {
            tracing::info!("clinical phase matched no documents; short-circuiting path");
            return Ok(Vec::new());
        }

        let mut clinical_ids: BTreeSet<String> =
            clinical_rows.iter().map(|(id, _)| id.clone()).collect();
        let mut clinical_docs: HashMap<String, Document> = clinical_rows.into_iter().collect();
        let mut genomic_by_owner: HashMap<String, Vec<Document>> = HashMap::new();

        for clause in &query.genomic {
            if clinical_ids.is_empty() {
                tracing::info!("clinical_ids exhausted; no further genomic queries issued");
                break;
            }

            let mut augmented = clause.clone();
            let ids: Vec<Value> = clinical_ids.iter().map(|id| json!(id)).collect();
            augmented.insert(self.join_field.clone(), json!({ "$in": ids }));

            let mut projection = genomic_projection.to_vec();
            if !projection.iter().any(|f| f == &self.join_field) {
                projection.push(self.join_field.clone());
            }

            let rows = self
                .store
                .find("genomic", std::slice::from_ref(&augmented), &projection)
                .await?;

            let mut result_ids = BTreeSet::new();
            for (_, doc) in &rows {
                if let Some(owner) = doc.get(&self.join_field).and_then(Value::as_str) {
                    result_ids.insert(owner.to_string());
                }
            }

            clinical_ids = &clinical_ids & &result_ids;
            genomic_by_owner.retain(|owner, _| clinical_ids.contains(owner));
            for (_, doc) in rows {
                if let Some(owner) = doc.get(&self.join_field).and_then(Value::as_str) {
                    if clinical_ids.contains(owner) {
                        genomic_by_owner
                            .entry(owner.to_string())
                            .or_default()
                            .push(doc);
                    }
                }
            }
        }

        clinical_docs.retain(|id, _| clinical_ids.contains(id));
        let results = clinical_docs
            .into_iter()
            .map(|(id, doc)| {
                let genomic_docs = genomic_by_owner.remove(&id).unwrap_or_default();
                RawQueryResult {
                    clinical_id: id,
                    clinical_doc: doc,
                    genomic_docs,
                }
            })
            .collect();
        Ok(results)
    }
}
