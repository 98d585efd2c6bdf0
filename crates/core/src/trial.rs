//! `Trial` and `TrialSource` — spec §3 / §4.1.

use std::sync::Arc;

use serde_json::{json, Value};
use trialmatch_storage::{AndClause, Document, DocumentStore};

use crate::error::CoreError;

/// The normalized status string a trial must carry to be eligible for
/// extraction. Per the resolved status-normalization ambiguity, matching is
/// exact equality after lowercasing and trimming — not substring containment.
pub const OPEN_STATUS: &str = "open to accrual";

const TRIAL_PROJECTION: &[&str] = &["protocol_no", "nct_id", "treatment_list", "_summary", "status"];

/// A curated trial, projected down to the fields the pipeline reads.
///
/// `document` retains the full projected object so `MatchClauseExtractor`
/// can walk it structurally; the accessors below are conveniences over the
/// same underlying value.
#[derive(Debug, Clone)]
pub struct Trial {
    pub protocol_no: String,
    document: Value,
}

impl Trial {
    pub fn from_document(protocol_no: &str, doc: &Document) -> Result<Trial, CoreError> {
        if doc.get("status").and_then(Value::as_str).is_none() {
            return Err(CoreError::MalformedTrial {
                protocol_no: protocol_no.to_string(),
                reason: "missing 'status' field".to_string(),
            });
        }
        Ok(Trial {
            protocol_no: protocol_no.to_string(),
            document: doc.as_value().clone(),
        })
    }

    pub fn nct_id(&self) -> Option<&str> {
        self.document.get("nct_id").and_then(Value::as_str)
    }

    pub fn status(&self) -> &str {
        self.document
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn treatment_list(&self) -> &Value {
        static NULL: Value = Value::Null;
        self.document.get("treatment_list").unwrap_or(&NULL)
    }

    pub fn summary(&self) -> &Value {
        static NULL: Value = Value::Null;
        self.document.get("_summary").unwrap_or(&NULL)
    }

    /// The raw projected document, as `MatchClauseExtractor` walks it.
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn is_open(&self) -> bool {
        self.status().trim().to_ascii_lowercase() == OPEN_STATUS
    }
}

/// Reads trial documents from a `DocumentStore`, optionally filtered to an
/// explicit set of protocol numbers, yielding only open trials.
///
/// Grounded on `crates/eval/src/fact_provider.rs`'s `FactProvider` shape: a
/// thin struct wrapping a store handle with one read entry point.
pub struct TrialSource<S> {
    store: Arc<S>,
}

impl<S: DocumentStore> TrialSource<S> {
    pub fn new(store: Arc<S>) -> Self {
        TrialSource { store }
    }

    /// `open(protocol_filter) -> lazy sequence of Trial` (materialized as a
    /// `Vec` here since the store trait fetches eagerly — see SPEC_FULL.md
    /// §4.1). No per-trial error is fatal; malformed documents are logged
    /// and skipped, non-open trials are logged and skipped.
    pub async fn open(&self, protocol_filter: Option<&[String]>) -> Result<Vec<Trial>, CoreError> {
        let mut and_clauses = Vec::new();
        if let Some(protocols) = protocol_filter {
            if !protocols.is_empty() {
                let mut clause = AndClause::new();
                clause.insert("protocol_no".to_string(), json!({ "$in": protocols }));
                and_clauses.push(clause);
            }
        }
        let projection: Vec<String> = TRIAL_PROJECTION.iter().map(|s| s.to_string()).collect();
        let rows = self
            .store
            .find("trial", &and_clauses, &projection)
            .await
            .map_err(CoreError::Store)?;

        let mut trials = Vec::new();
        for (id, doc) in rows {
            match Trial::from_document(&id, &doc) {
                Ok(trial) if trial.is_open() => trials.push(trial),
                Ok(trial) => {
                    tracing::debug!(protocol_no = %trial.protocol_no, status = %trial.status(), "skipping non-open trial");
                }
                Err(err) => {
                    tracing::warn!(protocol_no = %id, error = %err, "skipping malformed trial");
                }
            }
        }
        Ok(trials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use trialmatch_storage::StoreError;

    struct FakeStore(Vec<(String, Document)>);

    #[async_trait]
    impl DocumentStore for FakeStore {
        async fn find(
            &self,
            collection: &str,
            _and_clauses: &[AndClause],
            _projection: &[String],
        ) -> Result<Vec<(String, Document)>, StoreError> {
            assert_eq!(collection, "trial");
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn open_skips_non_open_and_malformed_trials() {
        let store = Arc::new(FakeStore(vec![
            (
                "PN-1".to_string(),
                Document::new(json!({"status": "Open to Accrual ", "protocol_no": "PN-1"})),
            ),
            (
                "PN-2".to_string(),
                Document::new(json!({"status": "closed to accrual", "protocol_no": "PN-2"})),
            ),
            ("PN-3".to_string(), Document::new(json!({"protocol_no": "PN-3"}))),
        ]));
        let source = TrialSource::new(store);
        let trials = source.open(None).await.unwrap();
        assert_eq!(trials.len(), 1);
        assert_eq!(trials[0].protocol_no, "PN-1");
        assert!(trials[0].is_open());
    }
}
