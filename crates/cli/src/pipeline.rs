//! `run_pipeline` — wires `TrialSource` through `MatchClauseExtractor`,
//! `MatchTreeBuilder`, `MatchPathEnumerator`, and `CriteriaTranslator` on a
//! single-threaded producer, then dispatches each translated query onto a
//! fixed worker pool that runs `TwoPhaseQueryRunner`, per spec §5.
//!
//! Grounded on `crates/cli/src/runner.rs`'s result-collection loop shape for
//! the producer/worker-pool/emitter split.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use trialmatch_core::{
    MatchClauseData, MatchClauseExtractor, MatchCriterion, MatchPathEnumerator, MatchTreeBuilder, Trial, TrialSource,
};
use trialmatch_eval::{CriteriaTranslator, MultiCollectionQuery, QueryError, RawQueryResult, TranslateError, TwoPhaseQueryRunner};
use trialmatch_storage::DocumentStore;

use crate::config::AppConfig;
use crate::error::MatchError;

/// The final emitted unit — spec §3's `TrialMatch`.
#[derive(Debug, Clone)]
pub struct TrialMatch {
    pub trial: Trial,
    pub match_clause_data: MatchClauseData,
    pub match_path: MatchCriterion,
    pub query: MultiCollectionQuery,
    pub raw_results: Vec<RawQueryResult>,
}

struct QueryTask {
    trial: Trial,
    match_clause_data: MatchClauseData,
    match_path: MatchCriterion,
    query: MultiCollectionQuery,
}

const DEFAULT_JOIN_FIELD: &str = "CLINICAL_ID";

/// Runs the full pipeline against `store` and returns every emitted
/// `TrialMatch`. There is no cross-task ordering guarantee on the result,
/// per spec §5.
pub async fn run_pipeline<S: DocumentStore>(
    store: Arc<S>,
    config: &AppConfig,
    protocol_nos: Option<Vec<String>>,
    sample_ids: Option<Vec<String>>,
    cancel: CancellationToken,
) -> Result<Vec<TrialMatch>, MatchError> {
    let trial_source = TrialSource::new(store.clone());
    let trials = trial_source.open(protocol_nos.as_deref()).await?;

    let translator = Arc::new(CriteriaTranslator::new(config.transforms.clone()));
    let join_field = config
        .transforms
        .collection_mappings
        .get("genomic")
        .map(|mapping| mapping.join_field.clone())
        .unwrap_or_else(|| DEFAULT_JOIN_FIELD.to_string());
    let clinical_projection = Arc::new(config.transforms.clinical_projection.clone());
    let genomic_projection = Arc::new(config.transforms.genomic_projection.clone());
    let timeout = Duration::from_millis(config.concurrency.query_timeout_ms);

    let queue_capacity = config.concurrency.queue_capacity.max(1);
    let (task_tx, task_rx) = mpsc::channel::<QueryTask>(queue_capacity);
    let (result_tx, mut result_rx) = mpsc::channel::<TrialMatch>(queue_capacity);
    let task_rx = Arc::new(Mutex::new(task_rx));
    let fatal_store_error: Arc<StdMutex<Option<trialmatch_storage::StoreError>>> = Arc::new(StdMutex::new(None));

    let mut workers = Vec::new();
    for _ in 0..config.concurrency.workers.max(1) {
        let task_rx = task_rx.clone();
        let result_tx = result_tx.clone();
        let store = store.clone();
        let join_field = join_field.clone();
        let clinical_projection = clinical_projection.clone();
        let genomic_projection = genomic_projection.clone();
        let cancel = cancel.clone();
        let fatal_store_error = fatal_store_error.clone();
        workers.push(tokio::spawn(async move {
            let runner = TwoPhaseQueryRunner::new(store, join_field);
            loop {
                let task = match task_rx.lock().await.recv().await {
                    Some(task) => task,
                    None => break,
                };
                if cancel.is_cancelled() {
                    break;
                }
                let outcome = tokio::time::timeout(
                    timeout,
                    runner.run(&task.query, &clinical_projection, &genomic_projection),
                )
                .await;
                match outcome {
                    Ok(Ok(raw_results)) if !raw_results.is_empty() => {
                        let trial_match = TrialMatch {
                            trial: task.trial,
                            match_clause_data: task.match_clause_data,
                            match_path: task.match_path,
                            query: task.query,
                            raw_results,
                        };
                        if result_tx.send(trial_match).await.is_err() {
                            break;
                        }
                    }
                    Ok(Ok(_)) => {}
                    Ok(Err(QueryError::Store(err))) if err.is_path_local() => {
                        tracing::warn!(
                            protocol_no = %task.trial.protocol_no,
                            level = %task.match_clause_data.level,
                            error = %err,
                            "abandoning match path after store error"
                        );
                    }
                    Ok(Err(QueryError::Store(err))) => {
                        tracing::warn!(
                            protocol_no = %task.trial.protocol_no,
                            level = %task.match_clause_data.level,
                            error = %err,
                            "fatal store error, cancelling pipeline"
                        );
                        *fatal_store_error.lock().unwrap() = Some(err);
                        cancel.cancel();
                        break;
                    }
                    Err(_elapsed) => {
                        tracing::warn!(
                            protocol_no = %task.trial.protocol_no,
                            level = %task.match_clause_data.level,
                            "abandoning match path after query timeout"
                        );
                    }
                }
            }
        }));
    }
    drop(result_tx);

    let mut fatal: Option<MatchError> = None;
    'produce: for trial in &trials {
        if cancel.is_cancelled() {
            break;
        }
        for clause_data in MatchClauseExtractor::extract(trial.document()) {
            let tree = MatchTreeBuilder::build(&clause_data.match_clause);
            for path in MatchPathEnumerator::enumerate(&tree) {
                let query = match translator.translate(&path, &clause_data.parent_path, sample_ids.as_deref()) {
                    Ok(query) => query,
                    Err(TranslateError::UnknownTransform(name)) => {
                        fatal = Some(MatchError::UnknownTransform(name));
                        break 'produce;
                    }
                };
                let task = QueryTask {
                    trial: trial.clone(),
                    match_clause_data: clause_data.clone(),
                    match_path: path,
                    query,
                };
                if task_tx.send(task).await.is_err() {
                    break 'produce;
                }
            }
        }
    }
    drop(task_tx);

    if fatal.is_some() {
        cancel.cancel();
    }

    let mut matches = Vec::new();
    while let Some(trial_match) = result_rx.recv().await {
        matches.push(trial_match);
    }
    for worker in workers {
        let _ = worker.await;
    }

    if let Some(err) = fatal {
        return Err(err);
    }
    if let Some(err) = fatal_store_error.lock().unwrap().take() {
        return Err(MatchError::Store(err));
    }
    Ok(matches)
}
