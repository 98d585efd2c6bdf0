/// Errors raised while extracting or building match structures from a trial.
///
/// Grounded on the one-variant-per-failure-mode `thiserror` convention in
/// `trialmatch-storage`'s error type. `MalformedTrial` is never propagated
/// as a hard failure — callers log it and skip the offending trial, per the
/// pipeline's per-trial best-effort policy. `Store` wraps a connectivity
/// failure from the backing `DocumentStore` and IS fatal, since a trial
/// source that cannot reach its store has nothing to extract from.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("malformed trial '{protocol_no}': {reason}")]
    MalformedTrial { protocol_no: String, reason: String },

    #[error(transparent)]
    Store(#[from] trialmatch_storage::StoreError),
}
