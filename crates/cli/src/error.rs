//! `MatchError` — spec §7's three fatal error kinds, crossing the pipeline
//! boundary as `Err`. `MalformedTrial`/`SkipCriterion`/`QueryTimeout`/
//! `TransientStoreError` never reach here; they are consumed as logged
//! control flow closer to where they occur.

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] trialmatch_storage::StoreError),

    #[error("unknown transform '{0}'")]
    UnknownTransform(String),
}

impl From<trialmatch_core::CoreError> for MatchError {
    fn from(err: trialmatch_core::CoreError) -> Self {
        match err {
            trialmatch_core::CoreError::Store(store_err) => MatchError::Store(store_err),
            other => MatchError::Config(other.to_string()),
        }
    }
}

impl From<trialmatch_eval::TranslateError> for MatchError {
    fn from(err: trialmatch_eval::TranslateError) -> Self {
        match err {
            trialmatch_eval::TranslateError::UnknownTransform(name) => MatchError::UnknownTransform(name),
        }
    }
}
