/// Errors a `DocumentStore` backend can return.
///
/// Mirrors spec.md §7's error kinds that originate at the store boundary:
/// `StoreConnectivityError` is fatal and surfaces to the caller;
/// `QueryTimeout`/`TransientStoreError` abandon the current path with a
/// warning but do not fail the pipeline. Grounded on
/// `crates/storage/src/error.rs`'s `StorageError` (thiserror, one variant
/// per failure mode rather than a single opaque string).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or authenticated against. Fatal.
    #[error("store connectivity error: {0}")]
    Connectivity(String),

    /// A query against `collection` exceeded its configured deadline.
    /// Non-fatal: the enclosing match path is abandoned.
    #[error("query against '{collection}' timed out after {deadline_ms}ms")]
    Timeout { collection: String, deadline_ms: u64 },

    /// A backend-specific, presumed-transient query failure. Non-fatal.
    #[error("transient store error on '{collection}': {message}")]
    Transient { collection: String, message: String },

    /// A backend-specific, non-transient query failure. Fatal to the path.
    #[error("store backend error on '{collection}': {message}")]
    Backend { collection: String, message: String },
}

impl StoreError {
    /// Whether this error should abandon only the current match path
    /// (logged as a warning) rather than propagate as fatal.
    pub fn is_path_local(&self) -> bool {
        matches!(self, StoreError::Timeout { .. } | StoreError::Transient { .. })
    }
}
