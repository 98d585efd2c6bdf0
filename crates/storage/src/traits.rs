use async_trait::async_trait;

use crate::document::{AndClause, Document};
use crate::error::StoreError;

/// A queryable document backend: the one primitive all three collections
/// (`trial`, `clinical`, `genomic`) are read through.
///
/// Grounded on `DatabaseQuery`'s adapter/query-primitive split
/// (`crates/eval/src/adapter/database.rs`) and on the `Send + Sync + 'static`
/// bound used throughout the teacher's storage trait, which lets a backend
/// be held behind an `Arc<dyn DocumentStore>` and shared across worker tasks.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Find documents in `collection` matching ALL of `and_clauses`
    /// (conjunctive; each clause is itself a conjunction of field
    /// predicates), returning only the fields named in `projection` plus
    /// each document's id.
    ///
    /// An empty `projection` means "return the whole document."
    async fn find(
        &self,
        collection: &str,
        and_clauses: &[AndClause],
        projection: &[String],
    ) -> Result<Vec<(String, Document)>, StoreError>;
}
