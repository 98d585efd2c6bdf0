mod document;
mod error;
mod traits;

pub use document::{AndClause, Document, DocumentPredicate, PathSegment};
pub use error::StoreError;
pub use traits::DocumentStore;
