//! Criteria translation and two-phase document-store query execution.
//!
//! `CriteriaTranslator` maps a DNF match path to a `MultiCollectionQuery`
//! using an external transform configuration; `TwoPhaseQueryRunner` executes
//! that query against a `DocumentStore` with clinical-narrow /
//! genomic-filter join semantics.

pub mod query;
pub mod transforms;
pub mod translator;

pub use query::{MultiCollectionQuery, QueryError, RawQueryResult, TwoPhaseQueryRunner};
pub use transforms::{TransformArgs, TransformError, TransformFn};
pub use translator::{CollectionMapping, CriteriaTranslator, KeySettings, TranslateError, TransformConfig};
