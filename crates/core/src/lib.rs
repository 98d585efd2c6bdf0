//! Match-tree construction, DNF path enumeration, and trial extraction for
//! the clinical-trial matching pipeline.
//!
//! Covers the leaves-first stages upstream of criteria translation:
//! `TrialSource` reads open trials from a document store, `MatchClauseExtractor`
//! locates embedded eligibility clauses, `MatchTreeBuilder` turns one clause
//! into an explicit boolean tree, and `MatchPathEnumerator` expands that tree
//! into its DNF paths.

pub mod clause;
pub mod error;
pub mod path;
pub mod trial;
pub mod tree;

pub use clause::{MatchClauseData, MatchClauseExtractor};
pub use error::CoreError;
pub use path::{MatchCriterion, MatchPathEnumerator};
pub use trial::{Trial, TrialSource, OPEN_STATUS};
pub use tree::{MatchTree, MatchTreeBuilder, MatchTreeNode};
