//! `CriteriaTranslator` — spec §4.5.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use trialmatch_core::MatchCriterion;
use trialmatch_storage::{AndClause, PathSegment};

use crate::query::MultiCollectionQuery;
use crate::transforms::{self, TransformArgs, TransformError};

/// Deserialized shape of the external transform-configuration document —
/// spec §6's four top-level keys, loaded from TOML by the CLI's config
/// loader and handed to the translator as-is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransformConfig {
    #[serde(default)]
    pub trial_key_mappings: HashMap<String, HashMap<String, KeySettings>>,
    #[serde(default)]
    pub collection_mappings: HashMap<String, CollectionMapping>,
    #[serde(default)]
    pub clinical_projection: Vec<String>,
    #[serde(default)]
    pub genomic_projection: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionMapping {
    pub join_field: String,
    #[serde(default)]
    pub projection: Vec<String>,
}

/// Per-trial-key settings. `ignore`/unknown-transform handling is table-driven
/// off this struct rather than hardcoded per key (Design Note 1).
#[derive(Debug, Clone, Deserialize)]
pub struct KeySettings {
    #[serde(default)]
    pub ignore: bool,
    #[serde(default = "default_sample_value")]
    pub sample_value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_sample_value() -> String {
    "nomap".to_string()
}

impl Default for KeySettings {
    fn default() -> Self {
        KeySettings {
            ignore: false,
            sample_value: default_sample_value(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("unknown transform '{0}'")]
    UnknownTransform(String),
}

/// Maps the curation-side vocabulary to the document-store's field
/// vocabulary. Grounded on the adapter-registry dispatch pattern in
/// `crates/eval/src/adapter/mod.rs` (protocol → adapter lookup): here the
/// lookup key is a trial key rather than a protocol name.
pub struct CriteriaTranslator {
    config: TransformConfig,
    registry: HashMap<&'static str, transforms::TransformFn>,
}

impl CriteriaTranslator {
    pub fn new(config: TransformConfig) -> Self {
        CriteriaTranslator {
            config,
            registry: transforms::registry(),
        }
    }

    fn settings_for<'a>(&'a self, category: &str, trial_key: &str) -> std::borrow::Cow<'a, KeySettings> {
        self.config
            .trial_key_mappings
            .get(category)
            .and_then(|m| m.get(&trial_key.to_ascii_uppercase()))
            .map(std::borrow::Cow::Borrowed)
            .unwrap_or_else(|| std::borrow::Cow::Owned(KeySettings::default()))
    }

    /// Translates one DNF path into a `MultiCollectionQuery`, per spec §4.5.
    /// `sample_ids` overrides the default `VITAL_STATUS: alive` filter when
    /// supplied and non-empty.
    pub fn translate(
        &self,
        path: &MatchCriterion,
        parent_path: &[PathSegment],
        sample_ids: Option<&[String]>,
    ) -> Result<MultiCollectionQuery, TranslateError> {
        let mut query = MultiCollectionQuery::default();

        for criterion in path {
            let Some(map) = criterion.as_object() else { continue };
            for (category, inner) in map {
                let target = match category.as_str() {
                    "genomic" => &mut query.genomic,
                    "clinical" => &mut query.clinical,
                    _ => continue,
                };
                let Some(inner_map) = inner.as_object() else { continue };
                let clause = self.translate_inner(category, inner_map, parent_path)?;
                target.push(clause);
            }
        }

        let mut default_clause = AndClause::new();
        match sample_ids.filter(|ids| !ids.is_empty()) {
            Some(ids) => {
                default_clause.insert("SAMPLE_ID".to_string(), json!({ "$in": ids }));
            }
            None => {
                default_clause.insert("VITAL_STATUS".to_string(), json!("alive"));
            }
        }
        query.clinical.push(default_clause);

        Ok(query)
    }

    fn translate_inner(
        &self,
        category: &str,
        inner_map: &Map<String, Value>,
        parent_path: &[PathSegment],
    ) -> Result<AndClause, TranslateError> {
        let mut clause = AndClause::new();
        for (trial_key, trial_value) in inner_map {
            let settings = self.settings_for(category, trial_key);
            if settings.ignore {
                continue;
            }
            let transform_fn = self
                .registry
                .get(settings.sample_value.as_str())
                .ok_or_else(|| TranslateError::UnknownTransform(settings.sample_value.clone()))?;
            let sample_key = settings
                .extra
                .get("sample_key")
                .and_then(Value::as_str)
                .unwrap_or(trial_key);
            let args = TransformArgs {
                trial_key,
                sample_key,
                trial_value,
                parent_path,
                trial_path: category,
                settings: &settings,
            };
            match transform_fn(&args) {
                Ok(entries) => {
                    for (field, pred) in entries {
                        clause.insert(field, pred);
                    }
                }
                Err(TransformError::SkipCriterion) => {
                    tracing::info!(trial_key, "transform skipped criterion");
                }
            }
        }
        Ok(clause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config_with(category: &str, trial_key: &str, sample_value: &str) -> TransformConfig {
        let mut inner = HashMap::new();
        inner.insert(
            trial_key.to_string(),
            KeySettings {
                ignore: false,
                sample_value: sample_value.to_string(),
                extra: Map::new(),
            },
        );
        let mut mappings = HashMap::new();
        mappings.insert(category.to_string(), inner);
        TransformConfig {
            trial_key_mappings: mappings,
            ..Default::default()
        }
    }

    #[test]
    fn translates_simple_path_with_default_alive_filter() {
        let translator = CriteriaTranslator::new(TransformConfig::default());
        let path: MatchCriterion = vec![
            json!({"genomic": {"HUGO": "BRAF"}}),
            json!({"clinical": {"AGE": ">=18"}}),
        ];
        let query = translator.translate(&path, &[], None).unwrap();
        assert_eq!(query.genomic.len(), 1);
        assert_eq!(query.genomic[0].get("HUGO"), Some(&json!("BRAF")));
        // one clause from the path + one default clause
        assert_eq!(query.clinical.len(), 2);
        assert!(query
            .clinical
            .iter()
            .any(|c| c.get("VITAL_STATUS") == Some(&json!("alive"))));
    }

    #[test]
    fn sample_ids_override_default_alive_filter() {
        let translator = CriteriaTranslator::new(TransformConfig::default());
        let path: MatchCriterion = vec![json!({"clinical": {"AGE": ">=18"}})];
        let ids = vec!["SID-1".to_string()];
        let query = translator.translate(&path, &[], Some(&ids)).unwrap();
        let default_clause = query.clinical.last().unwrap();
        assert_eq!(default_clause.get("SAMPLE_ID"), Some(&json!({"$in": ids})));
        assert!(!query
            .clinical
            .iter()
            .any(|c| c.contains_key("VITAL_STATUS")));
    }

    #[test]
    fn ignored_key_contributes_nothing() {
        let mut inner = HashMap::new();
        inner.insert(
            "HUGO".to_string(),
            KeySettings {
                ignore: true,
                sample_value: "nomap".to_string(),
                extra: Map::new(),
            },
        );
        let mut mappings = HashMap::new();
        mappings.insert("genomic".to_string(), inner);
        let config = TransformConfig {
            trial_key_mappings: mappings,
            ..Default::default()
        };
        let translator = CriteriaTranslator::new(config);
        let path: MatchCriterion = vec![json!({"genomic": {"HUGO": "BRAF"}})];
        let query = translator.translate(&path, &[], None).unwrap();
        assert!(query.genomic[0].is_empty());
    }

    #[test]
    fn unknown_transform_is_fatal() {
        let config = config_with("genomic", "HUGO", "not_a_real_transform");
        let translator = CriteriaTranslator::new(config);
        let path: MatchCriterion = vec![json!({"genomic": {"HUGO": "BRAF"}})];
        let err = translator.translate(&path, &[], None).unwrap_err();
        assert!(matches!(err, TranslateError::UnknownTransform(_)));
    }

    #[test]
    fn translate_is_deterministic() {
        let config = config_with("genomic", "HUGO", "hugo_symbol");
        let translator = CriteriaTranslator::new(config);
        let path: MatchCriterion = vec![json!({"genomic": {"HUGO": "her2"}})];
        let a = translator.translate(&path, &[], None).unwrap();
        let b = translator.translate(&path, &[], None).unwrap();
        assert_eq!(a.genomic, b.genomic);
        assert_eq!(a.clinical, b.clinical);
    }
}
