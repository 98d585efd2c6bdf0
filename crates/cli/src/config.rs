//! `AppConfig` — loads connection/concurrency/transform settings from a TOML
//! file, the way `crates/cli/src/manifest.rs`/`builder.rs` load TOML/JSON
//! configuration into typed structs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use trialmatch_eval::TransformConfig;

use crate::error::MatchError;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreSettings,
    #[serde(default)]
    pub concurrency: ConcurrencySettings,
    #[serde(default)]
    pub transforms: TransformConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    /// Directory holding one `<collection>.json` fixture file per
    /// `trial`/`clinical`/`genomic` collection.
    pub fixtures_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConcurrencySettings {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    64
}

fn default_query_timeout_ms() -> u64 {
    5_000
}

impl Default for ConcurrencySettings {
    fn default() -> Self {
        ConcurrencySettings {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<AppConfig, MatchError> {
        let text = fs::read_to_string(path)
            .map_err(|err| MatchError::Config(format!("reading '{}': {err}", path.display())))?;
        toml::from_str(&text).map_err(|err| MatchError::Config(format!("parsing '{}': {err}", path.display())))
    }
}
