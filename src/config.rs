//! Tunables for the classification pipeline and the greedy search.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides. `.json` files are read with `serde_json`, anything else as YAML.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::residual::DEFAULT_SIMILARITY_THRESHOLD;

pub const DEFAULT_MAX_ITERATIONS: usize = 500;
pub const DEFAULT_MAX_RECONSTRUCTION_CANDIDATES: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepairConfig {
    /// Leftover pairs must be strictly more similar than this to count as minor mistakes.
    pub similarity_threshold: f64,
    /// Upper bound on committed operations.
    pub max_iterations: usize,
    /// Per-row cap on fragments considered when rebuilding a merged or split value.
    pub max_reconstruction_candidates: usize,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_reconstruction_candidates: DEFAULT_MAX_RECONSTRUCTION_CANDIDATES,
        }
    }
}

impl RepairConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: RepairConfig = if is_json {
            serde_json::from_reader(reader).context("Parsing config JSON")?
        } else {
            serde_yaml::from_reader(reader).context("Parsing config YAML")?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(anyhow!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            ));
        }
        if self.max_reconstruction_candidates == 0 {
            return Err(anyhow!("max_reconstruction_candidates must be at least 1"));
        }
        Ok(())
    }
}
