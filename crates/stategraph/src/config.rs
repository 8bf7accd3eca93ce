//! Checker configuration.
//!
//! An optional YAML file, passed with `--config`:
//!
//! ```yaml
//! strict: true
//! lowstate:
//!   tag_sls:
//!     - generic.common.tags
//!   rules:
//!     - key: require
//!     - key: require_in
//!       reverse: true
//! ```
//!
//! Every field is optional. Unknown keys are rejected.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stategraph_input::LowstateOptions;
use tracing::debug;

use crate::error::{Error, Result};

/// Settings for one checker run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Exit non-zero when any error diagnostic is reported.
    pub strict: bool,

    /// How lowstate input is turned into a graph.
    pub lowstate: LowstateOptions,
}

impl Config {
    /// Load and validate configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::Config`] if it is not valid configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }

    /// Parse and validate configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for malformed YAML, unknown keys, or
    /// invalid values.
    pub fn parse(content: &str) -> Result<Self> {
        // An empty file is an empty mapping, not a null document.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a requisite key is listed twice or is
    /// empty.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for rule in &self.lowstate.rules {
            if rule.key.trim().is_empty() {
                return Err(Error::Config("Requisite key cannot be empty".to_string()));
            }
            if !seen.insert(rule.key.as_str()) {
                return Err(Error::Config(format!(
                    "Requisite key '{}' is listed more than once",
                    rule.key
                )));
            }
        }
        Ok(())
    }
}
