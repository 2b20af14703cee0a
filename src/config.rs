use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Checks `NodeBuilder::build` runs on the frozen node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildConfig {
    /// Master switch; off skips every check except absent list elements
    pub validate: bool,
    pub check_reference_types: bool,
    pub check_primitive_formats: bool,
    /// ele-1: elements must have a value or children
    pub require_value_or_children: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            validate: true,
            check_reference_types: true,
            check_primitive_formats: true,
            require_value_or_children: false,
        }
    }
}

impl BuildConfig {
    /// Construction from a trusted source: no checks at all
    pub fn trusted() -> Self {
        Self {
            validate: false,
            ..Default::default()
        }
    }

    /// Every check, including ele-1
    pub fn strict() -> Self {
        Self {
            require_value_or_children: true,
            ..Default::default()
        }
    }

    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    pub fn with_reference_type_checks(mut self, enabled: bool) -> Self {
        self.check_reference_types = enabled;
        self
    }

    pub fn with_primitive_format_checks(mut self, enabled: bool) -> Self {
        self.check_primitive_formats = enabled;
        self
    }

    pub fn with_value_or_children(mut self, enabled: bool) -> Self {
        self.require_value_or_children = enabled;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BatchConfig {
    pub max_concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_concurrency(),
        }
    }
}

impl BatchConfig {
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }
}

#[cfg(feature = "batch")]
fn default_concurrency() -> usize {
    num_cpus::get().max(1)
}

#[cfg(not(feature = "batch"))]
fn default_concurrency() -> usize {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FhirNodeConfig {
    pub build: BuildConfig,
    pub batch: BatchConfig,
}

impl FhirNodeConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn with_build_config(mut self, build: BuildConfig) -> Self {
        self.build = build;
        self
    }

    pub fn with_batch_config(mut self, batch: BatchConfig) -> Self {
        self.batch = batch;
        self
    }
}
