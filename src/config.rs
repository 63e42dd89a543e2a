//! Analysis options, loadable from YAML.
//!
//! ```yaml
//! impact:
//!   excluded_kinds: [TYPE_NO_LONGER_PUBLIC, FIELD_NOW_STATIC]
//!   max_class_lines: 5000
//!   workers: 4
//!   analyze_timeout_secs: 600
//! ```

use crate::delta::ChangeKind;
use crate::error::{ImpactError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options for delta construction and client analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Change kinds dropped while building a delta.
    #[serde(default = "default_excluded_kinds")]
    pub excluded_kinds: Vec<ChangeKind>,
    /// Client classes spanning more lines than this are not analyzed.
    #[serde(default)]
    pub max_class_lines: Option<u32>,
    /// Clients analyzed in parallel.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Limit for fetching a client's sources.
    #[serde(default)]
    pub clone_timeout_secs: Option<u64>,
    /// Limit for building a client and loading its source model.
    #[serde(default)]
    pub build_timeout_secs: Option<u64>,
    /// Limit for running the detectors over one client.
    #[serde(default)]
    pub analyze_timeout_secs: Option<u64>,
}

fn default_excluded_kinds() -> Vec<ChangeKind> {
    ChangeKind::default_excluded().to_vec()
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            excluded_kinds: default_excluded_kinds(),
            max_class_lines: None,
            workers: default_workers(),
            clone_timeout_secs: None,
            build_timeout_secs: None,
            analyze_timeout_secs: None,
        }
    }
}

impl AnalysisOptions {
    /// Load configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ImpactError::Config(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        #[derive(serde::Deserialize)]
        struct ConfigFile {
            impact: Option<AnalysisOptions>,
        }

        let config_file: ConfigFile =
            serde_yaml::from_str(yaml).map_err(|e| ImpactError::Config(e.to_string()))?;
        let options = config_file.impact.unwrap_or_default();
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ImpactError::Config("workers must be at least 1".to_string()));
        }
        let timeouts = [
            ("clone_timeout_secs", self.clone_timeout_secs),
            ("build_timeout_secs", self.build_timeout_secs),
            ("analyze_timeout_secs", self.analyze_timeout_secs),
        ];
        for (name, value) in timeouts {
            if value == Some(0) {
                return Err(ImpactError::Config(format!("{name} must be positive")));
            }
        }
        Ok(())
    }

    pub fn is_excluded(&self, kind: ChangeKind) -> bool {
        self.excluded_kinds.contains(&kind)
    }

    pub fn with_excluded_kinds(mut self, kinds: &[ChangeKind]) -> Self {
        self.excluded_kinds = kinds.to_vec();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_max_class_lines(mut self, limit: u32) -> Self {
        self.max_class_lines = Some(limit);
        self
    }

    pub fn with_analyze_timeout(mut self, seconds: u64) -> Self {
        self.analyze_timeout_secs = Some(seconds);
        self
    }

    pub fn clone_timeout(&self) -> Option<Duration> {
        self.clone_timeout_secs.map(Duration::from_secs)
    }

    pub fn build_timeout(&self) -> Option<Duration> {
        self.build_timeout_secs.map(Duration::from_secs)
    }

    pub fn analyze_timeout(&self) -> Option<Duration> {
        self.analyze_timeout_secs.map(Duration::from_secs)
    }
}
