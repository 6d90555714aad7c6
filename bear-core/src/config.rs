//! Executor Configuration
//!
//! Sizing of the default worker pool. It can be deserialized from any serde
//! source or read from a section's `jobs` option.

use std::num::NonZeroUsize;
use std::thread;

use serde::Deserialize;

use crate::error::CoreError;
use crate::settings::{OptionKind, Section};

/// Settings for [`PoolExecutor`](crate::PoolExecutor).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Maximum number of parallel jobs. `None` uses every available core.
    pub workers: Option<usize>,
    /// Name given to worker threads.
    pub thread_name: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            workers: None,
            thread_name: "bear-worker".to_string(),
        }
    }
}

impl ExecutorConfig {
    /// Read the `jobs` option of `section`.
    pub fn from_section(section: &Section) -> Result<Self, CoreError> {
        let mut config = Self::default();

        if let Some(raw) = section.get("jobs") {
            let invalid = || CoreError::InvalidSetting {
                section: section.name().to_string(),
                setting: "jobs".to_string(),
                value: raw.to_string(),
                expected: "positive integer",
            };
            let jobs = OptionKind::Int
                .parse(raw)
                .and_then(|value| value.as_int())
                .ok_or_else(invalid)?;
            let jobs = usize::try_from(jobs).ok().filter(|jobs| *jobs > 0).ok_or_else(invalid)?;
            config.workers = Some(jobs);
        }

        Ok(config)
    }

    /// Effective worker count.
    pub fn workers(&self) -> usize {
        self.workers.filter(|workers| *workers > 0).unwrap_or_else(|| {
            thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_available_parallelism() {
        let config = ExecutorConfig::default();
        assert!(config.workers.is_none());
        assert!(config.workers() >= 1);
        assert_eq!(config.thread_name, "bear-worker");
    }

    #[test]
    fn reads_jobs_from_section() {
        let config = ExecutorConfig::from_section(&Section::new("cli").with("jobs", "4")).unwrap();
        assert_eq!(config.workers(), 4);

        let config = ExecutorConfig::from_section(&Section::new("cli")).unwrap();
        assert_eq!(config.workers, None);
    }

    #[test]
    fn rejects_non_positive_jobs() {
        for raw in ["0", "-2", "many"] {
            let section = Section::new("cli").with("jobs", raw);
            assert!(
                matches!(
                    ExecutorConfig::from_section(&section),
                    Err(CoreError::InvalidSetting { expected: "positive integer", .. })
                ),
                "{raw}"
            );
        }
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ExecutorConfig = serde_json::from_str(r#"{ "workers": 3 }"#).unwrap();
        assert_eq!(config.workers, Some(3));
        assert_eq!(config.thread_name, "bear-worker");
    }
}
