// Sun Jul 26 2026 - Alex

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::equiv::flags::CompareFlags;
use crate::layout::target::TargetModel;

/// Engine configuration: worker count, comparison strictness and the target
/// machine model. Loadable from JSON so a harness can pin a run down.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub threads: usize,
    pub require_field_names: bool,
    pub check_layout: bool,
    pub target: TargetModel,
    pub report_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            require_field_names: false,
            check_layout: false,
            target: TargetModel::lp64(),
            report_file: None,
        }
    }
}

impl Config {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_strict_names(mut self, strict: bool) -> Self {
        self.require_field_names = strict;
        self
    }

    pub fn with_layout_check(mut self, check: bool) -> Self {
        self.check_layout = check;
        self
    }

    pub fn with_target(mut self, target: TargetModel) -> Self {
        self.target = target;
        self
    }

    pub fn flags(&self) -> CompareFlags {
        let mut flags = CompareFlags::empty();
        if self.require_field_names {
            flags |= CompareFlags::REQUIRE_FIELD_NAMES;
        }
        if self.check_layout {
            flags |= CompareFlags::CHECK_LAYOUT;
        }
        flags
    }

    /// First problem with the configuration, or Ok.
    pub fn validate(&self) -> Result<(), String> {
        if self.threads == 0 {
            return Err("Thread count must be at least 1".to_string());
        }
        self.target.validate()
    }

    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
        let config: Config = serde_json::from_str(&text)
            .map_err(|e| format!("Cannot parse config {}: {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid_and_loose() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.flags().is_empty());
        assert!(config.threads >= 1);
    }

    #[test]
    fn test_flags_follow_the_toggles() {
        let config = Config::default().with_strict_names(true).with_layout_check(true);
        assert_eq!(config.flags(), CompareFlags::strict());
    }

    #[test]
    fn test_validate_rejects_zero_threads() {
        assert!(Config::default().with_threads(0).validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"require_field_names": true}"#).unwrap();
        assert!(config.require_field_names);
        assert!(!config.check_layout);
        assert_eq!(config.target.pointer_size, 8);
    }
}
