use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Configuration for the notice compliance pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory of bill record JSON files to evaluate.
    pub data_dir: PathBuf,
    /// Clerical pattern store (whitelist), read by evaluation and written
    /// only by the learner.
    pub pattern_store: PathBuf,
    /// Append-only JSONL audit log of flagged cases.
    pub audit_log: PathBuf,
    /// Append-only JSONL ledger of human determinations.
    pub decision_log: PathBuf,
    /// Minimum compliant notice for a reschedule, in days.
    pub min_notice_days: i64,
    /// Format-change actions this close before the hearing are flagged.
    pub format_change_window_days: i64,
    /// Learner: minimum clerical agreement ratio to emit a pattern.
    pub min_confidence: f64,
    /// Learner: minimum effective decisions in a group to emit a pattern.
    pub min_sample_size: usize,
    /// Learner: count every ledger entry instead of only the latest decision
    /// per bill.
    pub count_superseded_decisions: bool,
    /// Stop after this many bills (for spot checks).
    pub limit: Option<usize>,
}

impl Config {
    /// Create a new default configuration
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            pattern_store: PathBuf::from("clerical_patterns.json"),
            audit_log: PathBuf::from("suspicious_notices.jsonl"),
            decision_log: PathBuf::from("notice_decisions.jsonl"),
            min_notice_days: 3,
            format_change_window_days: 3,
            min_confidence: 0.85,
            min_sample_size: 5,
            count_superseded_decisions: false,
            limit: None,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.data_dir.exists() {
            return Err(Error::Config(format!(
                "Data directory does not exist: {}",
                self.data_dir.display()
            )));
        }
        if !self.data_dir.is_dir() {
            return Err(Error::Config(format!(
                "Data directory is not a directory: {}",
                self.data_dir.display()
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(Error::Config(format!(
                "min_confidence must be within 0.0..=1.0, got {}",
                self.min_confidence
            )));
        }
        if self.min_sample_size == 0 {
            return Err(Error::Config(
                "min_sample_size must be at least 1".to_string(),
            ));
        }
        if self.min_notice_days < 0 {
            return Err(Error::Config(format!(
                "min_notice_days must be non-negative, got {}",
                self.min_notice_days
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("data")
    }
}

/// Optional overrides loaded from a `noticebot.yml` file. Absent keys keep
/// their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    data_dir: Option<PathBuf>,
    pattern_store: Option<PathBuf>,
    audit_log: Option<PathBuf>,
    decision_log: Option<PathBuf>,
    min_notice_days: Option<i64>,
    format_change_window_days: Option<i64>,
    min_confidence: Option<f64>,
    min_sample_size: Option<usize>,
    count_superseded_decisions: Option<bool>,
    limit: Option<usize>,
}

/// Builder for creating configurations
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default settings
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            config: Config::new(data_dir),
        }
    }

    /// Layer in overrides from a YAML config file.
    pub fn from_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let overrides: FileConfig = serde_yaml::from_str(&raw)?;
        if let Some(v) = overrides.data_dir {
            self.config.data_dir = v;
        }
        if let Some(v) = overrides.pattern_store {
            self.config.pattern_store = v;
        }
        if let Some(v) = overrides.audit_log {
            self.config.audit_log = v;
        }
        if let Some(v) = overrides.decision_log {
            self.config.decision_log = v;
        }
        if let Some(v) = overrides.min_notice_days {
            self.config.min_notice_days = v;
        }
        if let Some(v) = overrides.format_change_window_days {
            self.config.format_change_window_days = v;
        }
        if let Some(v) = overrides.min_confidence {
            self.config.min_confidence = v;
        }
        if let Some(v) = overrides.min_sample_size {
            self.config.min_sample_size = v;
        }
        if let Some(v) = overrides.count_superseded_decisions {
            self.config.count_superseded_decisions = v;
        }
        if let Some(v) = overrides.limit {
            self.config.limit = Some(v);
        }
        Ok(self)
    }

    /// Set the data directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    /// Set the pattern store path
    pub fn pattern_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pattern_store = path.into();
        self
    }

    /// Set the audit log path
    pub fn audit_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.audit_log = path.into();
        self
    }

    /// Set the decision ledger path
    pub fn decision_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.decision_log = path.into();
        self
    }

    /// Set the minimum compliant reschedule notice
    pub fn min_notice_days(mut self, days: i64) -> Self {
        self.config.min_notice_days = days;
        self
    }

    /// Set the format-change flagging window
    pub fn format_change_window_days(mut self, days: i64) -> Self {
        self.config.format_change_window_days = days;
        self
    }

    /// Set the learner confidence threshold
    pub fn min_confidence(mut self, confidence: f64) -> Self {
        self.config.min_confidence = confidence;
        self
    }

    /// Set the learner sample-size threshold
    pub fn min_sample_size(mut self, size: usize) -> Self {
        self.config.min_sample_size = size;
        self
    }

    /// Count superseded per-bill decisions in learner statistics
    pub fn count_superseded_decisions(mut self, yes: bool) -> Self {
        self.config.count_superseded_decisions = yes;
        self
    }

    /// Set the limit
    pub fn limit(mut self, limit: usize) -> Self {
        self.config.limit = Some(limit);
        self
    }

    /// Clear the limit
    pub fn no_limit(mut self) -> Self {
        self.config.limit = None;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Build without checking that paths exist, for commands that do not read
    /// the data directory.
    pub fn build_unchecked(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_conservative() {
        let config = Config::default();
        assert_eq!(config.min_notice_days, 3);
        assert_eq!(config.format_change_window_days, 3);
        assert!((config.min_confidence - 0.85).abs() < 1e-9);
        assert_eq!(config.min_sample_size, 5);
        assert!(!config.count_superseded_decisions);
        assert_eq!(config.limit, None);
    }

    #[test]
    fn builder_validates_data_dir() {
        let err = ConfigBuilder::new("/definitely/not/a/dir")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn builder_rejects_out_of_range_confidence() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigBuilder::new(dir.path())
            .min_confidence(1.5)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn file_overrides_layer_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("noticebot.yml");
        let mut f = fs::File::create(&config_path).unwrap();
        writeln!(f, "min_notice_days: 5").unwrap();
        writeln!(f, "min_confidence: 0.9").unwrap();
        writeln!(f, "pattern_store: custom_patterns.json").unwrap();

        let config = ConfigBuilder::new(dir.path())
            .from_file(&config_path)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.min_notice_days, 5);
        assert!((config.min_confidence - 0.9).abs() < 1e-9);
        assert_eq!(config.pattern_store, PathBuf::from("custom_patterns.json"));
        // Untouched keys keep their defaults.
        assert_eq!(config.min_sample_size, 5);
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("noticebot.yml");
        fs::write(&config_path, "minimum_notice: 5\n").unwrap();

        let err = ConfigBuilder::new(dir.path())
            .from_file(&config_path)
            .unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }
}
