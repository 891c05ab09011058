use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::signature::{CaseSignature, FieldValue};

/// One constraint on a signature field.
///
/// Serialized forms mirror the store file: a bare bool/number/string is an
/// exact match, an array is set membership, and `{"min": .., "max": ..}` is a
/// numeric range with optional ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Criterion {
    Bool(bool),
    Int(i64),
    Text(String),
    OneOf(Vec<String>),
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
}

impl Criterion {
    /// Whether a field value satisfies this constraint. Type mismatches
    /// never satisfy.
    pub fn matches(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (Criterion::Bool(want), FieldValue::Bool(got)) => want == got,
            (Criterion::Int(want), FieldValue::Int(got)) => want == got,
            (Criterion::Text(want), FieldValue::Text(got)) => want == got,
            (Criterion::OneOf(allowed), FieldValue::Text(got)) => allowed.iter().any(|v| v == got),
            (Criterion::Range { min, max }, FieldValue::Int(got)) => {
                if let Some(min) = min {
                    if got < min {
                        return false;
                    }
                }
                if let Some(max) = max {
                    if got > max {
                        return false;
                    }
                }
                true
            }
            _ => false,
        }
    }

    /// Detect constraints no signature can ever satisfy.
    fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Criterion::Range {
                min: Some(min),
                max: Some(max),
            } if min > max => Err(format!("empty range: min {} > max {}", min, max)),
            Criterion::OneOf(values) if values.is_empty() => {
                Err("empty membership set".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// A learned rule identifying likely clerical corrections.
///
/// Immutable once created except for `enabled`, which operators may toggle by
/// hand-editing the store file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClericalPattern {
    pub id: String,
    pub name: String,
    /// Agreement ratio among reviewed cases, 0.0 to 1.0.
    pub confidence: f64,
    pub sample_size: usize,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Field name -> constraint. Absent fields are unconstrained.
    pub criteria: BTreeMap<String, Criterion>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub example_bills: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl ClericalPattern {
    /// True when every criterion is satisfied by the signature. A criterion
    /// naming a field the signature lacks (or holds as null) fails.
    pub fn matches(&self, signature: &CaseSignature) -> bool {
        self.criteria.iter().all(|(field, criterion)| {
            signature
                .field(field)
                .map(|value| criterion.matches(&value))
                .unwrap_or(false)
        })
    }

    fn validate(&self) -> std::result::Result<(), String> {
        for (field, criterion) in &self.criteria {
            criterion
                .validate()
                .map_err(|reason| format!("criterion '{}': {}", field, reason))?;
        }
        Ok(())
    }
}

/// On-disk layout of the pattern store file.
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: String,
    patterns: Vec<ClericalPattern>,
}

/// In-memory snapshot of the learned patterns. Loaded once per run and
/// treated as immutable by evaluation; the learner is the only writer.
#[derive(Debug, Clone, Default)]
pub struct PatternStore {
    patterns: Vec<ClericalPattern>,
}

impl PatternStore {
    pub fn new(patterns: Vec<ClericalPattern>) -> Self {
        Self { patterns }
    }

    /// Load the store from a JSON file. A missing file yields an empty store.
    /// Patterns with unsatisfiable criteria are disabled with a loud warning,
    /// never silently dropped.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "pattern store not found, starting empty");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let file: StoreFile = serde_json::from_str(&contents)?;

        let mut patterns = file.patterns;
        for pattern in &mut patterns {
            if let Err(reason) = pattern.validate() {
                warn!(
                    pattern_id = %pattern.id,
                    %reason,
                    "disabling pattern with unsatisfiable criteria"
                );
                pattern.enabled = false;
            }
        }
        info!(count = patterns.len(), path = %path.display(), "loaded clerical patterns");
        Ok(Self { patterns })
    }

    /// Persist the store. Writes to a temp file then renames, so a crash
    /// mid-write never corrupts the previous store.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = StoreFile {
            version: "1.0".to_string(),
            patterns: self.patterns.clone(),
        };
        let mut contents = serde_json::to_string_pretty(&file)?;
        contents.push('\n');

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, path).map_err(|e| {
            Error::Path(format!(
                "failed to replace pattern store {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(())
    }

    /// First enabled pattern whose criteria the signature satisfies, scanning
    /// in insertion order. `None` means the case stays flagged.
    pub fn resolve(&self, signature: &CaseSignature) -> Option<&ClericalPattern> {
        self.enabled().find(|p| p.matches(signature))
    }

    pub fn enabled(&self) -> impl Iterator<Item = &ClericalPattern> {
        self.patterns.iter().filter(|p| p.enabled)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClericalPattern> {
        self.patterns.iter()
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ClericalPattern> {
        self.patterns.iter_mut().find(|p| p.id == id)
    }

    pub fn push(&mut self, pattern: ClericalPattern) {
        self.patterns.push(pattern);
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
