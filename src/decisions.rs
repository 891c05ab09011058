use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::signature::CaseSignature;
use crate::types::Determination;

/// One human adjudication of a flagged case. The ledger is append-only: a
/// later decision for the same bill never overwrites an earlier one, and the
/// learner decides which to trust.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub bill_id: String,
    /// The full signature of the adjudicated case, embedded so the learner
    /// can group decisions without re-deriving timelines.
    pub signature: CaseSignature,
    pub determination: Determination,
    pub reviewer: String,
    #[serde(default)]
    pub notes: String,
    pub decided_at: DateTime<Utc>,
    /// True when the reviewer applied this determination to the whole
    /// signature group at once rather than to a single case.
    #[serde(default)]
    pub applied_to_group: bool,
}

/// Append-only JSONL ledger of human decisions. The external review tool's
/// only contract with this crate is to emit well-formed records here.
pub struct DecisionLog {
    path: PathBuf,
}

impl DecisionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one decision as a single line.
    pub fn append(&self, decision: &Decision) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut line = serde_json::to_string(decision)?;
        line.push('\n');
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Load the full ledger in file order. Damaged lines are skipped with a
    /// warning.
    pub fn load_all(&self) -> Result<Vec<Decision>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let mut decisions = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Decision>(&line) {
                Ok(decision) => decisions.push(decision),
                Err(e) => {
                    warn!(path = %self.path.display(), lineno = lineno + 1, error = %e, "skipping unparseable decision line");
                }
            }
        }
        Ok(decisions)
    }
}
