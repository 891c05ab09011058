use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::signature::CaseSignature;
use crate::types::NoticeFact;

/// Durable record of one flagged case, whether or not a pattern matched.
/// The raw fact is retained unchanged even when the whitelist substitutes a
/// different notice value downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub bill_id: String,
    pub committee_id: String,
    pub fact: NoticeFact,
    pub signature: CaseSignature,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist_pattern_id: Option<String>,
    pub detected_at: DateTime<Utc>,
}

/// Append-only JSONL audit log. One line per flagged case; lines are written
/// with a single syscall so a crash mid-write cannot damage earlier records.
pub struct AuditLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl AuditLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. A failure here is fatal for the case being
    /// evaluated: callers must not report success for a case whose evidence
    /// was not durably recorded.
    pub fn append(&self, record: &AuditRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = self.file.lock().expect("audit log lock poisoned");
        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| Error::Audit {
                bill_id: record.bill_id.clone(),
                source: e,
            })
    }

    /// Read every record back. Unparseable lines are skipped with a warning
    /// so a single damaged line never hides the rest of the ledger.
    pub fn load_all(&self) -> Result<Vec<AuditRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(path = %self.path.display(), lineno = lineno + 1, error = %e, "skipping unparseable audit line");
                }
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::NoticeEvaluation;
    use crate::timeline::HearingTimeline;
    use crate::types::{ActionKind, Committee};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_record(bill_id: &str) -> AuditRecord {
        let fact = NoticeFact {
            announcement_date: Some(d(2025, 11, 26)),
            hearing_date: d(2025, 11, 25),
            notice_days: Some(-1),
            action_kind: Some(ActionKind::HearingRescheduled),
            source_index: Some(2),
            raw_text: "Hearing rescheduled".to_string(),
        };
        let eval = NoticeEvaluation {
            operative: fact.clone(),
            notice_days: -1,
            had_prior_valid_notice: true,
            prior_notice_days: Some(11),
        };
        let committee = Committee {
            id: "J19".to_string(),
            chamber: "Joint".to_string(),
        };
        AuditRecord {
            bill_id: bill_id.to_string(),
            committee_id: "J19".to_string(),
            signature: CaseSignature::build(&eval, &HearingTimeline::default(), &committee),
            fact,
            whitelist_pattern_id: None,
            detected_at: Utc::now(),
        }
    }

    #[test]
    fn append_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let log = AuditLog::open(&path).unwrap();

        log.append(&sample_record("S1249")).unwrap();
        log.append(&sample_record("H2391")).unwrap();

        let records = log.load_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].bill_id, "S1249");
        assert_eq!(records[1].bill_id, "H2391");
    }

    #[test]
    fn appends_never_clobber_existing_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        {
            let log = AuditLog::open(&path).unwrap();
            log.append(&sample_record("S1249")).unwrap();
        }
        // Reopening and appending must preserve the first record.
        let log = AuditLog::open(&path).unwrap();
        log.append(&sample_record("H2391")).unwrap();

        let records = log.load_all().unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn damaged_line_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let log = AuditLog::open(&path).unwrap();
        log.append(&sample_record("S1249")).unwrap();

        use std::io::Write as _;
        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(f, "{{not json").unwrap();

        let log = AuditLog::open(&path).unwrap();
        log.append(&sample_record("H2391")).unwrap();

        let records = log.load_all().unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn empty_log_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::open(dir.path().join("none.jsonl")).unwrap();
        assert!(log.load_all().unwrap().is_empty());
    }
}
