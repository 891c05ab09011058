use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_stream::stream;
use chrono::{NaiveDate, Utc};
use futures::Stream;
use jwalk::WalkDir;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::audit::{AuditLog, AuditRecord};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::evaluator::{self, NoticeOutcome};
use crate::patterns::PatternStore;
use crate::signature::CaseSignature;
use crate::timeline::{FormatChangeViolation, TimelineReconstructor};
use crate::types::BillRecord;

/// Compliance outcome for one bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    /// No announcement exists anywhere in the log. Distinct from a zero-day
    /// or retroactive notice.
    MissingAnnouncement,
    SuspectViolation,
    /// A learned clerical pattern matched; the prior valid notice stands in
    /// for the record-keeping artifact.
    WhitelistedClerical,
}

/// Per-bill evaluation result, one JSONL line of the `evaluate` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillEvaluation {
    pub bill_id: String,
    pub committee_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hearing_date: Option<NaiveDate>,
    pub status: ComplianceStatus,
    /// Raw operative notice, unchanged even when whitelisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice_days: Option<i64>,
    /// Notice credited after whitelist substitution; equals `notice_days`
    /// unless a pattern matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_notice_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist_pattern_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_notice_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub format_change_violations: Vec<FormatChangeViolation>,
}

impl BillEvaluation {
    /// True when the bill needs attention: anything other than a compliant
    /// notice, or any format change inside the pre-hearing window. A
    /// compliant announcement does not excuse a late time/location change.
    pub fn is_flagged(&self) -> bool {
        !matches!(self.status, ComplianceStatus::Compliant)
            || !self.format_change_violations.is_empty()
    }
}

struct DiscoveredFile {
    path: PathBuf,
    relative_path: String,
}

/// Main processor: walks a directory of bill records and evaluates each one.
///
/// The pattern store is snapshotted at construction; a learner run during
/// evaluation never changes results mid-batch.
pub struct NoticeProcessor {
    config: Config,
    patterns: Arc<PatternStore>,
    reconstructor: Arc<TimelineReconstructor>,
    audit: Arc<AuditLog>,
}

impl NoticeProcessor {
    /// Create a new processor with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        let patterns = Arc::new(PatternStore::load(&config.pattern_store)?);
        let reconstructor = Arc::new(TimelineReconstructor::new(
            config.format_change_window_days,
        )?);
        let audit = Arc::new(AuditLog::open(&config.audit_log)?);
        info!(
            data_dir = %config.data_dir.display(),
            patterns = patterns.len(),
            "processor ready"
        );
        Ok(Self {
            config,
            patterns,
            reconstructor,
            audit,
        })
    }

    /// Process bill record files and return a stream of evaluations.
    /// Uses jwalk for fast parallel filesystem traversal.
    ///
    /// Each bill is isolated: a malformed record yields an `Err` item and the
    /// stream continues with the remaining bills.
    pub fn process(&self) -> impl Stream<Item = Result<BillEvaluation>> {
        let config = self.config.clone();
        let patterns = Arc::clone(&self.patterns);
        let reconstructor = Arc::clone(&self.reconstructor);
        let audit = Arc::clone(&self.audit);
        Box::pin(stream! {
            // jwalk is fast but synchronous, so discovery runs in the
            // blocking thread pool.
            let data_dir = config.data_dir.clone();
            let files = match tokio::task::spawn_blocking(move || {
                Self::discover_files_internal(&data_dir)
            }).await {
                Ok(Ok(files)) => files,
                Ok(Err(e)) => {
                    yield Err(e);
                    return;
                }
                Err(e) => {
                    yield Err(Error::Io(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        format!("Task join error: {}", e)
                    )));
                    return;
                }
            };

            let files = Self::apply_limit_internal(&config, files);

            for file in files {
                match Self::process_file_internal(
                    &config,
                    &patterns,
                    &reconstructor,
                    &audit,
                    &file,
                ).await {
                    Ok(evaluation) => yield Ok(evaluation),
                    Err(e) => yield Err(e),
                }
            }
        })
    }

    /// Process bill record files named on stdin (one path per line).
    /// Useful for stdio pipelines: `find ... | noticebot evaluate --stdin`
    pub fn process_from_stdin(
        &self,
        paths: impl Iterator<Item = String>,
    ) -> impl Stream<Item = Result<BillEvaluation>> {
        let config = self.config.clone();
        let patterns = Arc::clone(&self.patterns);
        let reconstructor = Arc::clone(&self.reconstructor);
        let audit = Arc::clone(&self.audit);
        Box::pin(stream! {
            let mut files = Vec::new();
            for path_str in paths {
                let path = Path::new(&path_str);
                if !path.exists() || !path.is_file() {
                    continue;
                }
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    files.push(DiscoveredFile {
                        path: path.to_path_buf(),
                        relative_path: path_str.clone(),
                    });
                }
            }
            files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
            let files = Self::apply_limit_internal(&config, files);

            for file in files {
                match Self::process_file_internal(
                    &config,
                    &patterns,
                    &reconstructor,
                    &audit,
                    &file,
                ).await {
                    Ok(evaluation) => yield Ok(evaluation),
                    Err(e) => yield Err(e),
                }
            }
        })
    }

    /// Discover all `.json` bill records under the data directory, sorted by
    /// relative path so batch order is deterministic.
    fn discover_files_internal(data_dir: &Path) -> Result<Vec<DiscoveredFile>> {
        let mut files = Vec::new();
        for entry_result in WalkDir::new(data_dir).into_iter() {
            let entry = match entry_result {
                Ok(e) => e,
                Err(_) => continue,
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                let relative_path = Self::calculate_relative_path(&path, data_dir)?;
                files.push(DiscoveredFile {
                    path: path.to_path_buf(),
                    relative_path,
                });
            }
        }
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }

    /// Calculate relative path from the data directory
    fn calculate_relative_path(path: &Path, data_dir: &Path) -> Result<String> {
        let data_dir_abs = data_dir.canonicalize().map_err(|_| {
            Error::Path(format!(
                "Failed to canonicalize data directory: {}",
                data_dir.display()
            ))
        })?;
        let parent_abs = path
            .parent()
            .ok_or_else(|| Error::Path(format!("Failed to get parent of path: {}", path.display())))?
            .canonicalize()
            .map_err(|_| Error::Path(format!("Failed to canonicalize path: {}", path.display())))?;

        let relative = pathdiff::diff_paths(&parent_abs, &data_dir_abs)
            .ok_or_else(|| Error::Path("Failed to calculate relative path".to_string()))?;
        let filename = path
            .file_name()
            .ok_or_else(|| Error::Path(format!("Failed to get filename: {}", path.display())))?;

        Ok(relative.join(filename).to_string_lossy().to_string())
    }

    /// Apply limit to files
    fn apply_limit_internal(config: &Config, files: Vec<DiscoveredFile>) -> Vec<DiscoveredFile> {
        if let Some(limit) = config.limit {
            files.into_iter().take(limit).collect()
        } else {
            files
        }
    }

    /// Read, parse and evaluate a single bill record file.
    async fn process_file_internal(
        config: &Config,
        patterns: &PatternStore,
        reconstructor: &TimelineReconstructor,
        audit: &AuditLog,
        file: &DiscoveredFile,
    ) -> Result<BillEvaluation> {
        let json_content = tokio::fs::read_to_string(&file.path).await?;
        let record: BillRecord =
            serde_json::from_str(&json_content).map_err(|e| Error::MalformedAction {
                bill_id: file.relative_path.clone(),
                reason: e.to_string(),
            })?;
        Self::evaluate_record(config, patterns, reconstructor, audit, &record)
    }

    /// Evaluate one parsed bill record.
    ///
    /// A flagged case is audited before its evaluation is reported; if the
    /// audit write fails the bill fails, never silently passing unevidenced.
    pub fn evaluate_record(
        config: &Config,
        patterns: &PatternStore,
        reconstructor: &TimelineReconstructor,
        audit: &AuditLog,
        record: &BillRecord,
    ) -> Result<BillEvaluation> {
        let timeline =
            reconstructor.reconstruct(&record.bill_id, &record.actions, record.hearing_date);

        match evaluator::evaluate(&timeline.facts, config.min_notice_days) {
            NoticeOutcome::Evaluated(eval) => {
                let hearing_date = Some(eval.operative.hearing_date);
                if eval.notice_days >= config.min_notice_days {
                    return Ok(BillEvaluation {
                        bill_id: record.bill_id.clone(),
                        committee_id: record.committee.id.clone(),
                        hearing_date,
                        status: ComplianceStatus::Compliant,
                        notice_days: Some(eval.notice_days),
                        effective_notice_days: Some(eval.notice_days),
                        whitelist_pattern_id: None,
                        prior_notice_days: eval.prior_notice_days,
                        format_change_violations: timeline.format_change_violations,
                    });
                }

                let signature = CaseSignature::build(&eval, &timeline, &record.committee);
                // Substitution requires a prior valid notice regardless of
                // what any pattern's criteria say.
                let matched = if eval.had_prior_valid_notice {
                    patterns.resolve(&signature)
                } else {
                    None
                };
                let whitelist_pattern_id = matched.map(|p| p.id.clone());

                audit.append(&AuditRecord {
                    bill_id: record.bill_id.clone(),
                    committee_id: record.committee.id.clone(),
                    fact: eval.operative.clone(),
                    signature,
                    whitelist_pattern_id: whitelist_pattern_id.clone(),
                    detected_at: Utc::now(),
                })?;

                let (status, effective) = match &whitelist_pattern_id {
                    Some(id) => {
                        debug!(
                            bill_id = %record.bill_id,
                            pattern_id = %id,
                            "clerical pattern matched, crediting prior notice"
                        );
                        (ComplianceStatus::WhitelistedClerical, eval.prior_notice_days)
                    }
                    None => (ComplianceStatus::SuspectViolation, Some(eval.notice_days)),
                };

                Ok(BillEvaluation {
                    bill_id: record.bill_id.clone(),
                    committee_id: record.committee.id.clone(),
                    hearing_date,
                    status,
                    notice_days: Some(eval.notice_days),
                    effective_notice_days: effective,
                    whitelist_pattern_id,
                    prior_notice_days: eval.prior_notice_days,
                    format_change_violations: timeline.format_change_violations,
                })
            }
            NoticeOutcome::Missing { hearing_date } => {
                if let Some(date) = hearing_date {
                    let signature = CaseSignature::missing(date, &timeline, &record.committee);
                    audit.append(&AuditRecord {
                        bill_id: record.bill_id.clone(),
                        committee_id: record.committee.id.clone(),
                        fact: timeline.facts[0].clone(),
                        signature,
                        whitelist_pattern_id: None,
                        detected_at: Utc::now(),
                    })?;
                }
                Ok(BillEvaluation {
                    bill_id: record.bill_id.clone(),
                    committee_id: record.committee.id.clone(),
                    hearing_date,
                    status: ComplianceStatus::MissingAnnouncement,
                    notice_days: None,
                    effective_notice_days: None,
                    whitelist_pattern_id: None,
                    prior_notice_days: None,
                    format_change_violations: timeline.format_change_violations,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::patterns::{ClericalPattern, Criterion};
    use crate::types::{Action, ActionKind, Committee};
    use futures::StreamExt;
    use std::collections::BTreeMap;
    use std::fs;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn action(date: NaiveDate, kind: ActionKind, target: Option<NaiveDate>, text: &str) -> Action {
        Action {
            date,
            kind,
            raw_text: text.to_string(),
            committee_id: None,
            chamber: None,
            target_date: target,
        }
    }

    /// A reschedule recorded the day after the hearing, with a compliant
    /// original announcement and a same-day time change.
    fn retro_reschedule_record() -> BillRecord {
        BillRecord {
            bill_id: "S1249".to_string(),
            session: Some("194th".to_string()),
            bill_url: None,
            committee: Committee {
                id: "J19".to_string(),
                chamber: "Joint".to_string(),
            },
            hearing_date: Some(d(2025, 11, 25)),
            actions: vec![
                action(
                    d(2025, 11, 14),
                    ActionKind::HearingScheduled,
                    Some(d(2025, 11, 25)),
                    "Hearing scheduled for 11/25/2025 from 10:00 AM-05:00 PM in A-2",
                ),
                action(
                    d(2025, 11, 25),
                    ActionKind::HearingTimeChanged,
                    None,
                    "Hearing time changed to 10:30 AM",
                ),
                action(
                    d(2025, 11, 26),
                    ActionKind::HearingRescheduled,
                    Some(d(2025, 11, 25)),
                    "Hearing rescheduled to 11/25/2025 from 10:30 AM in A-2",
                ),
            ],
        }
    }

    fn compliant_record(bill_id: &str) -> BillRecord {
        BillRecord {
            bill_id: bill_id.to_string(),
            session: None,
            bill_url: None,
            committee: Committee {
                id: "H30".to_string(),
                chamber: "House".to_string(),
            },
            hearing_date: Some(d(2025, 10, 20)),
            actions: vec![action(
                d(2025, 10, 1),
                ActionKind::HearingScheduled,
                Some(d(2025, 10, 20)),
                "Hearing scheduled for 10/20/2025",
            )],
        }
    }

    fn retro_pattern() -> ClericalPattern {
        let mut criteria = BTreeMap::new();
        criteria.insert(
            "notice_days".to_string(),
            Criterion::Range {
                min: Some(-2),
                max: Some(0),
            },
        );
        criteria.insert("had_prior_valid_notice".to_string(), Criterion::Bool(true));
        criteria.insert(
            "prior_notice_days".to_string(),
            Criterion::Range {
                min: Some(10),
                max: None,
            },
        );
        criteria.insert(
            "had_same_day_time_change".to_string(),
            Criterion::Bool(true),
        );
        ClericalPattern {
            id: "pattern_testretro".to_string(),
            name: "Retroactive reschedule after time change".to_string(),
            confidence: 0.95,
            sample_size: 12,
            enabled: true,
            criteria,
            description: String::new(),
            example_bills: vec![],
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::create_dir_all(dir.path().join("bills")).unwrap();
            Self { dir }
        }

        fn write_bill(&self, name: &str, record: &BillRecord) {
            let path = self.dir.path().join("bills").join(name);
            fs::write(path, serde_json::to_string_pretty(record).unwrap()).unwrap();
        }

        fn write_patterns(&self, patterns: Vec<ClericalPattern>) {
            PatternStore::new(patterns)
                .save(self.dir.path().join("patterns.json"))
                .unwrap();
        }

        fn config(&self) -> Config {
            ConfigBuilder::new(self.dir.path().join("bills"))
                .pattern_store(self.dir.path().join("patterns.json"))
                .audit_log(self.dir.path().join("audit.jsonl"))
                .decision_log(self.dir.path().join("decisions.jsonl"))
                .build()
                .unwrap()
        }

        fn audit_records(&self) -> Vec<AuditRecord> {
            AuditLog::open(self.dir.path().join("audit.jsonl"))
                .unwrap()
                .load_all()
                .unwrap()
        }
    }

    async fn run(fixture: &Fixture) -> Vec<Result<BillEvaluation>> {
        let processor = NoticeProcessor::new(fixture.config()).unwrap();
        processor.process().collect().await
    }

    #[tokio::test]
    async fn retroactive_reschedule_is_flagged_without_patterns() {
        let fixture = Fixture::new();
        fixture.write_bill("s1249.json", &retro_reschedule_record());

        let results = run(&fixture).await;
        assert_eq!(results.len(), 1);
        let eval = results[0].as_ref().unwrap();

        assert_eq!(eval.status, ComplianceStatus::SuspectViolation);
        assert_eq!(eval.notice_days, Some(-1));
        assert_eq!(eval.effective_notice_days, Some(-1));
        assert_eq!(eval.prior_notice_days, Some(11));
        assert_eq!(eval.whitelist_pattern_id, None);

        let audit = fixture.audit_records();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].bill_id, "S1249");
        assert_eq!(audit[0].whitelist_pattern_id, None);
        assert_eq!(
            audit[0].signature.composite_key,
            "retroactive_1_day_HEARING_RESCHEDULED_prior_10plus_days_timechange"
        );
    }

    #[tokio::test]
    async fn matching_pattern_credits_prior_notice() {
        let fixture = Fixture::new();
        fixture.write_bill("s1249.json", &retro_reschedule_record());
        fixture.write_patterns(vec![retro_pattern()]);

        let results = run(&fixture).await;
        let eval = results[0].as_ref().unwrap();

        assert_eq!(eval.status, ComplianceStatus::WhitelistedClerical);
        // The raw observation is preserved; only the credited value changes.
        assert_eq!(eval.notice_days, Some(-1));
        assert_eq!(eval.effective_notice_days, Some(11));
        assert_eq!(
            eval.whitelist_pattern_id.as_deref(),
            Some("pattern_testretro")
        );

        let audit = fixture.audit_records();
        assert_eq!(audit.len(), 1);
        assert_eq!(
            audit[0].whitelist_pattern_id.as_deref(),
            Some("pattern_testretro")
        );
        assert_eq!(audit[0].fact.notice_days, Some(-1));
    }

    #[tokio::test]
    async fn no_substitution_without_prior_valid_notice() {
        let fixture = Fixture::new();
        // Only a retroactive announcement; nothing compliant came before.
        let record = BillRecord {
            actions: vec![action(
                d(2025, 11, 26),
                ActionKind::HearingRescheduled,
                Some(d(2025, 11, 25)),
                "Hearing rescheduled to 11/25/2025",
            )],
            ..retro_reschedule_record()
        };
        fixture.write_bill("s1249.json", &record);
        // A permissive pattern with no prior-notice criterion at all.
        let mut pattern = retro_pattern();
        pattern.criteria.remove("had_prior_valid_notice");
        pattern.criteria.remove("prior_notice_days");
        pattern.criteria.remove("had_same_day_time_change");
        fixture.write_patterns(vec![pattern]);

        let results = run(&fixture).await;
        let eval = results[0].as_ref().unwrap();
        assert_eq!(eval.status, ComplianceStatus::SuspectViolation);
        assert_eq!(eval.whitelist_pattern_id, None);
        assert_eq!(eval.effective_notice_days, Some(-1));
    }

    #[tokio::test]
    async fn disabled_pattern_never_matches() {
        let fixture = Fixture::new();
        fixture.write_bill("s1249.json", &retro_reschedule_record());
        let mut pattern = retro_pattern();
        pattern.enabled = false;
        fixture.write_patterns(vec![pattern]);

        let results = run(&fixture).await;
        let eval = results[0].as_ref().unwrap();
        assert_eq!(eval.status, ComplianceStatus::SuspectViolation);
    }

    #[tokio::test]
    async fn near_hearing_format_change_flags_an_otherwise_compliant_bill() {
        let fixture = Fixture::new();
        // 19 days of notice, but the time changes the day before the hearing.
        let mut record = compliant_record("H100");
        record.actions.push(action(
            d(2025, 10, 19),
            ActionKind::HearingTimeChanged,
            None,
            "Hearing time changed to 9:00 AM",
        ));
        fixture.write_bill("h100.json", &record);

        let results = run(&fixture).await;
        let eval = results[0].as_ref().unwrap();

        assert_eq!(eval.status, ComplianceStatus::Compliant);
        assert_eq!(eval.format_change_violations.len(), 1);
        assert_eq!(eval.format_change_violations[0].days_before_hearing, 1);
        assert!(eval.is_flagged());
    }

    #[tokio::test]
    async fn compliant_bill_is_not_audited() {
        let fixture = Fixture::new();
        fixture.write_bill("h100.json", &compliant_record("H100"));

        let results = run(&fixture).await;
        let eval = results[0].as_ref().unwrap();
        assert_eq!(eval.status, ComplianceStatus::Compliant);
        assert_eq!(eval.notice_days, Some(19));
        assert!(!eval.is_flagged());
        assert!(fixture.audit_records().is_empty());
    }

    #[tokio::test]
    async fn bill_without_any_announcement_is_flagged_as_missing() {
        let fixture = Fixture::new();
        let record = BillRecord {
            actions: vec![],
            ..retro_reschedule_record()
        };
        fixture.write_bill("s1249.json", &record);

        let results = run(&fixture).await;
        let eval = results[0].as_ref().unwrap();
        assert_eq!(eval.status, ComplianceStatus::MissingAnnouncement);
        assert_eq!(eval.notice_days, None);

        let audit = fixture.audit_records();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].fact.announcement_date, None);
        assert_eq!(audit[0].signature.notice_category, "unknown");
    }

    #[tokio::test]
    async fn malformed_record_does_not_stop_the_batch() {
        let fixture = Fixture::new();
        fixture.write_bill("a_good.json", &compliant_record("H100"));
        fs::write(fixture.dir.path().join("bills/b_bad.json"), "{not json").unwrap();
        fixture.write_bill("c_good.json", &compliant_record("H200"));

        let results = run(&fixture).await;
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1].as_ref().unwrap_err(),
            Error::MalformedAction { .. }
        ));
        assert!(results[2].is_ok());
    }

    #[tokio::test]
    async fn batch_order_is_deterministic_and_limit_applies() {
        let fixture = Fixture::new();
        fixture.write_bill("c.json", &compliant_record("H3"));
        fixture.write_bill("a.json", &compliant_record("H1"));
        fixture.write_bill("b.json", &compliant_record("H2"));

        let results = run(&fixture).await;
        let ids: Vec<_> = results
            .iter()
            .map(|r| r.as_ref().unwrap().bill_id.clone())
            .collect();
        assert_eq!(ids, vec!["H1", "H2", "H3"]);

        let config = ConfigBuilder::new(fixture.dir.path().join("bills"))
            .pattern_store(fixture.dir.path().join("patterns.json"))
            .audit_log(fixture.dir.path().join("audit.jsonl"))
            .limit(2)
            .build()
            .unwrap();
        let processor = NoticeProcessor::new(config).unwrap();
        let limited: Vec<_> = processor.process().collect().await;
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn stdin_paths_are_evaluated_in_sorted_order() {
        let fixture = Fixture::new();
        fixture.write_bill("b.json", &compliant_record("H2"));
        fixture.write_bill("a.json", &compliant_record("H1"));

        let processor = NoticeProcessor::new(fixture.config()).unwrap();
        let paths = vec![
            fixture.dir.path().join("bills/b.json"),
            fixture.dir.path().join("bills/a.json"),
            fixture.dir.path().join("bills/missing.json"),
        ];
        let results: Vec<_> = tokio_test::block_on(
            processor
                .process_from_stdin(paths.iter().map(|p| p.to_string_lossy().to_string()))
                .collect::<Vec<_>>(),
        );

        let ids: Vec<_> = results
            .iter()
            .map(|r| r.as_ref().unwrap().bill_id.clone())
            .collect();
        assert_eq!(ids, vec!["H1", "H2"]);
    }
}
