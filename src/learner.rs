use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::Path;

use fs2::FileExt;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::Config;
use crate::decisions::{Decision, DecisionLog};
use crate::error::{Error, Result};
use crate::patterns::{ClericalPattern, Criterion, PatternStore};
use crate::signature::CaseSignature;
use crate::types::Determination;

/// Required notice for an initial hearing announcement, in days. Used as the
/// floor when deriving a prior-notice criterion.
const INITIAL_NOTICE_DAYS: i64 = 10;

/// How long after a hearing a retroactive record entry can still plausibly be
/// a clerical correction.
const RETROACTIVE_ACTION_WINDOW_DAYS: i64 = 3;

/// What the learner did with one signature group.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupStatus {
    EmittedNew { pattern_id: String },
    UpdatedExisting { pattern_id: String, enabled: bool },
    SkippedInsufficientSample,
    SkippedBelowConfidence,
    SkippedNoPriorValidNotice,
}

#[derive(Debug, Clone)]
pub struct GroupOutcome {
    pub composite_key: String,
    pub sample_size: usize,
    pub confidence: f64,
    pub status: GroupStatus,
}

/// Summary of one learner run, with skipped groups distinguishable from
/// emitted-but-disabled patterns.
#[derive(Debug, Clone, Default)]
pub struct LearnerReport {
    pub groups: Vec<GroupOutcome>,
}

impl LearnerReport {
    pub fn emitted(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| matches!(g.status, GroupStatus::EmittedNew { .. }))
            .count()
    }

    pub fn updated(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| matches!(g.status, GroupStatus::UpdatedExisting { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.groups.len() - self.emitted() - self.updated()
    }
}

/// Aggregates the human decision ledger into clerical patterns.
///
/// Runs out-of-band from evaluation; it is the only writer of the pattern
/// store, and two runs on an unchanged ledger produce a byte-identical store.
pub struct PatternLearner {
    min_confidence: f64,
    min_sample_size: usize,
    count_superseded_decisions: bool,
}

impl PatternLearner {
    pub fn new(min_confidence: f64, min_sample_size: usize) -> Self {
        Self {
            min_confidence,
            min_sample_size,
            count_superseded_decisions: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            min_confidence: config.min_confidence,
            min_sample_size: config.min_sample_size,
            count_superseded_decisions: config.count_superseded_decisions,
        }
    }

    pub fn count_superseded_decisions(mut self, yes: bool) -> Self {
        self.count_superseded_decisions = yes;
        self
    }

    /// Load the ledger, take an exclusive lock on the store, learn, and save.
    ///
    /// A second learner run against the same store fails loudly instead of
    /// silently losing updates.
    pub fn run_on_files(&self, decisions: &DecisionLog, store_path: &Path) -> Result<LearnerReport> {
        if let Some(parent) = store_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let lock_path = store_path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)?;
        lock_file.try_lock_exclusive().map_err(|_| {
            Error::LearnerLocked(format!(
                "another learner holds the lock on {}",
                store_path.display()
            ))
        })?;

        let ledger = decisions.load_all()?;
        let mut store = PatternStore::load(store_path)?;
        let report = self.run(&ledger, &mut store);
        store.save(store_path)?;

        FileExt::unlock(&lock_file)?;
        Ok(report)
    }

    /// Aggregate the ledger by composite key and merge the resulting
    /// candidate patterns into the store.
    pub fn run(&self, ledger: &[Decision], store: &mut PatternStore) -> LearnerReport {
        let mut report = LearnerReport::default();

        // BTreeMap keeps group processing order stable across runs.
        let mut groups: BTreeMap<&str, Vec<&Decision>> = BTreeMap::new();
        for decision in ledger {
            groups
                .entry(decision.signature.composite_key.as_str())
                .or_default()
                .push(decision);
        }

        for (composite_key, decisions) in groups {
            let effective = self.effective_decisions(&decisions);
            let sample_size = effective.len();
            let clerical = effective
                .iter()
                .filter(|d| d.determination == Determination::Clerical)
                .count();
            // Conflicting decisions within a group are expected; the ratio is
            // the whole resolution.
            let confidence = if sample_size > 0 {
                clerical as f64 / sample_size as f64
            } else {
                0.0
            };
            let representative = &effective[0].signature;

            let status = if sample_size < self.min_sample_size {
                GroupStatus::SkippedInsufficientSample
            } else if confidence < self.min_confidence {
                GroupStatus::SkippedBelowConfidence
            } else if !representative.had_prior_valid_notice {
                // Never whitelist a case that had no valid notice at any point.
                GroupStatus::SkippedNoPriorValidNotice
            } else {
                let candidate = self.build_pattern(
                    composite_key,
                    representative,
                    &effective,
                    confidence,
                    sample_size,
                );
                match store.get_mut(&candidate.id) {
                    Some(existing) => {
                        // Recompute confidence and sample size in place;
                        // id, criteria and the operator-owned enabled flag
                        // are preserved.
                        existing.confidence = confidence;
                        existing.sample_size = sample_size;
                        GroupStatus::UpdatedExisting {
                            pattern_id: candidate.id,
                            enabled: existing.enabled,
                        }
                    }
                    None => {
                        info!(
                            pattern_id = %candidate.id,
                            confidence,
                            sample_size,
                            "emitting clerical pattern"
                        );
                        let pattern_id = candidate.id.clone();
                        store.push(candidate);
                        GroupStatus::EmittedNew { pattern_id }
                    }
                }
            };

            debug!(composite_key, sample_size, confidence, ?status, "learner group");
            report.groups.push(GroupOutcome {
                composite_key: composite_key.to_string(),
                sample_size,
                confidence,
                status,
            });
        }

        report
    }

    /// Keep only the operative decision per bill: the latest ledger entry
    /// wins, unless superseded decisions are configured to count.
    fn effective_decisions<'a>(&self, decisions: &[&'a Decision]) -> Vec<&'a Decision> {
        if self.count_superseded_decisions {
            return decisions.to_vec();
        }
        let mut latest: BTreeMap<&str, &'a Decision> = BTreeMap::new();
        for decision in decisions {
            latest.insert(decision.bill_id.as_str(), decision);
        }
        // Preserve first-appearance order so the representative signature is
        // stable across runs.
        let mut seen = Vec::new();
        let mut out = Vec::new();
        for decision in decisions {
            if seen.contains(&decision.bill_id.as_str()) {
                continue;
            }
            seen.push(decision.bill_id.as_str());
            out.push(latest[decision.bill_id.as_str()]);
        }
        out
    }

    fn build_pattern(
        &self,
        composite_key: &str,
        representative: &CaseSignature,
        decisions: &[&Decision],
        confidence: f64,
        sample_size: usize,
    ) -> ClericalPattern {
        let mut criteria = BTreeMap::new();

        let notice_days: Vec<i64> = decisions.iter().map(|d| d.signature.notice_days).collect();
        let obs_min = *notice_days.iter().min().expect("non-empty group");
        let obs_max = *notice_days.iter().max().expect("non-empty group");
        // Observed range with a one-day safety margin, pinned so retroactive
        // groups never admit positive notice and vice versa.
        let range = if representative.is_retroactive {
            Criterion::Range {
                min: Some(obs_min - 1),
                max: Some(0),
            }
        } else {
            Criterion::Range {
                min: Some(0),
                max: Some(obs_max + 1),
            }
        };
        criteria.insert("notice_days".to_string(), range);

        let mut action_types: Vec<String> = decisions
            .iter()
            .map(|d| d.signature.action_type.clone())
            .collect();
        action_types.sort();
        action_types.dedup();
        let action_criterion = if action_types.len() == 1 {
            Criterion::Text(action_types.remove(0))
        } else {
            Criterion::OneOf(action_types)
        };
        criteria.insert("action_type".to_string(), action_criterion);

        criteria.insert(
            "had_prior_valid_notice".to_string(),
            Criterion::Bool(true),
        );

        let prior_days: Vec<i64> = decisions
            .iter()
            .filter_map(|d| d.signature.prior_notice_days)
            .collect();
        if let Some(prior_min) = prior_days.iter().min() {
            criteria.insert(
                "prior_notice_days".to_string(),
                Criterion::Range {
                    min: Some(INITIAL_NOTICE_DAYS.max(prior_min - 2)),
                    max: None,
                },
            );
        }

        if representative.had_same_day_time_change {
            criteria.insert(
                "had_same_day_time_change".to_string(),
                Criterion::Bool(true),
            );
        }
        if decisions.iter().all(|d| d.signature.text_contains_virtual) {
            criteria.insert("text_contains_virtual".to_string(), Criterion::Bool(true));
        }
        if decisions.iter().all(|d| d.signature.text_contains_time) {
            criteria.insert("text_contains_time".to_string(), Criterion::Bool(true));
        }
        if representative.is_retroactive {
            criteria.insert(
                "time_between_hearing_and_action".to_string(),
                Criterion::Range {
                    min: Some(0),
                    max: Some(RETROACTIVE_ACTION_WINDOW_DAYS),
                },
            );
        }

        let mut example_bills: Vec<String> = decisions
            .iter()
            .take(5)
            .map(|d| d.bill_id.clone())
            .collect();
        example_bills.dedup();

        ClericalPattern {
            id: pattern_id(composite_key),
            name: describe_group(representative),
            confidence,
            sample_size,
            enabled: true,
            criteria,
            description: format!(
                "Consistently classified as clerical correction by expert review \
                 (group {})",
                composite_key
            ),
            example_bills,
        }
    }
}

/// Stable pattern id derived from the group key, so re-learning the same
/// ledger reproduces the same ids.
pub fn pattern_id(composite_key: &str) -> String {
    let digest = Sha256::digest(composite_key.as_bytes());
    let hex: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();
    format!("pattern_{}", hex)
}

/// Human-readable pattern name derived from the representative signature.
fn describe_group(sig: &CaseSignature) -> String {
    let mut parts = Vec::new();

    let category = sig
        .notice_category
        .split('_')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    parts.push(category);

    if sig.action_type.contains("RESCHEDULED") {
        parts.push("rescheduled".to_string());
    } else if sig.action_type.contains("SCHEDULED") {
        parts.push("scheduled".to_string());
    }

    if sig.had_prior_valid_notice {
        if let Some(days) = sig.prior_notice_days {
            parts.push(format!("(had prior {}-day notice)", days));
        }
    }
    if sig.had_same_day_time_change {
        parts.push("+ same-day time change".to_string());
    }

    parts.join(" ")
}
