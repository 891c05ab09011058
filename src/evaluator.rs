use chrono::NaiveDate;

use crate::types::NoticeFact;

/// Result of selecting the operative notice for a bill.
#[derive(Debug, Clone, PartialEq)]
pub enum NoticeOutcome {
    /// No announcement exists anywhere in the log. Distinct from zero days
    /// and distinct from compliant; the broader compliance layer decides
    /// what to do with it.
    Missing { hearing_date: Option<NaiveDate> },
    Evaluated(NoticeEvaluation),
}

/// The minimum-notice fact plus prior-announcement context.
#[derive(Debug, Clone, PartialEq)]
pub struct NoticeEvaluation {
    /// The fact with the smallest notice gap; ties go to the most recently
    /// recorded action.
    pub operative: NoticeFact,
    pub notice_days: i64,
    /// True when any other fact met the configured minimum notice.
    pub had_prior_valid_notice: bool,
    /// Best (maximum) notice among the other facts meeting the minimum.
    pub prior_notice_days: Option<i64>,
}

/// Select the operative notice fact and compute prior-notice context.
///
/// `min_notice_days` is the compliance minimum a prior announcement must meet
/// to count as valid.
pub fn evaluate(facts: &[NoticeFact], min_notice_days: i64) -> NoticeOutcome {
    let mut operative: Option<&NoticeFact> = None;

    for fact in facts {
        let days = match fact.notice_days {
            Some(d) => d,
            None => continue,
        };
        let replace = match operative {
            None => true,
            Some(best) => {
                let best_days = best.notice_days.unwrap_or(i64::MAX);
                // Strictly smaller wins; on a tie the later source record wins.
                days < best_days
                    || (days == best_days && fact.source_index >= best.source_index)
            }
        };
        if replace {
            operative = Some(fact);
        }
    }

    let operative = match operative {
        Some(f) => f.clone(),
        None => {
            return NoticeOutcome::Missing {
                hearing_date: facts.first().map(|f| f.hearing_date),
            }
        }
    };
    let notice_days = operative.notice_days.expect("operative fact has notice_days");

    let prior_notice_days = facts
        .iter()
        .filter(|f| f.source_index != operative.source_index)
        .filter_map(|f| f.notice_days)
        .filter(|d| *d >= min_notice_days)
        .max();

    NoticeOutcome::Evaluated(NoticeEvaluation {
        operative,
        notice_days,
        had_prior_valid_notice: prior_notice_days.is_some(),
        prior_notice_days,
    })
}
