use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::{Action, ActionKind, NoticeFact};

/// A time/location amendment landing inside the pre-hearing window.
/// Flagged as non-compliant directly; never treated as a new announcement.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FormatChangeViolation {
    pub action_kind: ActionKind,
    pub change_date: NaiveDate,
    pub hearing_date: NaiveDate,
    pub days_before_hearing: i64,
    pub source_index: usize,
}

/// An action excluded from notice derivation, with the reason kept on record.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DroppedAction {
    pub source_index: usize,
    pub kind: ActionKind,
    pub reason: String,
}

/// Normalized hearing facts reconstructed from one bill's action log.
#[derive(Debug, Clone, Default)]
pub struct HearingTimeline {
    /// Notice facts in chronological announcement order.
    pub facts: Vec<NoticeFact>,
    /// Format changes flagged inside the pre-hearing window.
    pub format_change_violations: Vec<FormatChangeViolation>,
    /// Hearing dates that saw a time change on the hearing day itself.
    pub same_day_time_changes: Vec<NaiveDate>,
    /// Actions excluded from derivation, each with a logged reason.
    pub dropped: Vec<DroppedAction>,
    /// Count of all hearing-related actions observed in the window.
    pub total_hearing_actions: usize,
}

impl HearingTimeline {
    pub fn had_same_day_time_change(&self, hearing_date: NaiveDate) -> bool {
        self.same_day_time_changes.contains(&hearing_date)
    }
}

/// Reconstructs hearing notice facts from an ordered action log.
pub struct TimelineReconstructor {
    /// Amendments closer to the hearing than this many days are flagged.
    format_change_window_days: i64,
    us_date: Regex,
    iso_date: Regex,
}

impl TimelineReconstructor {
    pub fn new(format_change_window_days: i64) -> Result<Self> {
        Ok(Self {
            format_change_window_days,
            us_date: Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b")?,
            iso_date: Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b")?,
        })
    }

    /// Walk the action log in chronological order and derive notice facts.
    ///
    /// `known_hearing_date` is the roster hearing date; when the log contains
    /// no announcement at all, a fact with a null announcement is emitted so
    /// downstream can report "missing notice" rather than zero days.
    pub fn reconstruct(
        &self,
        bill_id: &str,
        actions: &[Action],
        known_hearing_date: Option<NaiveDate>,
    ) -> HearingTimeline {
        let mut timeline = HearingTimeline::default();

        // Stable chronological order: sort by date, ties keep source order.
        let mut ordered: Vec<(usize, &Action)> = actions.iter().enumerate().collect();
        ordered.sort_by_key(|(_, a)| a.date);

        let mut current_hearing_date: Option<NaiveDate> = None;

        for (source_index, action) in ordered {
            if !action.kind.is_hearing_related() {
                continue;
            }
            timeline.total_hearing_actions += 1;

            if action.kind.announces_hearing() {
                let target = match self.target_date(action) {
                    Some(d) => d,
                    None => {
                        warn!(
                            bill_id,
                            source_index,
                            kind = %action.kind,
                            "dropping announcement without extractable target date"
                        );
                        timeline.dropped.push(DroppedAction {
                            source_index,
                            kind: action.kind,
                            reason: "no extractable target date".to_string(),
                        });
                        continue;
                    }
                };
                current_hearing_date = Some(target);
                timeline.facts.push(NoticeFact {
                    announcement_date: Some(action.date),
                    hearing_date: target,
                    notice_days: Some((target - action.date).num_days()),
                    action_kind: Some(action.kind),
                    source_index: Some(source_index),
                    raw_text: action.raw_text.clone(),
                });
            } else {
                // Time/location changes never create a fact and never reset
                // the announcement clock.
                let hearing = match current_hearing_date {
                    Some(d) => d,
                    None => {
                        debug!(bill_id, source_index, "format change with no announced hearing");
                        timeline.dropped.push(DroppedAction {
                            source_index,
                            kind: action.kind,
                            reason: "no announced hearing to modify".to_string(),
                        });
                        continue;
                    }
                };

                let days_before = (hearing - action.date).num_days();
                if action.kind == ActionKind::HearingTimeChanged && days_before == 0 {
                    timeline.same_day_time_changes.push(hearing);
                }
                if (0..self.format_change_window_days).contains(&days_before) {
                    timeline.format_change_violations.push(FormatChangeViolation {
                        action_kind: action.kind,
                        change_date: action.date,
                        hearing_date: hearing,
                        days_before_hearing: days_before,
                        source_index,
                    });
                }
            }
        }

        if timeline.facts.is_empty() {
            if let Some(hearing_date) = known_hearing_date {
                timeline.facts.push(NoticeFact {
                    announcement_date: None,
                    hearing_date,
                    notice_days: None,
                    action_kind: None,
                    source_index: None,
                    raw_text: String::new(),
                });
            }
        }

        timeline
    }

    /// Declared target date, falling back to a scan of the raw action text.
    fn target_date(&self, action: &Action) -> Option<NaiveDate> {
        if let Some(d) = action.target_date {
            return Some(d);
        }
        if let Some(caps) = self.us_date.captures(&action.raw_text) {
            let month: u32 = caps[1].parse().ok()?;
            let day: u32 = caps[2].parse().ok()?;
            let year: i32 = caps[3].parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, day);
        }
        if let Some(caps) = self.iso_date.captures(&action.raw_text) {
            let year: i32 = caps[1].parse().ok()?;
            let month: u32 = caps[2].parse().ok()?;
            let day: u32 = caps[3].parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, day);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn action(date: NaiveDate, kind: ActionKind, target: Option<NaiveDate>) -> Action {
        Action {
            date,
            kind,
            raw_text: String::new(),
            committee_id: None,
            chamber: None,
            target_date: target,
        }
    }

    fn reconstructor() -> TimelineReconstructor {
        TimelineReconstructor::new(3).unwrap()
    }

    #[test]
    fn scheduled_action_creates_notice_fact() {
        let actions = vec![action(
            d(2025, 11, 14),
            ActionKind::HearingScheduled,
            Some(d(2025, 11, 25)),
        )];
        let timeline = reconstructor().reconstruct("S1249", &actions, None);

        assert_eq!(timeline.facts.len(), 1);
        assert_eq!(timeline.facts[0].notice_days, Some(11));
        assert_eq!(timeline.facts[0].hearing_date, d(2025, 11, 25));
    }

    #[test]
    fn same_calendar_date_yields_zero_notice() {
        let actions = vec![action(
            d(2025, 11, 25),
            ActionKind::HearingRescheduled,
            Some(d(2025, 11, 25)),
        )];
        let timeline = reconstructor().reconstruct("H1", &actions, None);
        assert_eq!(timeline.facts[0].notice_days, Some(0));
        assert!(timeline.facts[0].is_same_day());
    }

    #[test]
    fn action_after_hearing_yields_negative_notice() {
        let actions = vec![action(
            d(2025, 11, 26),
            ActionKind::HearingRescheduled,
            Some(d(2025, 11, 25)),
        )];
        let timeline = reconstructor().reconstruct("H1", &actions, None);
        assert_eq!(timeline.facts[0].notice_days, Some(-1));
        assert!(timeline.facts[0].is_retroactive());
    }

    #[test]
    fn no_announcement_emits_missing_fact() {
        let timeline = reconstructor().reconstruct("H1", &[], Some(d(2025, 11, 25)));
        assert_eq!(timeline.facts.len(), 1);
        assert_eq!(timeline.facts[0].announcement_date, None);
        assert_eq!(timeline.facts[0].notice_days, None);
    }

    #[test]
    fn time_change_does_not_create_fact_or_reset_clock() {
        let actions = vec![
            action(
                d(2025, 11, 14),
                ActionKind::HearingScheduled,
                Some(d(2025, 11, 25)),
            ),
            action(d(2025, 11, 25), ActionKind::HearingTimeChanged, None),
        ];
        let timeline = reconstructor().reconstruct("S1249", &actions, None);
        assert_eq!(timeline.facts.len(), 1);
        assert!(timeline.had_same_day_time_change(d(2025, 11, 25)));
        // Same-day time change is inside the 3-day window.
        assert_eq!(timeline.format_change_violations.len(), 1);
        assert_eq!(timeline.format_change_violations[0].days_before_hearing, 0);
    }

    #[test]
    fn format_change_outside_window_is_not_flagged() {
        let actions = vec![
            action(
                d(2025, 11, 1),
                ActionKind::HearingScheduled,
                Some(d(2025, 11, 25)),
            ),
            action(d(2025, 11, 10), ActionKind::HearingLocationChanged, None),
        ];
        let timeline = reconstructor().reconstruct("H1", &actions, None);
        assert!(timeline.format_change_violations.is_empty());
        assert_eq!(timeline.total_hearing_actions, 2);
    }

    #[test]
    fn announcement_without_target_date_is_dropped_with_reason() {
        let mut a = action(d(2025, 11, 14), ActionKind::HearingScheduled, None);
        a.raw_text = "Hearing scheduled".to_string();
        let timeline = reconstructor().reconstruct("H1", &[a], None);
        assert!(timeline.facts.is_empty());
        assert_eq!(timeline.dropped.len(), 1);
        assert_eq!(timeline.dropped[0].reason, "no extractable target date");
    }

    #[test]
    fn target_date_extracted_from_raw_text() {
        let mut a = action(d(2025, 11, 14), ActionKind::HearingScheduled, None);
        a.raw_text = "Hearing rescheduled to 11/25/2025 from 10:00 AM".to_string();
        let timeline = reconstructor().reconstruct("H1", &[a], None);
        assert_eq!(timeline.facts.len(), 1);
        assert_eq!(timeline.facts[0].hearing_date, d(2025, 11, 25));
    }

    #[test]
    fn same_date_actions_keep_source_order() {
        let actions = vec![
            action(
                d(2025, 11, 25),
                ActionKind::HearingScheduled,
                Some(d(2025, 11, 25)),
            ),
            action(
                d(2025, 11, 25),
                ActionKind::HearingRescheduled,
                Some(d(2025, 11, 26)),
            ),
        ];
        let timeline = reconstructor().reconstruct("H1", &actions, None);
        assert_eq!(timeline.facts[0].source_index, Some(0));
        assert_eq!(timeline.facts[1].source_index, Some(1));
    }
}
