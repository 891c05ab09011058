use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::evaluator::NoticeEvaluation;
use crate::timeline::HearingTimeline;
use crate::types::Committee;

/// Keywords that indicate a hearing-room/location reference in action text.
const LOCATION_KEYWORDS: &[&str] = &["room", "a-2", "a-1", "gardner"];

/// A flat, deterministic summary of a flagged case. Used for grouping
/// similar cases and for pattern matching; given identical inputs the
/// signature (and its `composite_key`) is byte-identical across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSignature {
    // Notice characteristics
    pub notice_days: i64,
    pub notice_category: String,

    // Action characteristics
    pub action_type: String,
    pub is_retroactive: bool,
    pub is_same_day: bool,

    // Prior context
    pub had_prior_valid_notice: bool,
    pub prior_notice_category: Option<String>,
    pub prior_notice_days: Option<i64>,

    // Timeline pattern
    pub time_between_hearing_and_action: i64,
    pub had_same_day_time_change: bool,
    pub total_hearing_actions: i64,

    // Text patterns, computed from the flagged action's text only
    pub text_contains_time: bool,
    pub text_contains_virtual: bool,
    pub text_contains_location: bool,

    // Committee characteristics
    pub committee_id: String,
    pub committee_type: String,

    // Temporal patterns (informational; excluded from the composite key)
    pub day_of_week_announced: Option<String>,
    pub day_of_week_hearing: String,
    pub month: Option<u32>,

    /// Primary grouping/join key: concatenation of the categorical subset.
    pub composite_key: String,
}

/// Bucket a notice gap into a discrete category.
///
/// Total and deterministic over the entire `i64` domain, including the
/// extremes; `None` maps to "unknown".
pub fn notice_category(days: Option<i64>) -> String {
    let days = match days {
        Some(d) => d,
        None => return "unknown".to_string(),
    };
    if days < -5 {
        return "retroactive_6plus_days".to_string();
    }
    if days < 0 {
        // Only -5..=-1 reach here, so negation cannot overflow.
        let n = -days;
        let plural = if n > 1 { "s" } else { "" };
        return format!("retroactive_{}_day{}", n, plural);
    }
    if days == 0 {
        return "same_day".to_string();
    }
    if days < 10 {
        let plural = if days > 1 { "s" } else { "" };
        return format!("{}_day{}", days, plural);
    }
    "10plus_days".to_string()
}

/// Typed value of one signature field, looked up by name for criteria checks.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl CaseSignature {
    /// Build a signature from the worst notice event and its timeline context.
    ///
    /// Pure function of its inputs; callers decide whether the case crosses
    /// the detection threshold before building.
    pub fn build(
        eval: &NoticeEvaluation,
        timeline: &HearingTimeline,
        committee: &Committee,
    ) -> CaseSignature {
        let fact = &eval.operative;
        let text = fact.raw_text.to_lowercase();
        let hearing_date = fact.hearing_date;
        let announcement = fact.announcement_date;

        let category = notice_category(Some(eval.notice_days));
        let action_type = fact
            .action_kind
            .map(|k| k.as_str().to_string())
            .unwrap_or_else(|| "OTHER".to_string());
        let prior_category = if eval.had_prior_valid_notice {
            Some(notice_category(eval.prior_notice_days))
        } else {
            None
        };
        let had_time_change = timeline.had_same_day_time_change(hearing_date);

        let composite_key = format!(
            "{}_{}_prior_{}_{}",
            category,
            action_type,
            prior_category.as_deref().unwrap_or("none"),
            if had_time_change { "timechange" } else { "notimechange" },
        );

        CaseSignature {
            notice_days: eval.notice_days,
            notice_category: category,
            action_type,
            is_retroactive: eval.notice_days < 0,
            is_same_day: eval.notice_days == 0,
            had_prior_valid_notice: eval.had_prior_valid_notice,
            prior_notice_category: prior_category,
            prior_notice_days: eval.prior_notice_days,
            time_between_hearing_and_action: announcement
                .map(|a| (a - hearing_date).num_days())
                .unwrap_or(0),
            had_same_day_time_change: had_time_change,
            total_hearing_actions: timeline.total_hearing_actions as i64,
            text_contains_time: text.contains("time"),
            text_contains_virtual: text.contains("virtual"),
            text_contains_location: LOCATION_KEYWORDS.iter().any(|w| text.contains(w)),
            committee_id: committee.id.clone(),
            committee_type: committee.committee_type(),
            day_of_week_announced: announcement.map(|d| weekday_name(d)),
            day_of_week_hearing: weekday_name(hearing_date),
            month: announcement.map(|d| d.month()),
            composite_key,
        }
    }

    /// Signature for a case with no announcement anywhere in the log.
    ///
    /// Categories collapse to "unknown"/"NONE"; the learner never emits a
    /// pattern for such groups, so these cases can never be whitelisted.
    pub fn missing(
        hearing_date: NaiveDate,
        timeline: &HearingTimeline,
        committee: &Committee,
    ) -> CaseSignature {
        let had_time_change = timeline.had_same_day_time_change(hearing_date);
        let composite_key = format!(
            "unknown_NONE_prior_none_{}",
            if had_time_change { "timechange" } else { "notimechange" },
        );
        CaseSignature {
            notice_days: 0,
            notice_category: "unknown".to_string(),
            action_type: "NONE".to_string(),
            is_retroactive: false,
            is_same_day: false,
            had_prior_valid_notice: false,
            prior_notice_category: None,
            prior_notice_days: None,
            time_between_hearing_and_action: 0,
            had_same_day_time_change: had_time_change,
            total_hearing_actions: timeline.total_hearing_actions as i64,
            text_contains_time: false,
            text_contains_virtual: false,
            text_contains_location: false,
            committee_id: committee.id.clone(),
            committee_type: committee.committee_type(),
            day_of_week_announced: None,
            day_of_week_hearing: weekday_name(hearing_date),
            month: None,
            composite_key,
        }
    }

    /// Look up a field by its serialized name. Returns `None` for unknown
    /// names and for optional fields that are absent, so a criterion on such
    /// a field can never be satisfied.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "notice_days" => Some(FieldValue::Int(self.notice_days)),
            "notice_category" => Some(FieldValue::Text(self.notice_category.clone())),
            "action_type" => Some(FieldValue::Text(self.action_type.clone())),
            "is_retroactive" => Some(FieldValue::Bool(self.is_retroactive)),
            "is_same_day" => Some(FieldValue::Bool(self.is_same_day)),
            "had_prior_valid_notice" => Some(FieldValue::Bool(self.had_prior_valid_notice)),
            "prior_notice_category" => self
                .prior_notice_category
                .clone()
                .map(FieldValue::Text),
            "prior_notice_days" => self.prior_notice_days.map(FieldValue::Int),
            "time_between_hearing_and_action" => {
                Some(FieldValue::Int(self.time_between_hearing_and_action))
            }
            "had_same_day_time_change" => Some(FieldValue::Bool(self.had_same_day_time_change)),
            "total_hearing_actions" => Some(FieldValue::Int(self.total_hearing_actions)),
            "text_contains_time" => Some(FieldValue::Bool(self.text_contains_time)),
            "text_contains_virtual" => Some(FieldValue::Bool(self.text_contains_virtual)),
            "text_contains_location" => Some(FieldValue::Bool(self.text_contains_location)),
            "committee_id" => Some(FieldValue::Text(self.committee_id.clone())),
            "committee_type" => Some(FieldValue::Text(self.committee_type.clone())),
            "day_of_week_announced" => self
                .day_of_week_announced
                .clone()
                .map(FieldValue::Text),
            "day_of_week_hearing" => Some(FieldValue::Text(self.day_of_week_hearing.clone())),
            "month" => self.month.map(|m| FieldValue::Int(m as i64)),
            "composite_key" => Some(FieldValue::Text(self.composite_key.clone())),
            _ => None,
        }
    }
}

fn weekday_name(date: NaiveDate) -> String {
    match date.weekday() {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionKind, NoticeFact};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn retro_eval() -> NoticeEvaluation {
        NoticeEvaluation {
            operative: NoticeFact {
                announcement_date: Some(d(2025, 11, 26)),
                hearing_date: d(2025, 11, 25),
                notice_days: Some(-1),
                action_kind: Some(ActionKind::HearingRescheduled),
                source_index: Some(2),
                raw_text: "Hearing rescheduled to 11/25/2025".to_string(),
            },
            notice_days: -1,
            had_prior_valid_notice: true,
            prior_notice_days: Some(11),
        }
    }

    fn committee() -> Committee {
        Committee {
            id: "J19".to_string(),
            chamber: "Joint".to_string(),
        }
    }

    #[test]
    fn bucketing_is_total_over_boundaries() {
        assert_eq!(notice_category(None), "unknown");
        assert_eq!(notice_category(Some(i64::MIN)), "retroactive_6plus_days");
        assert_eq!(notice_category(Some(-6)), "retroactive_6plus_days");
        assert_eq!(notice_category(Some(-5)), "retroactive_5_days");
        assert_eq!(notice_category(Some(-2)), "retroactive_2_days");
        assert_eq!(notice_category(Some(-1)), "retroactive_1_day");
        assert_eq!(notice_category(Some(0)), "same_day");
        assert_eq!(notice_category(Some(1)), "1_day");
        assert_eq!(notice_category(Some(2)), "2_days");
        assert_eq!(notice_category(Some(3)), "3_days");
        assert_eq!(notice_category(Some(9)), "9_days");
        assert_eq!(notice_category(Some(10)), "10plus_days");
        assert_eq!(notice_category(Some(i64::MAX)), "10plus_days");
    }

    #[test]
    fn retroactive_signature_fields() {
        let mut timeline = HearingTimeline::default();
        timeline.same_day_time_changes.push(d(2025, 11, 25));
        timeline.total_hearing_actions = 3;

        let sig = CaseSignature::build(&retro_eval(), &timeline, &committee());

        assert!(sig.is_retroactive);
        assert!(!sig.is_same_day);
        assert_eq!(sig.notice_category, "retroactive_1_day");
        assert!(sig.had_prior_valid_notice);
        assert_eq!(sig.prior_notice_days, Some(11));
        assert_eq!(sig.prior_notice_category.as_deref(), Some("10plus_days"));
        assert!(sig.had_same_day_time_change);
        assert_eq!(sig.time_between_hearing_and_action, 1);
        assert_eq!(sig.committee_type, "J");
        assert_eq!(
            sig.composite_key,
            "retroactive_1_day_HEARING_RESCHEDULED_prior_10plus_days_timechange"
        );
    }

    #[test]
    fn signature_is_deterministic() {
        let timeline = HearingTimeline::default();
        let a = CaseSignature::build(&retro_eval(), &timeline, &committee());
        let b = CaseSignature::build(&retro_eval(), &timeline, &committee());
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn same_day_signature_with_virtual_text() {
        let eval = NoticeEvaluation {
            operative: NoticeFact {
                announcement_date: Some(d(2025, 11, 25)),
                hearing_date: d(2025, 11, 25),
                notice_days: Some(0),
                action_kind: Some(ActionKind::HearingRescheduled),
                source_index: Some(1),
                raw_text: "Hearing rescheduled with virtual option in Room A-2".to_string(),
            },
            notice_days: 0,
            had_prior_valid_notice: true,
            prior_notice_days: Some(15),
        };
        let sig = CaseSignature::build(&eval, &HearingTimeline::default(), &committee());

        assert!(sig.is_same_day);
        assert!(!sig.is_retroactive);
        assert_eq!(sig.notice_category, "same_day");
        assert!(sig.text_contains_virtual);
        assert!(sig.text_contains_location);
    }

    #[test]
    fn absent_optional_fields_resolve_to_none() {
        let eval = NoticeEvaluation {
            had_prior_valid_notice: false,
            prior_notice_days: None,
            ..retro_eval()
        };
        let sig = CaseSignature::build(&eval, &HearingTimeline::default(), &committee());
        assert_eq!(sig.field("prior_notice_days"), None);
        assert_eq!(sig.field("prior_notice_category"), None);
        assert_eq!(sig.field("not_a_field"), None);
        assert_eq!(
            sig.field("had_prior_valid_notice"),
            Some(FieldValue::Bool(false))
        );
    }
}
