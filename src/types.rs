use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Closed set of committee action kinds.
///
/// The scraping/parsing layer normalizes raw action text into these variants
/// before records reach this crate; anything it cannot classify arrives as
/// `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    HearingScheduled,
    HearingRescheduled,
    HearingTimeChanged,
    HearingLocationChanged,
    Referred,
    ReportedOut,
    Other,
}

impl ActionKind {
    /// Wire name, matching the serialized form (e.g. "HEARING_RESCHEDULED").
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::HearingScheduled => "HEARING_SCHEDULED",
            ActionKind::HearingRescheduled => "HEARING_RESCHEDULED",
            ActionKind::HearingTimeChanged => "HEARING_TIME_CHANGED",
            ActionKind::HearingLocationChanged => "HEARING_LOCATION_CHANGED",
            ActionKind::Referred => "REFERRED",
            ActionKind::ReportedOut => "REPORTED_OUT",
            ActionKind::Other => "OTHER",
        }
    }

    /// True for the action kinds that announce (or re-announce) a hearing date.
    pub fn announces_hearing(&self) -> bool {
        matches!(
            self,
            ActionKind::HearingScheduled | ActionKind::HearingRescheduled
        )
    }

    /// True for time/location amendments that modify an already-announced hearing.
    pub fn is_format_change(&self) -> bool {
        matches!(
            self,
            ActionKind::HearingTimeChanged | ActionKind::HearingLocationChanged
        )
    }

    /// True for any hearing-related action kind.
    pub fn is_hearing_related(&self) -> bool {
        self.announces_hearing() || self.is_format_change()
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One historical event from a bill's action log. Immutable once ingested;
/// ordering by date, then source order, is significant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Date the action was recorded on the public record.
    pub date: NaiveDate,
    pub kind: ActionKind,
    /// Original action text from the source record.
    #[serde(default)]
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chamber: Option<String>,
    /// Declared target hearing date, when the parsing layer extracted one.
    /// When absent the reconstructor falls back to scanning `raw_text`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
}

/// Committee metadata supplied per bill by the collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Committee {
    pub id: String,
    #[serde(default)]
    pub chamber: String,
}

impl Committee {
    /// Single-letter committee classification derived from the id prefix
    /// (e.g. "J19" -> "J"), "?" when the id is empty.
    pub fn committee_type(&self) -> String {
        self.id
            .chars()
            .next()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "?".to_string())
    }
}

/// One bill's action log within a single committee tenure window.
/// This is the on-disk JSON unit the processor consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillRecord {
    pub bill_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_url: Option<String>,
    pub committee: Committee,
    /// Known hearing date from the hearing roster, used when the action log
    /// contains no announcement at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hearing_date: Option<NaiveDate>,
    pub actions: Vec<Action>,
}

/// A derived notice fact: one announcement of a hearing date and the gap in
/// days between announcement and hearing.
///
/// `announcement_date` and `notice_days` are both `None` only for the
/// synthetic "no announcement found" record, which downstream treats as
/// missing notice rather than a zero-day violation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoticeFact {
    pub announcement_date: Option<NaiveDate>,
    pub hearing_date: NaiveDate,
    pub notice_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_kind: Option<ActionKind>,
    /// Index of the originating action in the chronologically sorted log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_index: Option<usize>,
    #[serde(default)]
    pub raw_text: String,
}

impl NoticeFact {
    pub fn is_retroactive(&self) -> bool {
        matches!(self.notice_days, Some(d) if d < 0)
    }

    pub fn is_same_day(&self) -> bool {
        self.notice_days == Some(0)
    }
}

/// A human adjudication of a flagged case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Determination {
    Clerical,
    Violation,
}

impl std::str::FromStr for Determination {
    type Err = String;

    /// Strict parse: the ledger is append-only, so a typo must fail here
    /// rather than be recorded as a violation.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clerical" => Ok(Determination::Clerical),
            "violation" => Ok(Determination::Violation),
            other => Err(format!(
                "unknown determination '{}', expected 'clerical' or 'violation'",
                other
            )),
        }
    }
}
