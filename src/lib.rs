//! Hearing-notice compliance engine for legislative committee action logs.
//!
//! This library reconstructs hearing announcement timelines from bill action
//! logs, evaluates the notice actually given against a compliance minimum,
//! and separates genuine violations from known clerical record-keeping
//! patterns learned from human review.

pub mod audit;
pub mod config;
pub mod decisions;
pub mod error;
pub mod evaluator;
pub mod learner;
pub mod patterns;
pub mod processor;
pub mod signature;
pub mod timeline;
pub mod types;

pub use audit::{AuditLog, AuditRecord};
pub use config::{Config, ConfigBuilder};
pub use decisions::{Decision, DecisionLog};
pub use error::{Error, Result};
pub use evaluator::{NoticeEvaluation, NoticeOutcome};
pub use learner::{GroupStatus, LearnerReport, PatternLearner};
pub use patterns::{ClericalPattern, Criterion, PatternStore};
pub use processor::{BillEvaluation, ComplianceStatus, NoticeProcessor};
pub use signature::CaseSignature;
pub use timeline::{HearingTimeline, TimelineReconstructor};
pub use types::{Action, ActionKind, BillRecord, Committee, Determination, NoticeFact};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::{Config, ConfigBuilder};
    pub use crate::error::{Error, Result};
    pub use crate::patterns::{ClericalPattern, PatternStore};
    pub use crate::processor::{BillEvaluation, ComplianceStatus, NoticeProcessor};
    pub use crate::types::{Action, ActionKind, BillRecord, Committee};
    pub use futures::StreamExt;
}
