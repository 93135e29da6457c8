//! Rule decision database model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The audit record of one rule evaluation for a candidate.
///
/// Decisions are append-only; the authoritative decision for a candidate is
/// the row with the largest `id`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RuleDecision {
    pub id: i64,
    pub video_id: String,
    pub rule_passed: bool,
    /// Name of the rule that rejected the candidate; set iff rejected.
    pub reject_rule_name: Option<String>,
    /// Human-readable rejection reason; set iff rejected.
    pub reject_reason: Option<String>,
    pub evaluated_at: DateTime<Utc>,
}

impl RuleDecision {
    /// A passing decision for a candidate.
    pub fn passed(video_id: impl Into<String>) -> Self {
        Self {
            id: 0,
            video_id: video_id.into(),
            rule_passed: true,
            reject_rule_name: None,
            reject_reason: None,
            evaluated_at: Utc::now(),
        }
    }

    /// A rejection by the named rule.
    pub fn rejected(
        video_id: impl Into<String>,
        rule_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            video_id: video_id.into(),
            rule_passed: false,
            reject_rule_name: Some(rule_name.into()),
            reject_reason: Some(reason.into()),
            evaluated_at: Utc::now(),
        }
    }
}

/// Listing row for candidates whose latest decision was a rejection.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RejectedSummary {
    pub video_id: String,
    pub title: String,
    pub view_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub reject_rule_name: String,
    pub reject_reason: String,
    pub evaluated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_constructors() {
        let pass = RuleDecision::passed("vid1");
        assert!(pass.rule_passed);
        assert!(pass.reject_rule_name.is_none());

        let reject = RuleDecision::rejected("vid2", "min_views", "view_count (100) below minimum (1000)");
        assert!(!reject.rule_passed);
        assert_eq!(reject.reject_rule_name.as_deref(), Some("min_views"));
        assert!(reject.reject_reason.is_some());
    }
}
