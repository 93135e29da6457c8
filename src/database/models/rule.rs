//! Filter rule database model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A configurable constraint for filtering video candidates.
///
/// `value` is always stored as a string; its interpretation depends on
/// `rule_type` (numeric threshold, JSON list, regex pattern, or day count).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FilterRule {
    pub id: i64,
    pub rule_name: String,
    pub rule_type: String,
    pub field: String,
    pub value: String,
    pub is_active: bool,
    /// Higher priority rules are evaluated first.
    pub priority: i64,
    pub created_at: DateTime<Utc>,
}

impl FilterRule {
    pub fn new(
        rule_name: impl Into<String>,
        rule_type: RuleType,
        field: impl Into<String>,
        value: impl Into<String>,
        priority: i64,
    ) -> Self {
        Self {
            id: 0,
            rule_name: rule_name.into(),
            rule_type: rule_type.as_str().to_string(),
            field: field.into(),
            value: value.into(),
            is_active: true,
            priority,
            created_at: Utc::now(),
        }
    }
}

/// Rule types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// Numeric field must be >= the threshold.
    Min,
    /// Numeric field must be <= the threshold.
    Max,
    /// String field must not be in the list (case-insensitive).
    Blocklist,
    /// String field must be in the list (case-insensitive); empty list allows all.
    Allowlist,
    /// Text field must not match the pattern.
    Regex,
    /// Video must be no older than the given number of days.
    AgeDays,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Blocklist => "blocklist",
            Self::Allowlist => "allowlist",
            Self::Regex => "regex",
            Self::AgeDays => "age_days",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "blocklist" => Some(Self::Blocklist),
            "allowlist" => Some(Self::Allowlist),
            "regex" => Some(Self::Regex),
            "age_days" => Some(Self::AgeDays),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_type_serialization() {
        assert_eq!(RuleType::AgeDays.as_str(), "age_days");
        assert_eq!(RuleType::parse("blocklist"), Some(RuleType::Blocklist));
        assert_eq!(RuleType::parse("BLOCKLIST"), None);
        assert_eq!(RuleType::parse("unknown"), None);
    }

    #[test]
    fn test_filter_rule_new() {
        let rule = FilterRule::new("min_views", RuleType::Min, "view_count", "1000", 100);
        assert_eq!(rule.rule_type, "min");
        assert!(rule.is_active);
        assert_eq!(rule.priority, 100);
    }
}
