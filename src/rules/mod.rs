//! Rule-based candidate filtering.

mod engine;

pub use engine::{BatchOutcome, RuleEngine};

use serde::{Deserialize, Serialize};

use crate::database::models::{FilterRule, RuleType};
use crate::{Error, Result};

/// Default filtering rules, seeded when absent.
pub fn default_rules() -> Vec<FilterRule> {
    vec![
        FilterRule::new("min_views", RuleType::Min, "view_count", "1000", 100),
        FilterRule::new("max_age_days", RuleType::AgeDays, "published_at", "30", 90),
        FilterRule::new("min_duration", RuleType::Min, "duration_seconds", "60", 80),
        FilterRule::new("max_duration", RuleType::Max, "duration_seconds", "3600", 80),
        FilterRule::new(
            "blocked_categories",
            RuleType::Blocklist,
            "category",
            r#"["News & Politics"]"#,
            70,
        ),
    ]
}

/// External JSON form of a rule definition.
///
/// `value` is always a string; numeric and list values use the string
/// encodings of their rule type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleJson {
    pub name: String,
    #[serde(rename = "type")]
    pub rule_type: String,
    pub field: String,
    pub value: String,
    #[serde(default)]
    pub priority: i64,
}

/// Parse an operator-supplied JSON rule definition into a [`FilterRule`].
pub fn parse_rule_from_json(json: &str) -> Result<FilterRule> {
    let parsed: RuleJson = serde_json::from_str(json)
        .map_err(|e| Error::validation(format!("invalid rule JSON: {e}")))?;

    if parsed.name.is_empty() {
        return Err(Error::validation("rule name is required"));
    }
    if parsed.rule_type.is_empty() {
        return Err(Error::validation("rule type is required"));
    }
    if parsed.field.is_empty() {
        return Err(Error::validation("rule field is required"));
    }
    if parsed.value.is_empty() {
        return Err(Error::validation("rule value is required"));
    }
    let rule_type = RuleType::parse(&parsed.rule_type).ok_or_else(|| {
        Error::validation(format!(
            "invalid rule type: {} (must be min, max, blocklist, allowlist, regex, or age_days)",
            parsed.rule_type
        ))
    })?;

    Ok(FilterRule::new(
        parsed.name,
        rule_type,
        parsed.field,
        parsed.value,
        parsed.priority,
    ))
}
