//! Rule evaluation engine.
//!
//! Evaluates candidates against the active ruleset in priority order,
//! short-circuiting on the first violation, and appends one decision row
//! per evaluation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::database::models::{FilterRule, RuleDecision, RuleType, VideoCandidate};
use crate::database::repositories::{CandidateRepository, DecisionRepository, RuleRepository};
use crate::rules::default_rules;
use crate::{Error, Result};

/// Outcome of evaluating a batch of candidates.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub passed: Vec<VideoCandidate>,
    pub rejected: Vec<VideoCandidate>,
}

/// Evaluates video candidates against configurable filter rules.
pub struct RuleEngine {
    rules: Arc<dyn RuleRepository>,
    decisions: Arc<dyn DecisionRepository>,
    candidates: Arc<dyn CandidateRepository>,
}

impl RuleEngine {
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        decisions: Arc<dyn DecisionRepository>,
        candidates: Arc<dyn CandidateRepository>,
    ) -> Self {
        Self {
            rules,
            decisions,
            candidates,
        }
    }

    /// Add each default rule that does not already exist. Idempotent.
    pub async fn seed_default_rules(&self) -> Result<()> {
        for rule in default_rules() {
            if self.rules.get_rule(&rule.rule_name).await?.is_none() {
                self.rules.add_rule(&rule).await?;
            }
        }
        Ok(())
    }

    /// Evaluate a single candidate against the active ruleset and record the
    /// decision. Exactly one decision row is appended per call.
    pub async fn evaluate(&self, candidate: &VideoCandidate) -> Result<RuleDecision> {
        let rules = self.rules.list_active_rules().await?;
        let now = Utc::now();

        for rule in &rules {
            if let Some(reason) = violation(rule, candidate, now) {
                debug!(
                    video_id = %candidate.video_id,
                    rule = %rule.rule_name,
                    %reason,
                    "candidate rejected"
                );
                let mut decision =
                    RuleDecision::rejected(&candidate.video_id, &rule.rule_name, reason);
                decision.id = self.decisions.record_rule_decision(&decision).await?;
                return Ok(decision);
            }
        }

        let mut decision = RuleDecision::passed(&candidate.video_id);
        decision.id = self.decisions.record_rule_decision(&decision).await?;
        Ok(decision)
    }

    /// Evaluate candidates serially, splitting them into passed and rejected.
    pub async fn evaluate_batch(
        &self,
        candidates: &[VideoCandidate],
        token: &CancellationToken,
    ) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        for candidate in candidates {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let decision = self.evaluate(candidate).await?;
            if decision.rule_passed {
                outcome.passed.push(candidate.clone());
            } else {
                outcome.rejected.push(candidate.clone());
            }
        }
        Ok(outcome)
    }

    /// Evaluate candidates that have no decision history yet. Re-running
    /// after completion is a no-op because evaluated candidates are
    /// excluded from the listing.
    pub async fn filter_pending_candidates(
        &self,
        limit: i64,
        token: &CancellationToken,
    ) -> Result<BatchOutcome> {
        let candidates = self.candidates.list_unevaluated_candidates(limit).await?;
        self.evaluate_batch(&candidates, token).await
    }
}

/// Returns the rejection reason if the candidate violates the rule.
///
/// Lenient by construction: unknown rule types, unknown fields, and
/// malformed values all pass.
fn violation(rule: &FilterRule, candidate: &VideoCandidate, now: DateTime<Utc>) -> Option<String> {
    let rule_type = RuleType::parse(&rule.rule_type)?;
    match rule_type {
        RuleType::Min => check_min(rule, candidate),
        RuleType::Max => check_max(rule, candidate),
        RuleType::Blocklist => check_blocklist(rule, candidate),
        RuleType::Allowlist => check_allowlist(rule, candidate),
        RuleType::Regex => check_regex(rule, candidate),
        RuleType::AgeDays => check_age_days(rule, candidate, now),
    }
}

fn check_min(rule: &FilterRule, candidate: &VideoCandidate) -> Option<String> {
    let threshold: f64 = rule.value.parse().ok()?;
    let actual = numeric_field(candidate, &rule.field)?;
    if actual < threshold {
        Some(format!(
            "{} ({}) below minimum ({})",
            rule.field, actual, threshold
        ))
    } else {
        None
    }
}

fn check_max(rule: &FilterRule, candidate: &VideoCandidate) -> Option<String> {
    let threshold: f64 = rule.value.parse().ok()?;
    let actual = numeric_field(candidate, &rule.field)?;
    if actual > threshold {
        Some(format!(
            "{} ({}) exceeds maximum ({})",
            rule.field, actual, threshold
        ))
    } else {
        None
    }
}

fn check_blocklist(rule: &FilterRule, candidate: &VideoCandidate) -> Option<String> {
    let blocklist: Vec<String> = serde_json::from_str(&rule.value).ok()?;
    let value = string_field(candidate, &rule.field)?;
    let lowered = value.to_lowercase();
    if blocklist.iter().any(|b| b.to_lowercase() == lowered) {
        Some(format!("{} '{}' is blocked", rule.field, value))
    } else {
        None
    }
}

fn check_allowlist(rule: &FilterRule, candidate: &VideoCandidate) -> Option<String> {
    let allowlist: Vec<String> = serde_json::from_str(&rule.value).ok()?;
    // An empty allowlist allows everything.
    if allowlist.is_empty() {
        return None;
    }
    let value = string_field(candidate, &rule.field)?;
    let lowered = value.to_lowercase();
    if allowlist.iter().any(|a| a.to_lowercase() == lowered) {
        None
    } else {
        Some(format!("{} '{}' is not in allowed list", rule.field, value))
    }
}

fn check_regex(rule: &FilterRule, candidate: &VideoCandidate) -> Option<String> {
    let pattern = Regex::new(&rule.value).ok()?;
    let value = text_field(candidate, &rule.field)?;
    if pattern.is_match(value) {
        Some(format!(
            "{} matches blocked pattern '{}'",
            rule.field, rule.value
        ))
    } else {
        None
    }
}

fn check_age_days(
    rule: &FilterRule,
    candidate: &VideoCandidate,
    now: DateTime<Utc>,
) -> Option<String> {
    let max_days: i64 = rule.value.parse().ok()?;
    let published_at = candidate.published_at?;
    let age_days = (now - published_at).num_days();
    if age_days > max_days {
        Some(format!(
            "video age ({} days) exceeds maximum ({} days)",
            age_days, max_days
        ))
    } else {
        None
    }
}

/// Numeric candidate fields addressable by min/max rules.
fn numeric_field(candidate: &VideoCandidate, field: &str) -> Option<f64> {
    match field {
        "view_count" => Some(candidate.view_count as f64),
        "like_count" => Some(candidate.like_count as f64),
        "comment_count" => Some(candidate.comment_count as f64),
        "duration_seconds" => Some(candidate.duration_seconds as f64),
        "view_velocity" => Some(candidate.view_velocity),
        "engagement_rate" => Some(candidate.engagement_rate),
        _ => None,
    }
}

/// String candidate fields addressable by blocklist/allowlist rules.
fn string_field<'a>(candidate: &'a VideoCandidate, field: &str) -> Option<&'a str> {
    match field {
        "category" => Some(&candidate.category),
        "language" => Some(&candidate.language),
        "channel_id" => Some(&candidate.channel_id),
        _ => None,
    }
}

/// Text candidate fields addressable by regex rules.
fn text_field<'a>(candidate: &'a VideoCandidate, field: &str) -> Option<&'a str> {
    match field {
        "title" => Some(&candidate.title),
        "description" => Some(&candidate.description),
        "category" => Some(&candidate.category),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::RuleType;

    fn candidate() -> VideoCandidate {
        VideoCandidate {
            video_id: "vid1".into(),
            channel_id: "UC1".into(),
            title: "A Video".into(),
            description: "desc".into(),
            duration_seconds: 300,
            view_count: 5000,
            like_count: 100,
            comment_count: 20,
            category: "Gaming".into(),
            language: "en".into(),
            ..Default::default()
        }
    }

    fn rule(rule_type: RuleType, field: &str, value: &str) -> FilterRule {
        FilterRule::new("test_rule", rule_type, field, value, 0)
    }

    #[test]
    fn test_min_boundary_passes() {
        let r = rule(RuleType::Min, "view_count", "5000");
        assert!(violation(&r, &candidate(), Utc::now()).is_none());

        let r = rule(RuleType::Min, "view_count", "5001");
        let reason = violation(&r, &candidate(), Utc::now()).unwrap();
        assert_eq!(reason, "view_count (5000) below minimum (5001)");
    }

    #[test]
    fn test_max_boundary_passes() {
        let r = rule(RuleType::Max, "duration_seconds", "300");
        assert!(violation(&r, &candidate(), Utc::now()).is_none());

        let r = rule(RuleType::Max, "duration_seconds", "299");
        let reason = violation(&r, &candidate(), Utc::now()).unwrap();
        assert!(reason.contains("exceeds maximum"));
    }

    #[test]
    fn test_blocklist_case_insensitive() {
        let r = rule(RuleType::Blocklist, "category", r#"["GAMING"]"#);
        let reason = violation(&r, &candidate(), Utc::now()).unwrap();
        assert_eq!(reason, "category 'Gaming' is blocked");
    }

    #[test]
    fn test_allowlist_empty_allows_all() {
        let r = rule(RuleType::Allowlist, "category", "[]");
        assert!(violation(&r, &candidate(), Utc::now()).is_none());
    }

    #[test]
    fn test_allowlist_rejects_outside_list() {
        let r = rule(RuleType::Allowlist, "category", r#"["Music"]"#);
        let reason = violation(&r, &candidate(), Utc::now()).unwrap();
        assert_eq!(reason, "category 'Gaming' is not in allowed list");
    }

    #[test]
    fn test_regex_rejects_match() {
        let r = rule(RuleType::Regex, "title", "(?i)a video");
        assert!(violation(&r, &candidate(), Utc::now()).is_some());

        let r = rule(RuleType::Regex, "title", "sponsored");
        assert!(violation(&r, &candidate(), Utc::now()).is_none());
    }

    #[test]
    fn test_age_days_boundary_and_null() {
        let now = Utc::now();

        // No publish date passes.
        let r = rule(RuleType::AgeDays, "published_at", "30");
        assert!(violation(&r, &candidate(), now).is_none());

        // Exactly at the limit passes.
        let mut at_limit = candidate();
        at_limit.published_at = Some(now - chrono::Duration::days(30));
        assert!(violation(&r, &at_limit, now).is_none());

        // One day past the limit is rejected.
        let mut too_old = candidate();
        too_old.published_at = Some(now - chrono::Duration::days(31));
        let reason = violation(&r, &too_old, now).unwrap();
        assert_eq!(reason, "video age (31 days) exceeds maximum (30 days)");
    }

    #[test]
    fn test_malformed_values_pass() {
        let cases = [
            rule(RuleType::Min, "view_count", "not-a-number"),
            rule(RuleType::Max, "view_count", ""),
            rule(RuleType::Blocklist, "category", "not json"),
            rule(RuleType::Allowlist, "category", "{bad"),
            rule(RuleType::Regex, "title", "[unclosed"),
            rule(RuleType::AgeDays, "published_at", "thirty"),
        ];
        for r in &cases {
            assert!(
                violation(r, &candidate(), Utc::now()).is_none(),
                "expected malformed rule {:?} to pass",
                r.rule_type
            );
        }
    }

    #[test]
    fn test_unknown_field_and_type_pass() {
        let r = rule(RuleType::Min, "nonexistent_field", "10");
        assert!(violation(&r, &candidate(), Utc::now()).is_none());

        let mut unknown = rule(RuleType::Min, "view_count", "10");
        unknown.rule_type = "between".to_string();
        assert!(violation(&unknown, &candidate(), Utc::now()).is_none());
    }
}
