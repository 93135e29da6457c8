//! Rule decision repository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::database::models::{RejectedSummary, RuleDecision};
use crate::Result;

/// Rule decision repository trait.
///
/// Decisions are append-only; "the" decision for a candidate is the row
/// with the largest `id`, which stays deterministic even when two rows
/// share an `evaluated_at` timestamp.
#[async_trait]
pub trait DecisionRepository: Send + Sync {
    /// Append a decision; returns the assigned row id.
    async fn record_rule_decision(&self, decision: &RuleDecision) -> Result<i64>;
    /// Latest decision for a candidate, by largest id.
    async fn get_rule_decision(&self, video_id: &str) -> Result<Option<RuleDecision>>;
    /// Candidates whose latest decision was a rejection, most recently
    /// evaluated first.
    async fn list_rejected_candidates(&self, limit: i64) -> Result<Vec<RejectedSummary>>;
}

/// SQLx implementation of DecisionRepository.
pub struct SqlxDecisionRepository {
    pool: SqlitePool,
    write_pool: SqlitePool,
}

impl SqlxDecisionRepository {
    pub fn new(pool: SqlitePool, write_pool: SqlitePool) -> Self {
        Self { pool, write_pool }
    }
}

#[async_trait]
impl DecisionRepository for SqlxDecisionRepository {
    async fn record_rule_decision(&self, decision: &RuleDecision) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO rule_decisions (video_id, rule_passed, reject_rule_name, reject_reason, evaluated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&decision.video_id)
        .bind(decision.rule_passed)
        .bind(&decision.reject_rule_name)
        .bind(&decision.reject_reason)
        .bind(decision.evaluated_at)
        .execute(&self.write_pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn get_rule_decision(&self, video_id: &str) -> Result<Option<RuleDecision>> {
        let decision = sqlx::query_as::<_, RuleDecision>(
            "SELECT * FROM rule_decisions WHERE video_id = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(decision)
    }

    async fn list_rejected_candidates(&self, limit: i64) -> Result<Vec<RejectedSummary>> {
        let rejected = sqlx::query_as::<_, RejectedSummary>(
            r#"
            SELECT vc.video_id, vc.title, vc.view_count, vc.published_at,
                   COALESCE(rd.reject_rule_name, '') AS reject_rule_name,
                   COALESCE(rd.reject_reason, '') AS reject_reason,
                   rd.evaluated_at
            FROM video_candidates vc
            INNER JOIN rule_decisions rd ON vc.video_id = rd.video_id
            WHERE rd.rule_passed = 0
              AND rd.id = (SELECT MAX(id) FROM rule_decisions WHERE video_id = vc.video_id)
            ORDER BY rd.evaluated_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rejected)
    }
}
