//! Filter rule repository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::database::models::FilterRule;
use crate::Result;

/// Filter rule repository trait.
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Upsert by `rule_name`, overwriting type, field, value, active flag,
    /// and priority.
    async fn add_rule(&self, rule: &FilterRule) -> Result<()>;
    async fn get_rule(&self, rule_name: &str) -> Result<Option<FilterRule>>;
    /// Active rules ordered by priority descending, then name.
    async fn list_active_rules(&self) -> Result<Vec<FilterRule>>;
    async fn list_all_rules(&self) -> Result<Vec<FilterRule>>;
    async fn update_rule(&self, rule_name: &str, value: &str) -> Result<()>;
    async fn delete_rule(&self, rule_name: &str) -> Result<()>;
}

/// SQLx implementation of RuleRepository.
pub struct SqlxRuleRepository {
    pool: SqlitePool,
    write_pool: SqlitePool,
}

impl SqlxRuleRepository {
    pub fn new(pool: SqlitePool, write_pool: SqlitePool) -> Self {
        Self { pool, write_pool }
    }
}

#[async_trait]
impl RuleRepository for SqlxRuleRepository {
    async fn add_rule(&self, rule: &FilterRule) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO filter_rules (rule_name, rule_type, field, value, is_active, priority, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(rule_name) DO UPDATE SET
                rule_type = excluded.rule_type,
                field = excluded.field,
                value = excluded.value,
                is_active = excluded.is_active,
                priority = excluded.priority
            "#,
        )
        .bind(&rule.rule_name)
        .bind(&rule.rule_type)
        .bind(&rule.field)
        .bind(&rule.value)
        .bind(rule.is_active)
        .bind(rule.priority)
        .bind(rule.created_at)
        .execute(&self.write_pool)
        .await?;
        Ok(())
    }

    async fn get_rule(&self, rule_name: &str) -> Result<Option<FilterRule>> {
        let rule = sqlx::query_as::<_, FilterRule>("SELECT * FROM filter_rules WHERE rule_name = ?")
            .bind(rule_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rule)
    }

    async fn list_active_rules(&self) -> Result<Vec<FilterRule>> {
        let rules = sqlx::query_as::<_, FilterRule>(
            "SELECT * FROM filter_rules WHERE is_active = 1 ORDER BY priority DESC, rule_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rules)
    }

    async fn list_all_rules(&self) -> Result<Vec<FilterRule>> {
        let rules = sqlx::query_as::<_, FilterRule>(
            "SELECT * FROM filter_rules ORDER BY priority DESC, rule_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rules)
    }

    async fn update_rule(&self, rule_name: &str, value: &str) -> Result<()> {
        sqlx::query("UPDATE filter_rules SET value = ? WHERE rule_name = ?")
            .bind(value)
            .bind(rule_name)
            .execute(&self.write_pool)
            .await?;
        Ok(())
    }

    async fn delete_rule(&self, rule_name: &str) -> Result<()> {
        sqlx::query("DELETE FROM filter_rules WHERE rule_name = ?")
            .bind(rule_name)
            .execute(&self.write_pool)
            .await?;
        Ok(())
    }
}
