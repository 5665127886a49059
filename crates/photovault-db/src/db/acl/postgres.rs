use async_trait::async_trait;
use photovault_core::{AclPolicy, AclRule, AppError, ObjectId, PrincipalId, Visibility};
use sqlx::{PgPool, Row};

use super::repository::AclPolicyRepository;

/// Policy table in PostgreSQL. See `migrations/` for the schema.
#[derive(Clone)]
pub struct PostgresAclPolicyRepository {
    pool: PgPool,
}

impl PostgresAclPolicyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AclPolicyRepository for PostgresAclPolicyRepository {
    async fn get(&self, object_id: &ObjectId) -> Result<Option<AclPolicy>, AppError> {
        // Use dynamic SQLx queries to avoid requiring DATABASE_URL/sqlx prepare
        let row = sqlx::query(
            r#"
            SELECT owner, visibility
            FROM object_acl_policies
            WHERE object_id = $1
            "#,
        )
        .bind(object_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let owner: String = row.try_get("owner")?;
        let visibility: String = row.try_get("visibility")?;
        let mut policy = AclPolicy::new(PrincipalId::new(owner), visibility.parse()?);

        let rules = sqlx::query(
            r#"
            SELECT principal, permission
            FROM object_acl_rules
            WHERE object_id = $1
            ORDER BY created_at, principal
            "#,
        )
        .bind(object_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        for rule in rules {
            let principal: String = rule.try_get("principal")?;
            let permission: String = rule.try_get("permission")?;
            policy.rules.push(AclRule {
                principal: PrincipalId::new(principal),
                permission: permission.parse()?,
            });
        }

        Ok(Some(policy))
    }

    async fn insert_if_absent(
        &self,
        object_id: &ObjectId,
        policy: AclPolicy,
    ) -> Result<(AclPolicy, bool), AppError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO object_acl_policies (object_id, owner, visibility)
            VALUES ($1, $2, $3)
            ON CONFLICT (object_id) DO NOTHING
            RETURNING object_id
            "#,
        )
        .bind(object_id.as_str())
        .bind(policy.owner.as_str())
        .bind(policy.visibility.to_string())
        .fetch_optional(&self.pool)
        .await?
        .is_some();

        if inserted {
            return Ok((policy, true));
        }

        let existing = self.get(object_id).await?.ok_or_else(|| {
            AppError::Database(format!(
                "Policy for {} vanished between insert and read",
                object_id
            ))
        })?;
        Ok((existing, false))
    }

    async fn update_visibility(
        &self,
        object_id: &ObjectId,
        visibility: Visibility,
    ) -> Result<Option<AclPolicy>, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE object_acl_policies
            SET visibility = $2, updated_at = NOW()
            WHERE object_id = $1
            "#,
        )
        .bind(object_id.as_str())
        .bind(visibility.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(object_id).await
    }

    async fn add_rule(
        &self,
        object_id: &ObjectId,
        rule: AclRule,
    ) -> Result<Option<AclPolicy>, AppError> {
        sqlx::query(
            r#"
            INSERT INTO object_acl_rules (object_id, principal, permission)
            SELECT object_id, $2, $3
            FROM object_acl_policies
            WHERE object_id = $1
            ON CONFLICT (object_id, principal, permission) DO NOTHING
            "#,
        )
        .bind(object_id.as_str())
        .bind(rule.principal.as_str())
        .bind(rule.permission.to_string())
        .execute(&self.pool)
        .await?;

        self.get(object_id).await
    }

    async fn remove_rules(
        &self,
        object_id: &ObjectId,
        principal: &PrincipalId,
    ) -> Result<Option<AclPolicy>, AppError> {
        sqlx::query(
            r#"
            DELETE FROM object_acl_rules
            WHERE object_id = $1 AND principal = $2
            "#,
        )
        .bind(object_id.as_str())
        .bind(principal.as_str())
        .execute(&self.pool)
        .await?;

        self.get(object_id).await
    }

    async fn remove(&self, object_id: &ObjectId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM object_acl_policies WHERE object_id = $1")
            .bind(object_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
