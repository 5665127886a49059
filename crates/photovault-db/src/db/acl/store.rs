use std::sync::Arc;

use photovault_core::{
    AclPolicy, AclRule, AppError, ObjectId, Permission, PrincipalId, Visibility,
};

use super::repository::AclPolicyRepository;

/// Owns the access decision for registered objects.
///
/// Callers that want owner-only mutations check ownership themselves; the
/// store only guarantees atomicity and the conflict rules below.
#[derive(Clone)]
pub struct AclPolicyStore {
    repository: Arc<dyn AclPolicyRepository>,
}

impl AclPolicyStore {
    pub fn new(repository: Arc<dyn AclPolicyRepository>) -> Self {
        Self { repository }
    }

    /// Attach the policy an object is registered with.
    ///
    /// Re-attaching identical terms is a no-op. Different terms for an object
    /// that already has a policy is a `Conflict`; use `update_policy` instead.
    pub async fn attach_policy(
        &self,
        object_id: &ObjectId,
        owner: &PrincipalId,
        visibility: Visibility,
    ) -> Result<AclPolicy, AppError> {
        let (stored, created) = self
            .repository
            .insert_if_absent(object_id, AclPolicy::new(owner.clone(), visibility))
            .await?;

        if created {
            tracing::info!(
                object_id = %object_id,
                owner = %owner,
                visibility = %visibility,
                "ACL policy attached"
            );
            return Ok(stored);
        }

        if stored.has_terms(owner, visibility) {
            tracing::debug!(object_id = %object_id, "ACL policy already attached with same terms");
            return Ok(stored);
        }

        tracing::warn!(
            object_id = %object_id,
            requested_owner = %owner,
            requested_visibility = %visibility,
            "Conflicting ACL policy attach rejected"
        );
        Err(AppError::Conflict(format!(
            "Object {} already has a policy with different terms",
            object_id
        )))
    }

    /// The access decision. Never fails: a missing policy or an unreachable
    /// repository both deny.
    pub async fn check_access(
        &self,
        object_id: &ObjectId,
        requester: &PrincipalId,
        permission: Permission,
    ) -> bool {
        match self.repository.get(object_id).await {
            Ok(Some(policy)) => {
                let allowed = policy.allows(requester, permission);
                tracing::debug!(
                    object_id = %object_id,
                    requester = %requester,
                    permission = %permission,
                    allowed,
                    "Access decision"
                );
                allowed
            }
            Ok(None) => {
                tracing::debug!(object_id = %object_id, "No ACL policy, denying access");
                false
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    object_id = %object_id,
                    "ACL policy lookup failed, denying access"
                );
                false
            }
        }
    }

    pub async fn get_policy(&self, object_id: &ObjectId) -> Result<Option<AclPolicy>, AppError> {
        self.repository.get(object_id).await
    }

    pub async fn update_policy(
        &self,
        object_id: &ObjectId,
        visibility: Visibility,
    ) -> Result<AclPolicy, AppError> {
        let policy = self
            .repository
            .update_visibility(object_id, visibility)
            .await?
            .ok_or_else(|| not_found(object_id))?;

        tracing::info!(object_id = %object_id, visibility = %visibility, "ACL visibility updated");
        Ok(policy)
    }

    pub async fn grant(&self, object_id: &ObjectId, rule: AclRule) -> Result<AclPolicy, AppError> {
        let principal = rule.principal.clone();
        let permission = rule.permission;
        let policy = self
            .repository
            .add_rule(object_id, rule)
            .await?
            .ok_or_else(|| not_found(object_id))?;

        tracing::info!(
            object_id = %object_id,
            principal = %principal,
            permission = %permission,
            "ACL rule granted"
        );
        Ok(policy)
    }

    /// Drop every rule naming `principal`. Revoking a principal with no
    /// rules is not an error.
    pub async fn revoke(
        &self,
        object_id: &ObjectId,
        principal: &PrincipalId,
    ) -> Result<AclPolicy, AppError> {
        let policy = self
            .repository
            .remove_rules(object_id, principal)
            .await?
            .ok_or_else(|| not_found(object_id))?;

        tracing::info!(object_id = %object_id, principal = %principal, "ACL rules revoked");
        Ok(policy)
    }

    /// Returns whether a policy existed.
    pub async fn remove_policy(&self, object_id: &ObjectId) -> Result<bool, AppError> {
        let removed = self.repository.remove(object_id).await?;
        if removed {
            tracing::info!(object_id = %object_id, "ACL policy removed");
        }
        Ok(removed)
    }
}

fn not_found(object_id: &ObjectId) -> AppError {
    AppError::NotFound(format!("No policy for object {}", object_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::acl::InMemoryAclPolicyRepository;
    use async_trait::async_trait;

    fn store() -> AclPolicyStore {
        AclPolicyStore::new(Arc::new(InMemoryAclPolicyRepository::new()))
    }

    fn id(raw: &str) -> ObjectId {
        ObjectId::parse(raw).unwrap()
    }

    fn user(raw: &str) -> PrincipalId {
        PrincipalId::from(raw)
    }

    struct BrokenRepository;

    #[async_trait]
    impl AclPolicyRepository for BrokenRepository {
        async fn get(&self, _: &ObjectId) -> Result<Option<AclPolicy>, AppError> {
            Err(AppError::Database("connection refused".to_string()))
        }
        async fn insert_if_absent(
            &self,
            _: &ObjectId,
            _: AclPolicy,
        ) -> Result<(AclPolicy, bool), AppError> {
            Err(AppError::Database("connection refused".to_string()))
        }
        async fn update_visibility(
            &self,
            _: &ObjectId,
            _: Visibility,
        ) -> Result<Option<AclPolicy>, AppError> {
            Err(AppError::Database("connection refused".to_string()))
        }
        async fn add_rule(&self, _: &ObjectId, _: AclRule) -> Result<Option<AclPolicy>, AppError> {
            Err(AppError::Database("connection refused".to_string()))
        }
        async fn remove_rules(
            &self,
            _: &ObjectId,
            _: &PrincipalId,
        ) -> Result<Option<AclPolicy>, AppError> {
            Err(AppError::Database("connection refused".to_string()))
        }
        async fn remove(&self, _: &ObjectId) -> Result<bool, AppError> {
            Err(AppError::Database("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_owner_has_both_permissions_after_attach() {
        let store = store();
        for (raw, visibility) in [("pub", Visibility::Public), ("priv", Visibility::Private)] {
            store.attach_policy(&id(raw), &user("owner"), visibility).await.unwrap();
            assert!(store.check_access(&id(raw), &user("owner"), Permission::Read).await);
            assert!(store.check_access(&id(raw), &user("owner"), Permission::Write).await);
        }
    }

    #[tokio::test]
    async fn test_decision_table_for_non_owner() {
        let store = store();
        store.attach_policy(&id("pub"), &user("owner"), Visibility::Public).await.unwrap();
        store.attach_policy(&id("priv"), &user("owner"), Visibility::Private).await.unwrap();

        assert!(store.check_access(&id("pub"), &user("other"), Permission::Read).await);
        assert!(!store.check_access(&id("pub"), &user("other"), Permission::Write).await);
        assert!(!store.check_access(&id("priv"), &user("other"), Permission::Read).await);
        assert!(!store.check_access(&id("priv"), &user("other"), Permission::Write).await);
    }

    #[tokio::test]
    async fn test_unregistered_object_denies() {
        let store = store();
        assert!(!store.check_access(&id("ghost"), &user("anyone"), Permission::Read).await);
    }

    #[tokio::test]
    async fn test_repository_failure_denies() {
        let store = AclPolicyStore::new(Arc::new(BrokenRepository));
        assert!(!store.check_access(&id("a"), &user("owner"), Permission::Read).await);
        assert!(store.attach_policy(&id("a"), &user("owner"), Visibility::Public).await.is_err());
    }

    #[tokio::test]
    async fn test_identical_attach_is_noop_and_different_conflicts() {
        let store = store();
        store.attach_policy(&id("a"), &user("owner"), Visibility::Private).await.unwrap();
        store.attach_policy(&id("a"), &user("owner"), Visibility::Private).await.unwrap();

        let err = store
            .attach_policy(&id("a"), &user("owner"), Visibility::Public)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = store
            .attach_policy(&id("a"), &user("intruder"), Visibility::Private)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let policy = store.get_policy(&id("a")).await.unwrap().unwrap();
        assert_eq!(policy.visibility, Visibility::Private);
        assert_eq!(policy.owner, user("owner"));
    }

    #[tokio::test]
    async fn test_update_policy_changes_decision() {
        let store = store();
        store.attach_policy(&id("a"), &user("owner"), Visibility::Private).await.unwrap();
        assert!(!store.check_access(&id("a"), &user("other"), Permission::Read).await);

        store.update_policy(&id("a"), Visibility::Public).await.unwrap();
        assert!(store.check_access(&id("a"), &user("other"), Permission::Read).await);

        let err = store.update_policy(&id("missing"), Visibility::Public).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_grant_and_revoke_rules() {
        let store = store();
        store.attach_policy(&id("a"), &user("owner"), Visibility::Private).await.unwrap();

        store
            .grant(
                &id("a"),
                AclRule {
                    principal: user("editor"),
                    permission: Permission::Write,
                },
            )
            .await
            .unwrap();
        assert!(store.check_access(&id("a"), &user("editor"), Permission::Write).await);
        assert!(store.check_access(&id("a"), &user("editor"), Permission::Read).await);
        assert!(!store.check_access(&id("a"), &user("other"), Permission::Read).await);

        store.revoke(&id("a"), &user("editor")).await.unwrap();
        assert!(!store.check_access(&id("a"), &user("editor"), Permission::Read).await);

        let err = store.revoke(&id("missing"), &user("editor")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_policy_revokes_everything() {
        let store = store();
        store.attach_policy(&id("a"), &user("owner"), Visibility::Public).await.unwrap();
        assert!(store.remove_policy(&id("a")).await.unwrap());
        assert!(!store.remove_policy(&id("a")).await.unwrap());
        assert!(!store.check_access(&id("a"), &user("owner"), Permission::Read).await);
    }

    #[tokio::test]
    async fn test_concurrent_conflicting_attach_one_wins() {
        let store = store();
        let a = {
            let store = store.clone();
            tokio::spawn(async move {
                store.attach_policy(&id("race"), &user("owner"), Visibility::Public).await
            })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move {
                store.attach_policy(&id("race"), &user("owner"), Visibility::Private).await
            })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(AppError::Conflict(_))))
                .count(),
            1
        );
    }
}
