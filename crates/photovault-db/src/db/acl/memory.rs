use std::collections::HashMap;

use async_trait::async_trait;
use photovault_core::{AclPolicy, AclRule, AppError, ObjectId, PrincipalId, Visibility};
use tokio::sync::RwLock;

use super::repository::AclPolicyRepository;

/// Process-local policy table. Each operation holds the write lock for its
/// whole read-modify-write, which makes it atomic per key.
#[derive(Default)]
pub struct InMemoryAclPolicyRepository {
    policies: RwLock<HashMap<ObjectId, AclPolicy>>,
}

impl InMemoryAclPolicyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.policies.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.policies.read().await.is_empty()
    }
}

#[async_trait]
impl AclPolicyRepository for InMemoryAclPolicyRepository {
    async fn get(&self, object_id: &ObjectId) -> Result<Option<AclPolicy>, AppError> {
        Ok(self.policies.read().await.get(object_id).cloned())
    }

    async fn insert_if_absent(
        &self,
        object_id: &ObjectId,
        policy: AclPolicy,
    ) -> Result<(AclPolicy, bool), AppError> {
        let mut policies = self.policies.write().await;
        if let Some(existing) = policies.get(object_id) {
            return Ok((existing.clone(), false));
        }
        policies.insert(object_id.clone(), policy.clone());
        Ok((policy, true))
    }

    async fn update_visibility(
        &self,
        object_id: &ObjectId,
        visibility: Visibility,
    ) -> Result<Option<AclPolicy>, AppError> {
        let mut policies = self.policies.write().await;
        Ok(policies.get_mut(object_id).map(|policy| {
            policy.visibility = visibility;
            policy.clone()
        }))
    }

    async fn add_rule(
        &self,
        object_id: &ObjectId,
        rule: AclRule,
    ) -> Result<Option<AclPolicy>, AppError> {
        let mut policies = self.policies.write().await;
        Ok(policies.get_mut(object_id).map(|policy| {
            policy.add_rule(rule);
            policy.clone()
        }))
    }

    async fn remove_rules(
        &self,
        object_id: &ObjectId,
        principal: &PrincipalId,
    ) -> Result<Option<AclPolicy>, AppError> {
        let mut policies = self.policies.write().await;
        Ok(policies.get_mut(object_id).map(|policy| {
            policy.remove_rules_for(principal);
            policy.clone()
        }))
    }

    async fn remove(&self, object_id: &ObjectId) -> Result<bool, AppError> {
        Ok(self.policies.write().await.remove(object_id).is_some())
    }
}
