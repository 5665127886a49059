use async_trait::async_trait;
use photovault_core::{AclPolicy, AclRule, AppError, ObjectId, PrincipalId, Visibility};

/// Persistence seam for ACL policies, keyed by object id.
///
/// Every method is atomic with respect to a single object id. Methods that
/// mutate an existing policy return `Ok(None)` when there is none.
#[async_trait]
pub trait AclPolicyRepository: Send + Sync {
    async fn get(&self, object_id: &ObjectId) -> Result<Option<AclPolicy>, AppError>;

    /// Store `policy` unless one already exists for `object_id`.
    ///
    /// Returns the policy now on record and whether this call created it.
    async fn insert_if_absent(
        &self,
        object_id: &ObjectId,
        policy: AclPolicy,
    ) -> Result<(AclPolicy, bool), AppError>;

    async fn update_visibility(
        &self,
        object_id: &ObjectId,
        visibility: Visibility,
    ) -> Result<Option<AclPolicy>, AppError>;

    async fn add_rule(
        &self,
        object_id: &ObjectId,
        rule: AclRule,
    ) -> Result<Option<AclPolicy>, AppError>;

    async fn remove_rules(
        &self,
        object_id: &ObjectId,
        principal: &PrincipalId,
    ) -> Result<Option<AclPolicy>, AppError>;

    /// Returns whether a policy was removed.
    async fn remove(&self, object_id: &ObjectId) -> Result<bool, AppError>;
}
