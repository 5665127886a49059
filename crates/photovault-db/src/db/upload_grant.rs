//! Ledger of issued upload grants.
//!
//! Registration redeems a grant exactly once. The ledger is process-local:
//! grants issued before a restart are forgotten and redeem as `Unknown`.
//! Entries live until their expiry, redeemed or not; after that the policy
//! store is the record of a registered object.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use photovault_core::models::{GrantRedemption, IssuedGrant};
use photovault_core::{AppError, ObjectId};
use tokio::sync::RwLock;

#[async_trait]
pub trait UploadGrantLedger: Send + Sync {
    async fn record(&self, grant: IssuedGrant) -> Result<(), AppError>;

    /// Look a grant up without consuming it.
    async fn get(&self, object_id: &ObjectId) -> Result<Option<IssuedGrant>, AppError>;

    /// Consume the grant for `object_id` if it is still valid at `now`.
    async fn redeem(
        &self,
        object_id: &ObjectId,
        now: DateTime<Utc>,
    ) -> Result<GrantRedemption, AppError>;

    /// Drop every grant that expired before `now`, redeemed or not.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AppError>;

    /// Drop the grant for `object_id`, if any.
    async fn forget(&self, object_id: &ObjectId) -> Result<(), AppError>;
}

#[derive(Default)]
pub struct InMemoryUploadGrantLedger {
    grants: RwLock<HashMap<ObjectId, IssuedGrant>>,
}

impl InMemoryUploadGrantLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UploadGrantLedger for InMemoryUploadGrantLedger {
    async fn record(&self, grant: IssuedGrant) -> Result<(), AppError> {
        let mut grants = self.grants.write().await;
        if grants.contains_key(&grant.object_id) {
            return Err(AppError::Conflict(format!(
                "Upload grant for {} already recorded",
                grant.object_id
            )));
        }
        grants.insert(grant.object_id.clone(), grant);
        Ok(())
    }

    async fn get(&self, object_id: &ObjectId) -> Result<Option<IssuedGrant>, AppError> {
        Ok(self.grants.read().await.get(object_id).cloned())
    }

    async fn redeem(
        &self,
        object_id: &ObjectId,
        now: DateTime<Utc>,
    ) -> Result<GrantRedemption, AppError> {
        let mut grants = self.grants.write().await;
        let Some(grant) = grants.get_mut(object_id) else {
            return Ok(GrantRedemption::Unknown);
        };

        if grant.consumed {
            return Ok(GrantRedemption::AlreadyRedeemed);
        }
        if grant.is_expired(now) {
            return Ok(GrantRedemption::Expired);
        }

        grant.consumed = true;
        Ok(GrantRedemption::Redeemed)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let mut grants = self.grants.write().await;
        let before = grants.len();
        grants.retain(|_, grant| !grant.is_expired(now));
        let purged = before - grants.len();
        if purged > 0 {
            tracing::debug!(purged, "Purged expired upload grants");
        }
        Ok(purged)
    }

    async fn forget(&self, object_id: &ObjectId) -> Result<(), AppError> {
        self.grants.write().await.remove(object_id);
        Ok(())
    }
}
