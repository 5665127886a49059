//! Service initialization and application state setup

use crate::constants::GRANT_PURGE_INTERVAL_SECS;
use crate::services::ObjectStorageService;
use crate::state::AppState;
use anyhow::Result;
use photovault_core::Config;
use photovault_db::{AclPolicyStore, InMemoryUploadGrantLedger, UploadGrantLedger};
use std::sync::Arc;

use super::{database, storage};

/// Initialize storage, repositories and the object service, returning the application state
pub async fn initialize_services(config: &Config) -> Result<Arc<AppState>> {
    let issuer = storage::setup_storage(config).await?;
    let policies = AclPolicyStore::new(database::setup_policy_repository(config).await?);

    let grants: Arc<dyn UploadGrantLedger> = Arc::new(InMemoryUploadGrantLedger::new());
    start_grant_purge(grants.clone());

    let storage_config = config.storage();
    if !storage_config.enforce_upload_grants {
        tracing::warn!("ENFORCE_UPLOAD_GRANTS=false, any uploaded bytes can be registered");
    }

    let objects = ObjectStorageService::new(
        issuer,
        policies,
        grants,
        storage_config.enforce_upload_grants,
        storage_config.object_cache_ttl_secs,
    );

    Ok(Arc::new(AppState::new(config, objects)))
}

fn start_grant_purge(grants: Arc<dyn UploadGrantLedger>) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(GRANT_PURGE_INTERVAL_SECS));
        loop {
            interval.tick().await;
            if let Err(e) = grants.purge_expired(chrono::Utc::now()).await {
                tracing::error!(error = %e, "Failed to purge expired upload grants");
            }
        }
    });

    tracing::info!(
        interval_secs = GRANT_PURGE_INTERVAL_SECS,
        "Upload grant purge task started"
    );
}
