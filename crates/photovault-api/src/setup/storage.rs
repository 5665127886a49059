//! Storage setup and initialization

use anyhow::{Context, Result};
use photovault_core::Config;
use photovault_storage::{PathResolver, UploadGrantIssuer};

/// Build the path resolver and the grant issuer from configuration.
///
/// A missing private root is only logged here; operations that need it
/// report a configuration error when they run.
pub async fn setup_storage(config: &Config) -> Result<UploadGrantIssuer> {
    tracing::info!("Initializing object storage...");
    let storage = config.storage();
    let resolver = PathResolver::from_config(storage);

    match resolver.private_root() {
        Ok(root) => {
            if !tokio::fs::try_exists(root).await.unwrap_or(false) {
                tracing::warn!(
                    private_root = %root.display(),
                    "Private object root does not exist yet, it will be created on first upload"
                );
            }
        }
        Err(_) => {
            tracing::warn!("PRIVATE_OBJECT_DIR not set, uploads and private reads will fail");
        }
    }

    for (index, root) in resolver.public_roots().iter().enumerate() {
        tracing::debug!(index, public_root = %root.display(), "Public search root");
    }

    let issuer = UploadGrantIssuer::from_config(resolver, storage)
        .context("Failed to configure upload grant issuer")?;

    tracing::info!(
        upload_target = %storage.upload_target,
        grant_ttl_secs = storage.upload_grant_ttl_secs,
        public_roots = storage.public_object_search_paths.len(),
        "Object storage initialized"
    );

    Ok(issuer)
}
