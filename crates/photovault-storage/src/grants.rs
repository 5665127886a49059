use chrono::{Duration, Utc};
use photovault_core::models::UploadGrant;
use photovault_core::{StorageConfig, UploadTargetMode, WriteTarget};

use crate::resolver::PathResolver;
use crate::signing::UploadUrlSigner;
use crate::traits::{StorageError, StorageResult};

#[derive(Clone, Debug)]
enum TargetStrategy {
    Local,
    Signed(UploadUrlSigner),
}

/// Hands out write capabilities for new objects.
///
/// Issuing never writes data and never touches ACL state. Every call mints a
/// fresh object id, so two grants never share a target.
#[derive(Clone, Debug)]
pub struct UploadGrantIssuer {
    resolver: PathResolver,
    strategy: TargetStrategy,
    ttl: Duration,
}

impl UploadGrantIssuer {
    /// Grants carry a filesystem path the caller writes to directly.
    pub fn local(resolver: PathResolver, ttl: Duration) -> Self {
        Self {
            resolver,
            strategy: TargetStrategy::Local,
            ttl,
        }
    }

    /// Grants carry a signed PUT URL served by the API.
    pub fn signed(resolver: PathResolver, signer: UploadUrlSigner, ttl: Duration) -> Self {
        Self {
            resolver,
            strategy: TargetStrategy::Signed(signer),
            ttl,
        }
    }

    pub fn from_config(resolver: PathResolver, config: &StorageConfig) -> StorageResult<Self> {
        let ttl = i64::try_from(config.upload_grant_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                StorageError::Configuration("UPLOAD_GRANT_TTL_SECS is out of range".to_string())
            })?;

        match config.upload_target {
            UploadTargetMode::Local => Ok(Self::local(resolver, ttl)),
            UploadTargetMode::Signed => {
                let secret = config.upload_signing_secret.as_deref().ok_or_else(|| {
                    StorageError::Configuration(
                        "UPLOAD_SIGNING_SECRET must be set when UPLOAD_TARGET=signed".to_string(),
                    )
                })?;
                let signer =
                    UploadUrlSigner::new(secret.as_bytes().to_vec(), config.public_base_url.clone());
                Ok(Self::signed(resolver, signer, ttl))
            }
        }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Signer for verifying incoming PUTs. `None` in local mode.
    pub fn signer(&self) -> Option<&UploadUrlSigner> {
        match &self.strategy {
            TargetStrategy::Signed(signer) => Some(signer),
            TargetStrategy::Local => None,
        }
    }

    pub async fn issue_upload_grant(&self) -> StorageResult<UploadGrant> {
        let (object_id, path) = self.resolver.resolve_upload_target().await?;
        let issued_at = Utc::now();
        let expires_at = issued_at.checked_add_signed(self.ttl).ok_or_else(|| {
            StorageError::Configuration("Upload grant TTL overflows the clock".to_string())
        })?;

        let target = match &self.strategy {
            TargetStrategy::Local => WriteTarget::LocalPath { path },
            TargetStrategy::Signed(signer) => WriteTarget::SignedUrl {
                url: signer.signed_url(&object_id, expires_at)?,
                expires_at,
            },
        };

        tracing::info!(
            object_id = %object_id,
            expires_at = %expires_at,
            signed = matches!(target, WriteTarget::SignedUrl { .. }),
            "Upload grant issued"
        );

        Ok(UploadGrant {
            object_id,
            target,
            issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_local_grant_points_under_uploads() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new(Some(dir.path().to_path_buf()), Vec::new());
        let issuer = UploadGrantIssuer::local(resolver, Duration::seconds(900));

        let grant = issuer.issue_upload_grant().await.unwrap();
        match &grant.target {
            WriteTarget::LocalPath { path } => {
                assert_eq!(path, &dir.path().join("uploads").join(grant.object_id.as_str()));
                assert!(path.parent().unwrap().is_dir());
                assert!(!path.exists());
            }
            other => panic!("expected local path, got {:?}", other),
        }
        assert_eq!(grant.expires_at - grant.issued_at, Duration::seconds(900));
    }

    #[tokio::test]
    async fn test_signed_grant_url_verifies() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new(Some(dir.path().to_path_buf()), Vec::new());
        let signer = UploadUrlSigner::new(b"0123456789abcdef0123456789abcdef".to_vec(), "https://cdn.test");
        let issuer = UploadGrantIssuer::signed(resolver, signer.clone(), Duration::seconds(60));

        let grant = issuer.issue_upload_grant().await.unwrap();
        let WriteTarget::SignedUrl { url, expires_at } = &grant.target else {
            panic!("expected signed url");
        };
        assert!(url.starts_with(&format!(
            "https://cdn.test/api/objects/upload/{}?expires=",
            grant.object_id
        )));
        let signature = url.rsplit("signature=").next().unwrap();
        signer
            .verify(&grant.object_id, expires_at.timestamp(), signature, Utc::now())
            .unwrap();
    }

    #[tokio::test]
    async fn test_grants_are_unique() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new(Some(dir.path().to_path_buf()), Vec::new());
        let issuer = UploadGrantIssuer::local(resolver, Duration::seconds(900));

        let mut ids = HashSet::new();
        for _ in 0..32 {
            let grant = issuer.issue_upload_grant().await.unwrap();
            assert!(ids.insert(grant.object_id));
        }
    }

    #[tokio::test]
    async fn test_oversized_ttl_is_configuration_error() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new(Some(dir.path().to_path_buf()), Vec::new());

        let config = StorageConfig {
            private_object_dir: Some(dir.path().to_path_buf()),
            public_object_search_paths: Vec::new(),
            upload_target: UploadTargetMode::Local,
            public_base_url: "http://localhost:3000".to_string(),
            upload_signing_secret: None,
            upload_grant_ttl_secs: 10_000_000_000_000,
            object_cache_ttl_secs: 3600,
            max_upload_size_bytes: 1024,
            enforce_upload_grants: true,
        };
        let issuer = UploadGrantIssuer::from_config(resolver, &config).unwrap();
        assert!(matches!(
            issuer.issue_upload_grant().await,
            Err(StorageError::Configuration(_))
        ));

        let config = StorageConfig {
            upload_grant_ttl_secs: u64::MAX,
            ..config
        };
        let resolver = PathResolver::new(Some(dir.path().to_path_buf()), Vec::new());
        assert!(matches!(
            UploadGrantIssuer::from_config(resolver, &config),
            Err(StorageError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_private_root_fails() {
        let issuer = UploadGrantIssuer::local(PathResolver::new(None, Vec::new()), Duration::seconds(900));
        assert!(matches!(
            issuer.issue_upload_grant().await,
            Err(StorageError::Configuration(_))
        ));
    }
}
