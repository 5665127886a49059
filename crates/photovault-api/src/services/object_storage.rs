//! Object storage facade
//!
//! Composes the path resolver, the upload grant issuer, the grant ledger and
//! the ACL policy store into the operations the HTTP layer exposes. Nothing
//! here knows about axum; delivery goes through a `DeliverySink`.

use std::sync::Arc;

use chrono::Utc;
use photovault_core::models::{GrantRedemption, IssuedGrant, UploadGrant};
use photovault_core::{
    AclPolicy, AclRule, AppError, LogicalPath, ObjectId, Permission, PrincipalId, Visibility,
};
use photovault_db::{AclPolicyStore, UploadGrantLedger};
use photovault_storage::delivery::{deliver, DeliveryOutcome};
use photovault_storage::{blob, DeliverySink, PathResolver, StorageLocation, UploadGrantIssuer};
use tokio::io::AsyncRead;

#[derive(Clone)]
pub struct ObjectStorageService {
    resolver: PathResolver,
    issuer: UploadGrantIssuer,
    policies: AclPolicyStore,
    grants: Arc<dyn UploadGrantLedger>,
    enforce_upload_grants: bool,
    cache_ttl_secs: u64,
}

impl ObjectStorageService {
    pub fn new(
        issuer: UploadGrantIssuer,
        policies: AclPolicyStore,
        grants: Arc<dyn UploadGrantLedger>,
        enforce_upload_grants: bool,
        cache_ttl_secs: u64,
    ) -> Self {
        Self {
            resolver: issuer.resolver().clone(),
            issuer,
            policies,
            grants,
            enforce_upload_grants,
            cache_ttl_secs,
        }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn policies(&self) -> &AclPolicyStore {
        &self.policies
    }

    pub fn grants(&self) -> &Arc<dyn UploadGrantLedger> {
        &self.grants
    }

    /// Issue a write capability for a fresh object and remember it for
    /// registration.
    pub async fn create_upload_grant(&self) -> Result<UploadGrant, AppError> {
        let grant = self.issuer.issue_upload_grant().await?;
        self.grants.record(IssuedGrant::from_grant(&grant)).await?;
        Ok(grant)
    }

    /// Accept the body of a signed-URL upload.
    ///
    /// The signature must match the object id and expiry. Once the object has
    /// been registered its bytes are frozen, so a replayed URL cannot replace
    /// them.
    pub async fn receive_upload<R>(
        &self,
        object_id: &ObjectId,
        expires_unix: i64,
        signature: &str,
        body: R,
    ) -> Result<u64, AppError>
    where
        R: AsyncRead + Send + Unpin,
    {
        let signer = self.issuer.signer().ok_or_else(|| {
            AppError::Forbidden("Signed uploads are not enabled on this server".to_string())
        })?;
        signer.verify(object_id, expires_unix, signature, Utc::now())?;

        if self.policies.get_policy(object_id).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Object {} is already registered",
                object_id
            )));
        }

        if self.enforce_upload_grants {
            match self.grants.get(object_id).await? {
                None => {
                    return Err(AppError::NotFound(format!(
                        "No upload grant for object {}",
                        object_id
                    )))
                }
                Some(grant) if grant.consumed => {
                    return Err(AppError::Conflict(format!(
                        "Object {} is already registered",
                        object_id
                    )))
                }
                Some(_) => {}
            }
        }

        let location = self.resolver.location_for(object_id)?;
        let written = blob::write_blob(&location.physical, body).await?;
        tracing::info!(object_id = %object_id, size_bytes = written, "Signed upload received");
        Ok(written)
    }

    /// Register an uploaded object under `owner` with the given visibility.
    ///
    /// The grant must be known and unexpired on first registration. A repeat
    /// registration falls through to the policy store, which treats identical
    /// terms as a no-op and different terms as a conflict. That holds after the
    /// redeemed grant has been purged too.
    pub async fn register_object(
        &self,
        object_id: &ObjectId,
        owner: &PrincipalId,
        visibility: Visibility,
    ) -> Result<(LogicalPath, AclPolicy), AppError> {
        let location = self.resolver.location_for(object_id)?;
        if !blob::blob_exists(&location.physical).await {
            return Err(AppError::NotFound(format!(
                "No uploaded bytes for object {}",
                object_id
            )));
        }

        if self.enforce_upload_grants {
            match self.grants.redeem(object_id, Utc::now()).await? {
                GrantRedemption::Redeemed | GrantRedemption::AlreadyRedeemed => {}
                GrantRedemption::Unknown
                    if self.policies.get_policy(object_id).await?.is_some() => {}
                GrantRedemption::Unknown => {
                    return Err(AppError::NotFound(format!(
                        "No upload grant for object {}",
                        object_id
                    )))
                }
                GrantRedemption::Expired => {
                    return Err(AppError::Forbidden(format!(
                        "Upload grant for object {} has expired",
                        object_id
                    )))
                }
            }
        }

        let policy = self
            .policies
            .attach_policy(object_id, owner, visibility)
            .await?;
        let logical = self.resolver.to_logical_path(&location.physical)?;

        tracing::info!(
            object_id = %object_id,
            owner = %owner,
            object_path = %logical,
            "Object registered"
        );
        Ok((logical, policy))
    }

    /// Resolve a logical path and check `permission` for `requester`.
    ///
    /// A missing object is `NotFound` before any access check runs.
    pub async fn authorize(
        &self,
        logical: &LogicalPath,
        requester: &PrincipalId,
        permission: Permission,
    ) -> Result<(ObjectId, StorageLocation), AppError> {
        let location = self.resolver.resolve_for_read(logical).await?;
        let object_id = logical.object_id()?;

        if !self
            .policies
            .check_access(&object_id, requester, permission)
            .await
        {
            tracing::info!(
                object_id = %object_id,
                requester = %requester,
                permission = %permission,
                "Object access denied"
            );
            return Err(AppError::Forbidden(format!(
                "No {} access to this object",
                permission
            )));
        }

        Ok((object_id, location))
    }

    pub async fn authorize_and_stream<S>(
        &self,
        logical: &LogicalPath,
        requester: &PrincipalId,
        permission: Permission,
        sink: &mut S,
    ) -> Result<DeliveryOutcome, AppError>
    where
        S: DeliverySink + ?Sized,
    {
        let (object_id, location) = self.authorize(logical, requester, permission).await?;
        let outcome = deliver(&location, sink, self.cache_ttl_secs).await?;
        tracing::debug!(object_id = %object_id, outcome = ?outcome, "Object delivered");
        Ok(outcome)
    }

    /// Stream a file from the public search roots. No access check.
    pub async fn stream_public<S>(
        &self,
        relative: &str,
        sink: &mut S,
    ) -> Result<DeliveryOutcome, AppError>
    where
        S: DeliverySink + ?Sized,
    {
        let location = self
            .resolver
            .resolve_public(relative)
            .await
            .ok_or_else(|| AppError::NotFound("Object not found".to_string()))?;
        Ok(deliver(&location, sink, self.cache_ttl_secs).await?)
    }

    pub async fn update_visibility(
        &self,
        object_id: &ObjectId,
        requester: &PrincipalId,
        visibility: Visibility,
    ) -> Result<AclPolicy, AppError> {
        self.require_owner(object_id, requester).await?;
        self.policies.update_policy(object_id, visibility).await
    }

    pub async fn grant_access(
        &self,
        object_id: &ObjectId,
        requester: &PrincipalId,
        rule: AclRule,
    ) -> Result<AclPolicy, AppError> {
        self.require_owner(object_id, requester).await?;
        self.policies.grant(object_id, rule).await
    }

    pub async fn revoke_access(
        &self,
        object_id: &ObjectId,
        requester: &PrincipalId,
        principal: &PrincipalId,
    ) -> Result<AclPolicy, AppError> {
        self.require_owner(object_id, requester).await?;
        self.policies.revoke(object_id, principal).await
    }

    /// Remove an object: its policy first, then its bytes.
    pub async fn unregister_object(
        &self,
        logical: &LogicalPath,
        requester: &PrincipalId,
    ) -> Result<(), AppError> {
        let (object_id, location) = self.authorize(logical, requester, Permission::Write).await?;

        self.policies.remove_policy(&object_id).await?;
        self.grants.forget(&object_id).await?;
        blob::delete_blob(&location.physical).await?;

        tracing::info!(object_id = %object_id, requester = %requester, "Object unregistered");
        Ok(())
    }

    async fn require_owner(
        &self,
        object_id: &ObjectId,
        requester: &PrincipalId,
    ) -> Result<AclPolicy, AppError> {
        let policy = self
            .policies
            .get_policy(object_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No policy for object {}", object_id)))?;

        if &policy.owner != requester {
            return Err(AppError::Forbidden(
                "Only the owner can change this object's policy".to_string(),
            ));
        }
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use photovault_db::{InMemoryAclPolicyRepository, InMemoryUploadGrantLedger};
    use photovault_storage::{channel_sink, UploadUrlSigner};
    use tempfile::{tempdir, TempDir};

    const SIGNING_SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn service(dir: &TempDir, signed: bool) -> ObjectStorageService {
        service_with(dir, signed, true)
    }

    fn service_with(dir: &TempDir, signed: bool, enforce: bool) -> ObjectStorageService {
        let resolver = PathResolver::new(Some(dir.path().to_path_buf()), Vec::new());
        let issuer = if signed {
            UploadGrantIssuer::signed(
                resolver,
                UploadUrlSigner::new(SIGNING_SECRET.to_vec(), "http://localhost:3000"),
                Duration::seconds(900),
            )
        } else {
            UploadGrantIssuer::local(resolver, Duration::seconds(900))
        };
        ObjectStorageService::new(
            issuer,
            AclPolicyStore::new(Arc::new(InMemoryAclPolicyRepository::new())),
            Arc::new(InMemoryUploadGrantLedger::new()),
            enforce,
            3600,
        )
    }

    fn user(raw: &str) -> PrincipalId {
        PrincipalId::from(raw)
    }

    async fn upload(service: &ObjectStorageService, bytes: &[u8]) -> ObjectId {
        let grant = service.create_upload_grant().await.unwrap();
        let location = service.resolver.location_for(&grant.object_id).unwrap();
        tokio::fs::write(&location.physical, bytes).await.unwrap();
        grant.object_id
    }

    #[tokio::test]
    async fn test_register_then_stream_to_owner_only() {
        let dir = tempdir().unwrap();
        let service = service(&dir, false);
        let id = upload(&service, &[9u8; 42]).await;

        let (logical, _) = service
            .register_object(&id, &user("user1"), Visibility::Private)
            .await
            .unwrap();
        assert_eq!(logical.as_str(), format!("/objects/uploads/{}", id));

        let (mut sink, head_rx, body) = channel_sink(8);
        let denied = service
            .authorize_and_stream(&logical, &user("user2"), Permission::Read, &mut sink)
            .await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        let reader = service.clone();
        let task_logical = logical.clone();
        let task = tokio::spawn(async move {
            reader
                .authorize_and_stream(&task_logical, &user("user1"), Permission::Read, &mut sink)
                .await
        });
        let head = head_rx.await.unwrap();
        assert_eq!(head.content_length, 42);
        drop(body);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_register_requires_bytes_and_grant() {
        let dir = tempdir().unwrap();
        let service = service(&dir, false);

        let grant = service.create_upload_grant().await.unwrap();
        let err = service
            .register_object(&grant.object_id, &user("user1"), Visibility::Public)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // Bytes without a grant
        let stray = ObjectId::parse("stray").unwrap();
        let location = service.resolver.location_for(&stray).unwrap();
        tokio::fs::write(&location.physical, b"x").await.unwrap();
        let err = service
            .register_object(&stray, &user("user1"), Visibility::Public)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_register_after_expiry_is_forbidden() {
        let dir = tempdir().unwrap();
        let service = service(&dir, false);
        let id = ObjectId::parse("late").unwrap();
        let now = Utc::now();
        service
            .grants
            .record(IssuedGrant {
                object_id: id.clone(),
                issued_at: now - Duration::seconds(1000),
                expires_at: now - Duration::seconds(100),
                consumed: false,
            })
            .await
            .unwrap();
        let location = service.resolver.location_for(&id).unwrap();
        tokio::fs::create_dir_all(location.physical.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&location.physical, b"x").await.unwrap();

        let err = service
            .register_object(&id, &user("user1"), Visibility::Public)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_repeat_registration_is_idempotent_or_conflicts() {
        let dir = tempdir().unwrap();
        let service = service(&dir, false);
        let id = upload(&service, b"bytes").await;

        service
            .register_object(&id, &user("user1"), Visibility::Private)
            .await
            .unwrap();
        service
            .register_object(&id, &user("user1"), Visibility::Private)
            .await
            .unwrap();
        let err = service
            .register_object(&id, &user("user2"), Visibility::Private)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found_before_forbidden() {
        let dir = tempdir().unwrap();
        let service = service(&dir, false);
        let logical = LogicalPath::parse("/objects/uploads/nothing-here").unwrap();
        let err = service
            .authorize(&logical, &user("anyone"), Permission::Read)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unregistered_bytes_are_forbidden() {
        let dir = tempdir().unwrap();
        let service = service(&dir, false);
        let id = upload(&service, b"bytes").await;
        let logical = LogicalPath::from_relative(&format!("uploads/{}", id));
        let err = service
            .authorize(&logical, &user("user1"), Permission::Read)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_policy_mutations_are_owner_only() {
        let dir = tempdir().unwrap();
        let service = service(&dir, false);
        let id = upload(&service, b"bytes").await;
        service
            .register_object(&id, &user("owner"), Visibility::Private)
            .await
            .unwrap();

        let err = service
            .update_visibility(&id, &user("other"), Visibility::Public)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let rule = AclRule {
            principal: user("friend"),
            permission: Permission::Read,
        };
        assert!(matches!(
            service.grant_access(&id, &user("other"), rule.clone()).await,
            Err(AppError::Forbidden(_))
        ));
        service.grant_access(&id, &user("owner"), rule).await.unwrap();
        assert!(
            service
                .policies()
                .check_access(&id, &user("friend"), Permission::Read)
                .await
        );

        service
            .revoke_access(&id, &user("owner"), &user("friend"))
            .await
            .unwrap();
        assert!(
            !service
                .policies()
                .check_access(&id, &user("friend"), Permission::Read)
                .await
        );

        let policy = service
            .update_visibility(&id, &user("owner"), Visibility::Public)
            .await
            .unwrap();
        assert_eq!(policy.visibility, Visibility::Public);
    }

    #[tokio::test]
    async fn test_unregister_removes_policy_and_bytes() {
        let dir = tempdir().unwrap();
        let service = service(&dir, false);
        let id = upload(&service, b"bytes").await;
        let (logical, _) = service
            .register_object(&id, &user("owner"), Visibility::Public)
            .await
            .unwrap();

        let err = service
            .unregister_object(&logical, &user("reader"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        service.unregister_object(&logical, &user("owner")).await.unwrap();
        assert!(service.policies().get_policy(&id).await.unwrap().is_none());
        let err = service
            .authorize(&logical, &user("owner"), Permission::Read)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_receive_upload_checks_signature_and_registration() {
        let dir = tempdir().unwrap();
        let service = service(&dir, true);
        let grant = service.create_upload_grant().await.unwrap();
        let id = grant.object_id.clone();
        let expires = grant.expires_at.timestamp();
        let signer = UploadUrlSigner::new(SIGNING_SECRET.to_vec(), "http://localhost:3000");
        let signature = signer.sign(&id, expires).unwrap();

        let err = service
            .receive_upload(&id, expires, "deadbeef", &b"bytes"[..])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let written = service
            .receive_upload(&id, expires, &signature, &b"bytes"[..])
            .await
            .unwrap();
        assert_eq!(written, 5);

        service
            .register_object(&id, &user("owner"), Visibility::Private)
            .await
            .unwrap();
        let err = service
            .receive_upload(&id, expires, &signature, &b"evil"[..])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_receive_upload_disabled_in_local_mode() {
        let dir = tempdir().unwrap();
        let service = service(&dir, false);
        let id = ObjectId::parse("abc123").unwrap();
        let err = service
            .receive_upload(&id, Utc::now().timestamp() + 60, "00", &b"x"[..])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_registered_bytes_are_frozen_without_grant_enforcement() {
        let dir = tempdir().unwrap();
        let service = service_with(&dir, true, false);
        let grant = service.create_upload_grant().await.unwrap();
        let id = grant.object_id.clone();
        let expires = grant.expires_at.timestamp();
        let signer = UploadUrlSigner::new(SIGNING_SECRET.to_vec(), "http://localhost:3000");
        let signature = signer.sign(&id, expires).unwrap();

        service
            .receive_upload(&id, expires, &signature, &b"original"[..])
            .await
            .unwrap();
        service
            .register_object(&id, &user("owner"), Visibility::Private)
            .await
            .unwrap();

        let err = service
            .receive_upload(&id, expires, &signature, &b"EVIL"[..])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let location = service.resolver.location_for(&id).unwrap();
        assert_eq!(tokio::fs::read(&location.physical).await.unwrap(), b"original");
    }

    #[tokio::test]
    async fn test_repeat_registration_survives_grant_purge() {
        let dir = tempdir().unwrap();
        let service = service(&dir, false);
        let id = upload(&service, b"bytes").await;
        service
            .register_object(&id, &user("owner"), Visibility::Public)
            .await
            .unwrap();

        let purged = service
            .grants()
            .purge_expired(Utc::now() + Duration::days(1))
            .await
            .unwrap();
        assert_eq!(purged, 1);

        service
            .register_object(&id, &user("owner"), Visibility::Public)
            .await
            .unwrap();
        let err = service
            .register_object(&id, &user("other"), Visibility::Public)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_unregister_forgets_the_grant() {
        let dir = tempdir().unwrap();
        let service = service(&dir, false);
        let id = upload(&service, b"bytes").await;
        let (logical, _) = service
            .register_object(&id, &user("owner"), Visibility::Private)
            .await
            .unwrap();
        assert!(service.grants().get(&id).await.unwrap().is_some());

        service.unregister_object(&logical, &user("owner")).await.unwrap();
        assert!(service.grants().get(&id).await.unwrap().is_none());
    }
}
