use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::acl::AclPolicy;
use super::object::{ObjectId, Permission, Visibility};

/// Where a client may write the bytes of a freshly granted object.
///
/// Callers branch on the capability, not on the deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WriteTarget {
    /// Direct filesystem path, for deployments where the client shares the disk.
    LocalPath {
        #[schema(value_type = String)]
        path: PathBuf,
    },
    /// Signed, time-boxed PUT capability scoped to one object id.
    SignedUrl {
        url: String,
        expires_at: DateTime<Utc>,
    },
}

impl WriteTarget {
    /// String form handed to clients that only understand a single upload URL.
    pub fn as_upload_url(&self) -> String {
        match self {
            WriteTarget::LocalPath { path } => path.display().to_string(),
            WriteTarget::SignedUrl { url, .. } => url.clone(),
        }
    }
}

/// Result of issuing an upload grant.
#[derive(Debug, Clone)]
pub struct UploadGrant {
    pub object_id: ObjectId,
    pub target: WriteTarget,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Ledger entry for a grant that was handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedGrant {
    pub object_id: ObjectId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
}

impl IssuedGrant {
    pub fn from_grant(grant: &UploadGrant) -> Self {
        Self {
            object_id: grant.object_id.clone(),
            issued_at: grant.issued_at,
            expires_at: grant.expires_at,
            consumed: false,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Outcome of presenting a grant at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantRedemption {
    /// First redemption inside the validity window.
    Redeemed,
    /// Already redeemed earlier; registration falls back to policy idempotency.
    AlreadyRedeemed,
    /// Never issued (or forgotten after a restart).
    Unknown,
    /// Issued but never redeemed before expiry.
    Expired,
}

/// Response for `POST /api/objects/upload`
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadGrantResponse {
    /// Identifier to register once the upload finished
    pub object_id: String,
    /// Convenience copy of the write target as one string
    #[serde(rename = "uploadURL")]
    pub upload_url: String,
    pub target: WriteTarget,
    pub expires_at: DateTime<Utc>,
}

impl From<UploadGrant> for UploadGrantResponse {
    fn from(grant: UploadGrant) -> Self {
        Self {
            object_id: grant.object_id.to_string(),
            upload_url: grant.target.as_upload_url(),
            target: grant.target,
            expires_at: grant.expires_at,
        }
    }
}

/// Request for `POST /api/objects`
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterObjectRequest {
    #[validate(length(
        min = 1,
        max = 128,
        message = "Object id must be between 1 and 128 characters"
    ))]
    pub object_id: String,
    pub visibility: Visibility,
}

/// Response for `POST /api/objects`
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterObjectResponse {
    #[serde(rename = "objectPath")]
    pub object_path: String,
    pub policy: AclPolicy,
}

/// Request for `PATCH /api/objects/{object_id}/policy`
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateVisibilityRequest {
    pub visibility: Visibility,
}

/// Request for `POST /api/objects/{object_id}/grants`
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct GrantAccessRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Principal must be between 1 and 255 characters"
    ))]
    pub principal: String,
    pub permission: Permission,
}

/// Policy view returned by policy mutation endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct PolicyResponse {
    pub object_id: String,
    pub policy: AclPolicy,
}
