//! Signed upload URLs.
//!
//! Signature = hex(HMAC-SHA256(secret, "PUT\n{object_id}\n{expires_unix}")).
//! The URL carries `expires` and `signature` as query parameters, so the
//! capability is scoped to a single object id and a single method.

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use photovault_core::constants::UPLOAD_ROUTE_PREFIX;
use photovault_core::ObjectId;
use sha2::Sha256;

use crate::traits::{StorageError, StorageResult};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct UploadUrlSigner {
    secret: Vec<u8>,
    base_url: String,
}

impl std::fmt::Debug for UploadUrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadUrlSigner")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl UploadUrlSigner {
    pub fn new(secret: impl Into<Vec<u8>>, base_url: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn mac(&self, object_id: &ObjectId, expires_unix: i64) -> StorageResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|e| {
            StorageError::Configuration(format!("Invalid upload signing key: {}", e))
        })?;
        mac.update(format!("PUT\n{}\n{}", object_id, expires_unix).as_bytes());
        Ok(mac)
    }

    /// Hex signature for one object id and expiry.
    pub fn sign(&self, object_id: &ObjectId, expires_unix: i64) -> StorageResult<String> {
        let tag = self.mac(object_id, expires_unix)?.finalize().into_bytes();
        Ok(hex::encode(tag))
    }

    /// Full PUT URL for an object id, valid until `expires_at`.
    pub fn signed_url(&self, object_id: &ObjectId, expires_at: DateTime<Utc>) -> StorageResult<String> {
        let expires_unix = expires_at.timestamp();
        let signature = self.sign(object_id, expires_unix)?;
        Ok(format!(
            "{}{}/{}?expires={}&signature={}",
            self.base_url,
            UPLOAD_ROUTE_PREFIX,
            urlencoding::encode(object_id.as_str()),
            expires_unix,
            signature
        ))
    }

    /// Check a presented signature. The tag comparison is constant time.
    ///
    /// Returns the expiry instant on success.
    pub fn verify(
        &self,
        object_id: &ObjectId,
        expires_unix: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<DateTime<Utc>> {
        let tag = hex::decode(signature)
            .map_err(|_| StorageError::InvalidSignature("Malformed signature".to_string()))?;

        self.mac(object_id, expires_unix)?
            .verify_slice(&tag)
            .map_err(|_| StorageError::InvalidSignature("Signature mismatch".to_string()))?;

        let expires_at = Utc
            .timestamp_opt(expires_unix, 0)
            .single()
            .ok_or_else(|| StorageError::InvalidSignature("Invalid expiry".to_string()))?;

        if now >= expires_at {
            return Err(StorageError::Expired(format!(
                "Upload URL for {} expired at {}",
                object_id, expires_at
            )));
        }

        Ok(expires_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn signer() -> UploadUrlSigner {
        UploadUrlSigner::new(b"an-upload-signing-secret-of-32-bytes!".to_vec(), "http://localhost:3000/")
    }

    #[test]
    fn test_signed_url_shape() {
        let id = ObjectId::parse("abc123").unwrap();
        let expires = Utc.timestamp_opt(1_700_000_900, 0).unwrap();
        let url = signer().signed_url(&id, expires).unwrap();
        assert!(url.starts_with(
            "http://localhost:3000/api/objects/upload/abc123?expires=1700000900&signature="
        ));
        let signature = url.rsplit('=').next().unwrap();
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn test_verify_accepts_valid_signature() {
        let id = ObjectId::parse("abc123").unwrap();
        let now = Utc::now();
        let expires = (now + Duration::seconds(900)).timestamp();
        let signature = signer().sign(&id, expires).unwrap();
        let expires_at = signer().verify(&id, expires, &signature, now).unwrap();
        assert_eq!(expires_at.timestamp(), expires);
    }

    #[test]
    fn test_verify_rejects_other_object_or_expiry() {
        let id = ObjectId::parse("abc123").unwrap();
        let other = ObjectId::parse("abc124").unwrap();
        let now = Utc::now();
        let expires = (now + Duration::seconds(900)).timestamp();
        let signature = signer().sign(&id, expires).unwrap();

        assert!(matches!(
            signer().verify(&other, expires, &signature, now),
            Err(StorageError::InvalidSignature(_))
        ));
        assert!(matches!(
            signer().verify(&id, expires + 1, &signature, now),
            Err(StorageError::InvalidSignature(_))
        ));
        assert!(matches!(
            signer().verify(&id, expires, "zz-not-hex", now),
            Err(StorageError::InvalidSignature(_))
        ));

        let foreign = UploadUrlSigner::new(b"a-different-secret-also-32-bytes-long".to_vec(), "http://x");
        assert!(matches!(
            foreign.verify(&id, expires, &signature, now),
            Err(StorageError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_verify_rejects_expired() {
        let id = ObjectId::parse("abc123").unwrap();
        let now = Utc::now();
        let expires = (now - Duration::seconds(1)).timestamp();
        let signature = signer().sign(&id, expires).unwrap();
        assert!(matches!(
            signer().verify(&id, expires, &signature, now),
            Err(StorageError::Expired(_))
        ));
    }
}
