//! Repositories for the data access layer
//!
//! acl/ holds object access policies (repository seam, in-memory and
//! PostgreSQL implementations, and the policy store). upload_grant holds the
//! ledger registration redeems grants against.
//
// Object ACL policies
pub mod acl;
//
// Issued upload grants
pub mod upload_grant;
//
pub use acl::{AclPolicyRepository, AclPolicyStore, InMemoryAclPolicyRepository};
#[cfg(feature = "postgres")]
pub use acl::PostgresAclPolicyRepository;
pub use upload_grant::{InMemoryUploadGrantLedger, UploadGrantLedger};
