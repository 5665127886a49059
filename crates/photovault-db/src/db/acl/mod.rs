//! Object ACL policies: the repository seam, its implementations and the
//! store that owns the access decision.

mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod repository;
mod store;

pub use memory::InMemoryAclPolicyRepository;
#[cfg(feature = "postgres")]
pub use postgres::PostgresAclPolicyRepository;
pub use repository::AclPolicyRepository;
pub use store::AclPolicyStore;
