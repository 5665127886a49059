//! Data models for the object storage core
//!
//! Organized by concern: addressing, access control and upload grants.

mod acl;
mod object;
mod upload;

pub use acl::*;
pub use object::*;
pub use upload::*;
