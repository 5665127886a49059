//! Bearer authentication: JWT verification middleware and the requester
//! context handlers extract.

pub mod middleware;
pub mod models;

pub use middleware::{auth_middleware, AuthState};
pub use models::{JwtClaims, RequesterContext};
