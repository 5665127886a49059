//! API constants
//!
//! Route prefixes shared by the router, the handlers' OpenAPI annotations and
//! the signed upload URLs built in the storage crate.

/// API base path prefix
pub const API_BASE: &str = "/api";

/// Prefix of the authorized delivery routes. Logical paths start with it.
pub const OBJECTS_ROUTE: &str = "/objects";

/// Prefix of the unauthenticated public delivery route.
pub const PUBLIC_OBJECTS_ROUTE: &str = "/public-objects";

/// Chunks buffered between the file reader and the response body.
pub const DELIVERY_CHANNEL_CAPACITY: usize = 4;

/// Interval between sweeps of expired, unredeemed upload grants.
pub const GRANT_PURGE_INTERVAL_SECS: u64 = 300;

pub use photovault_core::constants::UPLOAD_ROUTE_PREFIX;
