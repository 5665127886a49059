//! Application-wide constants.

/// Namespace marker every externally visible object path starts with.
pub const OBJECTS_PREFIX: &str = "/objects/";

/// Directory under the private root that receives direct uploads.
pub const UPLOADS_DIR: &str = "uploads";

/// Content type emitted at delivery time. The registered MIME type lives on the
/// media record, so delivery never sniffs.
pub const DELIVERY_CONTENT_TYPE: &str = "application/octet-stream";

/// Maximum accepted length of an object identifier.
pub const MAX_OBJECT_ID_LEN: usize = 128;

/// Route that accepts signed PUT uploads.
pub const UPLOAD_ROUTE_PREFIX: &str = "/api/objects/upload";
