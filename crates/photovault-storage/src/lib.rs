//! PhotoVault Storage Library
//!
//! Filesystem side of the object store: mapping logical paths onto the private
//! and public roots, issuing upload grants, signing upload URLs, writing
//! uploaded bytes and streaming objects back out.
//!
//! # Layout
//!
//! - **Private objects**: `{PRIVATE_OBJECT_DIR}/uploads/{object_id}`, exposed as
//!   `/objects/uploads/{object_id}`
//! - **Public objects**: looked up under each `PUBLIC_OBJECT_SEARCH_PATHS` entry
//!   in order
//!
//! Keys must not contain `..` or a leading `/`. All validation happens in the
//! `resolver` module.

pub mod blob;
pub mod delivery;
pub mod grants;
pub mod resolver;
pub mod signing;
pub mod traits;

// Re-export commonly used types
pub use delivery::{channel_sink, deliver, ChannelSink, DeliveryBody, DeliveryOutcome};
pub use grants::UploadGrantIssuer;
pub use resolver::{PathResolver, StorageLocation, StorageRoot};
pub use signing::UploadUrlSigner;
pub use traits::{DeliveryHead, DeliverySink, SinkClosed, StorageError, StorageResult};
