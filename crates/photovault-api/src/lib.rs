//! PhotoVault API Library
//!
//! This crate provides the HTTP handlers, the object storage service facade,
//! and application setup.

// Module declarations
mod api_doc;
pub mod constants;
mod handlers;
pub mod services;
pub mod setup;
mod telemetry;

// Public modules
pub mod auth;
pub mod error;
pub mod state;

// Re-exports
pub use error::ErrorResponse;
pub use services::ObjectStorageService;
