//! PhotoVault Core Library
//!
//! This crate provides the domain models, error taxonomy and configuration
//! shared by the storage, repository and HTTP crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, StorageConfig, UploadTargetMode};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    AclPolicy, AclRule, LogicalPath, ObjectId, Permission, PrincipalId, Visibility, WriteTarget,
};
