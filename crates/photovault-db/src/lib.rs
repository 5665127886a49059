//! PhotoVault DB Library
//!
//! Persistence for object ACL policies and the upload grant ledger.

pub mod db;

pub use db::*;
