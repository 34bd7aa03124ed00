//! KycGuard CLI - operator commands over a data directory
//!
//! This crate provides the `kycguard` binary and command orchestration.

pub mod commands;
pub mod context;

pub use context::AppContext;
