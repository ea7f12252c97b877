//! LexRank Common Library
//!
//! Shared code for the LexRank crates:
//! - Configuration management
//! - Error types and handling
//! - Database models and repository
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
