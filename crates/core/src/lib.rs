//! Codeindex Core Library
//!
//! This crate provides the foundational utilities shared by the codeindex crates:
//! - Error handling (`AppError`, `StoreError`, `AppResult`)
//! - Logging infrastructure
//! - CLI-level configuration
//! - Proxy resolution for outbound HTTP

pub mod config;
pub mod error;
pub mod logging;
pub mod proxy;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult, StoreError};
