//! Command handlers for the codeindex CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod clear;
pub mod context;
pub mod init;
pub mod search;
pub mod status;
pub mod validate;

// Re-export command types for convenience
pub use clear::ClearCommand;
pub use init::InitCommand;
pub use search::SearchCommand;
pub use status::StatusCommand;
pub use validate::ValidateCommand;
